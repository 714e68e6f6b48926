//! Color themes

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub bg_color: Color,
    pub text_color: Color,
    pub dim_color: Color,
    pub border_color: Color,
    pub title_color: Color,
    pub accent_color: Color,
    pub selection_bg: Color,
    pub error_color: Color,
    pub warning_color: Color,
}

impl Theme {
    /// Look up a built-in theme, falling back to the default
    pub fn by_name(name: &str) -> Self {
        match name {
            "terminal" => terminal(),
            _ => dashboard(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        dashboard()
    }
}

fn dashboard() -> Theme {
    Theme {
        name: "dashboard",
        bg_color: Color::Rgb(24, 26, 33),
        text_color: Color::Rgb(220, 223, 228),
        dim_color: Color::Rgb(110, 118, 129),
        border_color: Color::Rgb(62, 68, 81),
        title_color: Color::Rgb(97, 175, 239),
        accent_color: Color::Rgb(152, 195, 121),
        selection_bg: Color::Rgb(44, 49, 60),
        error_color: Color::Rgb(224, 108, 117),
        warning_color: Color::Rgb(229, 192, 123),
    }
}

/// Uses the terminal's own palette
fn terminal() -> Theme {
    Theme {
        name: "terminal",
        bg_color: Color::Reset,
        text_color: Color::Reset,
        dim_color: Color::DarkGray,
        border_color: Color::Gray,
        title_color: Color::Cyan,
        accent_color: Color::Green,
        selection_bg: Color::DarkGray,
        error_color: Color::Red,
        warning_color: Color::Yellow,
    }
}
