//! List selection and viewport
//!
//! Tracks the selected row and the first visible row for the list pane. The
//! visible range feeds the load-more visibility check after every draw.

/// Selection and scroll offset for a list of rows
#[derive(Debug, Clone)]
pub struct ListScroll {
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset (first visible row)
    pub offset: usize,
    /// Number of rows in the list
    pub total: usize,
    /// Visible height (rows that fit on screen)
    pub visible_height: usize,
}

impl Default for ListScroll {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ListScroll {
    pub fn new(total: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            total,
            visible_height: 10,
        }
    }

    /// Update the row count, keeping the selection in range
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        if self.selected >= total && total > 0 {
            self.selected = total - 1;
        }
        if total == 0 {
            self.selected = 0;
            self.offset = 0;
        }
        self.ensure_visible();
    }

    /// Set the visible height (call after layout)
    pub fn set_visible_height(&mut self, height: usize) {
        self.visible_height = height.max(1);
        self.ensure_visible();
    }

    pub fn next(&mut self) {
        self.move_by(1);
    }

    pub fn prev(&mut self) {
        self.move_by(-1);
    }

    pub fn page_down(&mut self) {
        self.move_by(self.visible_height as isize);
    }

    pub fn page_up(&mut self) {
        self.move_by(-(self.visible_height as isize));
    }

    /// Move the selection, clamped to the list
    pub fn move_by(&mut self, delta: isize) {
        if self.total == 0 {
            return;
        }
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, self.total as isize - 1) as usize;
        self.ensure_visible();
    }

    /// Back to the first row
    pub fn reset(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    fn ensure_visible(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.visible_height {
            self.offset = self.selected - self.visible_height + 1;
        }
        let max_offset = self.total.saturating_sub(self.visible_height);
        self.offset = self.offset.min(max_offset);
    }

    /// Range of visible indices
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let end = (self.offset + self.visible_height).min(self.total);
        self.offset..end
    }

    pub fn is_selected(&self, index: usize) -> bool {
        index == self.selected
    }

    /// Rows below the visible area
    pub fn items_below(&self) -> usize {
        self.total.saturating_sub(self.offset + self.visible_height)
    }
}
