/// Horizontal scroll position of the chart container. Whenever the sensor
/// series changes it is pinned to the right edge so the newest point is in
/// view; otherwise it stays where it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollState {
    viewport_width: u32,
    content_width: u32,
    scroll_left: u32,
    seen_revision: Option<u64>,
}

impl ScrollState {
    pub fn new(viewport_width: u32) -> Self {
        ScrollState {
            viewport_width,
            content_width: 0,
            scroll_left: 0,
            seen_revision: None,
        }
    }

    /// Returns whether the position was forced to the end.
    pub fn observe(&mut self, sensor_revision: u64, content_width: u32) -> bool {
        self.content_width = content_width;
        if self.seen_revision == Some(sensor_revision) {
            self.scroll_left = self.scroll_left.min(self.max_scroll());
            return false;
        }
        self.seen_revision = Some(sensor_revision);
        self.scroll_left = self.max_scroll();
        true
    }

    pub fn max_scroll(&self) -> u32 {
        self.content_width.saturating_sub(self.viewport_width)
    }

    pub fn scroll_left(&self) -> u32 {
        self.scroll_left
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Width actually visible, never more than the content itself.
    pub fn visible_width(&self) -> u32 {
        self.viewport_width.min(self.content_width)
    }
}
