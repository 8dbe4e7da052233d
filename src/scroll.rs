/// Virtual page height in viewports
pub const PAGE_VIEWPORTS: f64 = 3.0;

/// Anything that can report how far the page is scrolled, in [0, 1].
///
/// Called once per frame; eased sources advance their easing here.
pub trait ScrollSource {
    fn progress(&mut self) -> f64;

    /// Moves the scroll position by `delta` pixels (wheel, arrow keys)
    fn scroll_by(&mut self, delta: f64);

    /// Adapts to a new viewport height
    fn resize(&mut self, viewport_height: f64);
}

/// Document scroll metrics
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub content_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// A page [`PAGE_VIEWPORTS`] viewports tall, scrolled to the top
    pub fn for_viewport(viewport_height: f64) -> Self {
        ScrollMetrics {
            offset: 0.0,
            content_height: viewport_height * PAGE_VIEWPORTS,
            viewport_height,
        }
    }

    fn max_offset(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// `offset / (content - viewport)`, clamped. A page that cannot scroll
    /// reports 0.
    pub fn progress(&self) -> f64 {
        let range = self.max_offset();
        if range <= 0.0 {
            return 0.0;
        }
        (self.offset / range).clamp(0.0, 1.0)
    }
}

impl ScrollSource for ScrollMetrics {
    fn progress(&mut self) -> f64 {
        ScrollMetrics::progress(self)
    }

    fn scroll_by(&mut self, delta: f64) {
        self.offset = (self.offset + delta).clamp(0.0, self.max_offset());
    }

    fn resize(&mut self, viewport_height: f64) {
        let progress = ScrollMetrics::progress(self);
        *self = ScrollMetrics::for_viewport(viewport_height);
        self.offset = progress * self.max_offset();
    }
}

/// Wheel-driven scroll that eases toward its target instead of jumping
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticScroll {
    current: f64,
    target: f64,
    /// Pixels of wheel travel for the full [0, 1] range
    travel: f64,
    easing: f64,
}

impl SyntheticScroll {
    pub const EASING: f64 = 0.08;

    pub fn new(viewport_height: f64) -> Self {
        SyntheticScroll {
            current: 0.0,
            target: 0.0,
            travel: (viewport_height * (PAGE_VIEWPORTS - 1.0)).max(1.0),
            easing: Self::EASING,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}

impl ScrollSource for SyntheticScroll {
    fn progress(&mut self) -> f64 {
        self.current += (self.target - self.current) * self.easing;
        if (self.target - self.current).abs() < 1e-4 {
            self.current = self.target;
        }
        self.current.clamp(0.0, 1.0)
    }

    fn scroll_by(&mut self, delta: f64) {
        self.target = (self.target + delta / self.travel).clamp(0.0, 1.0);
    }

    fn resize(&mut self, viewport_height: f64) {
        self.travel = (viewport_height * (PAGE_VIEWPORTS - 1.0)).max(1.0);
    }
}
