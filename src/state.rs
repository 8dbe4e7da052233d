use std::time::{Duration, Instant};

/// Pointer events closer together than this count as one interaction
pub const TOGGLE_DEBOUNCE: Duration = Duration::from_millis(350);

/// Fraction of the remaining distance covered by the expansion each frame
pub const EXPANSION_EASING: f64 = 0.1;

/// Open/closed state of the menu artifact
#[derive(Clone, Debug, PartialEq)]
pub struct MenuState {
    /// Logical state
    pub is_open: bool,
    /// Eased openness in [0, 1]
    pub expansion: f64,
    /// 1.0 while open, 0.0 while closed
    pub target_expansion: f64,
    /// Rotation clock, advanced once per rendered frame
    pub time: f64,
    /// Scroll progress seen by the last render
    pub scroll: f64,
    /// When the last accepted toggle happened
    pub last_toggle: Option<Instant>,
}

impl Default for MenuState {
    fn default() -> Self {
        MenuState {
            is_open: false,
            expansion: 0.0,
            target_expansion: 0.0,
            time: 0.0,
            scroll: 0.0,
            last_toggle: None,
        }
    }
}

impl MenuState {
    /// Flips open/closed unless another toggle happened within the debounce window.
    /// Returns whether the state changed.
    pub fn toggle(&mut self, at: Instant) -> bool {
        if let Some(last) = self.last_toggle {
            if at.saturating_duration_since(last) < TOGGLE_DEBOUNCE {
                return false;
            }
        }
        self.last_toggle = Some(at);
        self.set_open(!self.is_open);
        true
    }

    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
        self.target_expansion = if open { 1.0 } else { 0.0 };
    }

    /// Low-pass step of the expansion toward its target
    pub fn ease(&mut self) {
        self.expansion += (self.target_expansion - self.expansion) * EXPANSION_EASING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_sets_target() {
        let mut state = MenuState::default();
        let t0 = Instant::now();
        assert!(state.toggle(t0));
        assert!(state.is_open);
        assert_eq!(state.target_expansion, 1.0);
        assert!(state.toggle(t0 + Duration::from_millis(400)));
        assert!(!state.is_open);
        assert_eq!(state.target_expansion, 0.0);
    }

    #[test]
    fn test_toggle_debounce() {
        let mut state = MenuState::default();
        let t0 = Instant::now();
        assert!(state.toggle(t0));
        assert!(!state.toggle(t0 + Duration::from_millis(120)));
        assert!(!state.toggle(t0 + Duration::from_millis(349)));
        assert!(state.is_open);
        assert!(state.toggle(t0 + TOGGLE_DEBOUNCE));
        assert!(!state.is_open);
    }

    #[test]
    fn test_ease_converges() {
        let mut state = MenuState::default();
        state.set_open(true);
        state.ease();
        assert!((state.expansion - 0.1).abs() < 1e-12);
        for _ in 0..200 {
            state.ease();
        }
        assert!((state.expansion - 1.0).abs() < 1e-6);
    }
}
