//! Two-state reveal flag driven by a scroll trigger
//!
//! Entering the trigger turns it on, scrolling back above it turns it off.

/// Footer reveal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevealToggle {
    active: bool,
}

impl RevealToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the new state only if it changed
    pub fn enter(&mut self) -> Option<bool> {
        self.set(true)
    }

    /// Returns the new state only if it changed
    pub fn leave_back(&mut self) -> Option<bool> {
        self.set(false)
    }

    fn set(&mut self, active: bool) -> Option<bool> {
        if self.active == active {
            return None;
        }
        self.active = active;
        Some(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_reports_changes_only() {
        let mut r = RevealToggle::new();
        assert_eq!(r.leave_back(), None);
        assert_eq!(r.enter(), Some(true));
        assert_eq!(r.enter(), None);
        assert!(r.is_active());
        assert_eq!(r.leave_back(), Some(false));
    }
}
