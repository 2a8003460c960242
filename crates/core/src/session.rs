use serde::{Deserialize, Serialize};

/// State of the before/after comparison slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSession {
    /// Horizontal split boundary, percent. Always within [0, 100].
    split_ratio: f64,
    pub sync_enabled: bool,
    pub active: bool,
}

impl Default for ComparisonSession {
    fn default() -> Self {
        Self {
            split_ratio: 50.0,
            sync_enabled: true,
            active: false,
        }
    }
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn split_ratio(&self) -> f64 {
        self.split_ratio
    }

    /// Set the split boundary. Drags past the container saturate.
    pub fn set_split(&mut self, ratio: f64) {
        self.split_ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 100.0)
        } else {
            self.split_ratio
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_saturates_at_bounds() {
        let mut session = ComparisonSession::new();
        session.set_split(130.0);
        assert_eq!(session.split_ratio(), 100.0);
        session.set_split(-12.0);
        assert_eq!(session.split_ratio(), 0.0);
        session.set_split(62.5);
        assert_eq!(session.split_ratio(), 62.5);
    }

    #[test]
    fn non_finite_drags_are_ignored() {
        let mut session = ComparisonSession::new();
        session.set_split(f64::NAN);
        assert_eq!(session.split_ratio(), 50.0);
    }
}
