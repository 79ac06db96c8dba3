//! Attempt counting for one question

/// Bounded count of judged answers for the current question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTracker {
    used: u32,
    max: u32,
}

impl AttemptTracker {
    /// Create a tracker allowing `max` attempts (at least one)
    pub fn new(max: u32) -> Self {
        Self {
            used: 0,
            max: max.max(1),
        }
    }

    /// Count one more attempt and return the total used
    ///
    /// Never counts past the maximum.
    pub fn increment(&mut self) -> u32 {
        if self.used < self.max {
            self.used += 1;
        }
        self.used
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max - self.used
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_up_to_max() {
        let mut tracker = AttemptTracker::new(3);
        assert_eq!(tracker.remaining(), 3);
        assert_eq!(tracker.increment(), 1);
        assert_eq!(tracker.increment(), 2);
        assert!(!tracker.exhausted());
        assert_eq!(tracker.remaining(), 1);
        assert_eq!(tracker.increment(), 3);
        assert!(tracker.exhausted());
        assert_eq!(tracker.remaining(), 0);

        // Saturates
        assert_eq!(tracker.increment(), 3);
    }

    #[test]
    fn test_reset() {
        let mut tracker = AttemptTracker::new(3);
        tracker.increment();
        tracker.increment();
        tracker.reset();
        assert_eq!(tracker.used(), 0);
        assert!(!tracker.exhausted());
    }

    #[test]
    fn test_zero_max_is_one() {
        let mut tracker = AttemptTracker::new(0);
        assert_eq!(tracker.max(), 1);
        tracker.increment();
        assert!(tracker.exhausted());
    }
}
