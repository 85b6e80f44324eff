pub const DEFAULT_MAX_ENERGY: u32 = 300;

/// Shared cross-game progress counter.
///
/// Energy only ever grows and saturates at `max`. The first time it reaches
/// the cap, [`Energy::add`] reports the crossing; later increments at the cap
/// never report it again until [`Energy::reset`].
#[derive(Debug, Clone)]
pub struct Energy {
    value: u32,
    max: u32,
    full_reported: bool,
}

impl Energy {
    pub fn new(max: u32) -> Self {
        Self {
            value: 0,
            max: max.max(1),
            full_reported: false,
        }
    }

    /// Returns `true` exactly once, on the call that first fills the meter.
    pub fn add(&mut self, amount: u32) -> bool {
        self.value = self.value.saturating_add(amount).min(self.max);
        if self.value >= self.max && !self.full_reported {
            self.full_reported = true;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.value = 0;
        self.full_reported = false;
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }

    pub fn ratio(&self) -> f64 {
        self.value as f64 / self.max as f64
    }

    /// Rounded percentage for the progress label.
    pub fn percent(&self) -> u32 {
        (self.ratio() * 100.0).round() as u32
    }
}

impl Default for Energy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENERGY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_at_max() {
        let mut e = Energy::default();
        e.add(250);
        e.add(100);
        assert_eq!(e.value(), 300);
        e.add(u32::MAX);
        assert_eq!(e.value(), 300);
    }

    #[test]
    fn fires_once_on_first_crossing() {
        let mut e = Energy::default();
        let mut fired = 0;
        for _ in 0..100 {
            if e.add(5) {
                fired += 1;
                assert_eq!(e.value(), 300);
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn exact_hit_counts_as_crossing() {
        let mut e = Energy::default();
        assert!(!e.add(299));
        assert!(e.add(1));
        assert!(!e.add(0));
    }

    #[test]
    fn zero_amounts_never_fire_below_cap() {
        let mut e = Energy::default();
        for _ in 0..10 {
            assert!(!e.add(0));
        }
        assert_eq!(e.value(), 0);
    }

    #[test]
    fn reset_rearms_the_event() {
        let mut e = Energy::default();
        assert!(e.add(300));
        e.reset();
        assert_eq!(e.value(), 0);
        assert!(e.add(300));
    }

    #[test]
    fn percent_rounds() {
        let mut e = Energy::default();
        e.add(100);
        assert_eq!(e.percent(), 33);
        e.add(50);
        assert_eq!(e.percent(), 50);
    }
}
