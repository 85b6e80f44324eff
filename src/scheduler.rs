//! A single tick source that sessions subscribe their timers to.
//!
//! Nothing here runs on its own: the owner calls [`TickSource::advance`]
//! with the elapsed milliseconds and reacts to the subscriptions that fired.
//! Disposing is idempotent, and a disposed subscription never fires again,
//! which keeps stale callbacks from touching a session after it ended.

/// Handle returned by [`TickSource::every`] and [`TickSource::once`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[derive(Debug)]
struct Timer {
    id: Subscription,
    period_ms: u64,
    next_due: u64,
    repeat: bool,
}

#[derive(Debug, Default)]
pub struct TickSource {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

impl TickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires every `period_ms`, first at `now + period_ms`.
    pub fn every(&mut self, period_ms: u64) -> Subscription {
        self.push(period_ms.max(1), true)
    }

    /// Fires once after `delay_ms` and is then disposed automatically.
    pub fn once(&mut self, delay_ms: u64) -> Subscription {
        self.push(delay_ms, false)
    }

    fn push(&mut self, period_ms: u64, repeat: bool) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            period_ms,
            next_due: self.now_ms + period_ms,
            repeat,
        });
        id
    }

    /// Returns whether the subscription was still live.
    pub fn dispose(&mut self, sub: Subscription) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != sub);
        self.timers.len() != before
    }

    pub fn dispose_all(&mut self) {
        self.timers.clear();
    }

    #[cfg(test)]
    pub fn is_live(&self, sub: Subscription) -> bool {
        self.timers.iter().any(|t| t.id == sub)
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance the clock and return every fire in chronological order.
    /// Simultaneous fires keep subscription order.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<Subscription> {
        let target = self.now_ms + dt_ms;
        let mut fired = Vec::new();
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.next_due <= target)
                .min_by_key(|(i, t)| (t.next_due, *i))
                .map(|(i, _)| i);
            let Some(idx) = next else { break };

            let timer = &mut self.timers[idx];
            fired.push(timer.id);
            if timer.repeat {
                timer.next_due += timer.period_ms;
            } else {
                self.timers.remove(idx);
            }
        }
        self.now_ms = target;
        fired
    }
}
