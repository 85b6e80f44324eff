use crate::scheduler::{Subscription, TickSource};

/// Reveals a message one character per period.
pub struct Typewriter {
    chars: Vec<char>,
    revealed: usize,
    clock: TickSource,
    step: Subscription,
}

impl Typewriter {
    pub fn new(text: &str, char_ms: u64) -> Self {
        let mut clock = TickSource::new();
        let step = clock.every(char_ms);
        let mut tw = Self {
            chars: text.chars().collect(),
            revealed: 0,
            clock,
            step,
        };
        if tw.chars.is_empty() {
            tw.clock.dispose_all();
        }
        tw
    }

    /// Returns `true` on the tick that completes the reveal.
    pub fn tick(&mut self, dt_ms: u64) -> bool {
        if self.is_complete() {
            return false;
        }
        for sub in self.clock.advance(dt_ms) {
            if sub == self.step {
                self.revealed += 1;
                if self.is_complete() {
                    self.clock.dispose_all();
                    return true;
                }
            }
        }
        false
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.chars.len()
    }

    pub fn visible(&self) -> String {
        self.chars[..self.revealed].iter().collect()
    }
}
