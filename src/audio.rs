use std::io::{self, Write};

use tracing::{debug, warn};

use crate::error::AudioError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sound {
    GiftOpen,
    HeartPop,
    Fanfare,
}

impl Sound {
    pub fn name(&self) -> &'static str {
        match self {
            Sound::GiftOpen => "gift-open",
            Sound::HeartPop => "heart-pop",
            Sound::Fanfare => "fanfare",
        }
    }
}

pub trait AudioSink {
    fn try_play(&mut self, sound: Sound) -> Result<(), AudioError>;

    /// Fire-and-forget. Playback failures are logged and dropped.
    fn play(&mut self, sound: Sound) {
        if let Err(err) = self.try_play(sound) {
            warn!(sound = sound.name(), %err, "audio playback failed");
        }
    }
}

/// Rings the terminal bell. The only sound a terminal can reliably make.
pub struct TerminalBell<W: Write = io::Stdout> {
    out: W,
}

impl TerminalBell {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalBell<W> {
    #[cfg(test)]
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> AudioSink for TerminalBell<W> {
    fn try_play(&mut self, sound: Sound) -> Result<(), AudioError> {
        // Only the gift and the fanfare ring; pops would be noise.
        if sound == Sound::HeartPop {
            return Ok(());
        }
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        debug!(sound = sound.name(), "bell");
        Ok(())
    }
}

/// Used when audio is disabled.
pub struct Muted;

impl AudioSink for Muted {
    fn try_play(&mut self, _sound: Sound) -> Result<(), AudioError> {
        Err(AudioError::Muted)
    }

    fn play(&mut self, _sound: Sound) {}
}

/// Records every request; handy for asserting which events made noise.
#[cfg(test)]
#[derive(Default, Clone)]
pub struct Recorder {
    pub played: std::rc::Rc<std::cell::RefCell<Vec<Sound>>>,
}

#[cfg(test)]
impl AudioSink for Recorder {
    fn try_play(&mut self, sound: Sound) -> Result<(), AudioError> {
        self.played.borrow_mut().push(sound);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bell_writes_bel_byte() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.play(Sound::GiftOpen);
        bell.play(Sound::HeartPop);
        assert_eq!(bell.out, b"\x07");
    }

    #[test]
    fn failures_are_swallowed() {
        let mut bell = TerminalBell::new(Broken);
        assert!(bell.try_play(Sound::Fanfare).is_err());
        bell.play(Sound::Fanfare);
    }
}
