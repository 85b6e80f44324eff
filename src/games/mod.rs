pub mod heart_catch;
pub mod memory;
pub mod puzzle;
pub mod rhythm;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::prelude::*;

use crate::audio::Sound;
use crate::rng::GameRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameId {
    HeartCatch,
    Memory,
    Puzzle,
    Rhythm,
}

impl GameId {
    pub fn all() -> &'static [GameId] {
        &[GameId::HeartCatch, GameId::Memory, GameId::Puzzle, GameId::Rhythm]
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::HeartCatch => "Heart Catch",
            GameId::Memory => "Love Memory",
            GameId::Puzzle => "Love Puzzle",
            GameId::Rhythm => "Love Rhythm",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            GameId::HeartCatch => 0,
            GameId::Memory => 1,
            GameId::Puzzle => 2,
            GameId::Rhythm => 3,
        }
    }

    pub fn from_index(idx: usize) -> Option<GameId> {
        GameId::all().get(idx).copied()
    }

    pub fn instructions(&self) -> &'static [&'static str] {
        match self {
            GameId::HeartCatch => &[
                "Move the mouse (or ←/→) to steer the basket",
                "Catch falling hearts to score:",
                "  • large heart: 30 points",
                "  • medium heart: 20 points",
                "  • small heart: 10 points",
                "Avoid the bombs! They cost 10-50 points",
                "Time: 30 seconds",
                "Every heart caught: +5 energy",
            ],
            GameId::Memory => &[
                "Flip cards to find matching pairs",
                "Remember where each heart was",
                "Every pair scores 100 points",
                "Match all 8 pairs to win",
                "Every pair: +10 energy, full board: +50 bonus",
            ],
            GameId::Puzzle => &[
                "Select two tiles to swap them",
                "Put every tile back in order 1-9",
                "Tiles in the right place are outlined green",
                "Fewer moves means a higher score",
                "Solving the puzzle: +30 energy",
            ],
            GameId::Rhythm => &[
                "Press A, S, D, F as a note crosses the gold line",
                "Timing decides the score:",
                "  • perfect: 100 points",
                "  • good: 50 points",
                "  • ok: 25 points",
                "A key with no note in reach breaks the combo",
                "Every note hit: +3 energy",
            ],
        }
    }

    /// Fresh, not yet started session for this game.
    pub fn create(&self, rng: GameRng) -> Box<dyn Game> {
        match self {
            GameId::HeartCatch => Box::new(heart_catch::HeartCatch::new(rng)),
            GameId::Memory => Box::new(memory::MemoryMatch::new(rng)),
            GameId::Puzzle => Box::new(puzzle::SlidingPuzzle::new(rng)),
            GameId::Rhythm => Box::new(rhythm::Rhythm::new(rng)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Created but waiting for the player to begin.
    Ready,
    Active,
    Ended,
}

/// Input after translation from raw terminal events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UserAction {
    /// Absolute horizontal catcher position, in percent.
    Pointer(f32),
    /// Relative catcher move, in percent.
    Nudge(f32),
    Lane(usize),
    Select(usize),
}

/// Side effects a session reports to its owner. Sessions never touch shared
/// state themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    EnergyGain(u32),
    Sound(Sound),
    Ended { score: u32 },
}

pub trait Game {
    fn id(&self) -> GameId;
    /// Reset score, entities and timers and begin play.
    fn start(&mut self);
    fn tick(&mut self, dt_ms: u64, out: &mut Vec<GameEvent>);
    fn on_action(&mut self, action: UserAction, out: &mut Vec<GameEvent>);
    /// Stop play and dispose every timer. Idempotent.
    fn end(&mut self);
    fn handle_key(&mut self, key: KeyEvent, out: &mut Vec<GameEvent>);
    fn handle_mouse(&mut self, _mouse: MouseEvent, _out: &mut Vec<GameEvent>) {}
    fn render(&mut self, frame: &mut Frame, area: Rect);
    fn score(&self) -> u32;
    /// Best score across every run of this session, the current one included.
    fn high_score(&self) -> u32;
    fn status(&self) -> Status;
}

pub(crate) fn in_rect(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}
