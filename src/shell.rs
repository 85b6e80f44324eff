//! Top-level flow of the experience.
//!
//! Idle → GiftOpening → MessageShowing → GameMenu ⇄ Instructions → GameActive,
//! with FinalMessage reachable from anywhere once the energy meter fills.
//! The stage is one tagged value, and the running session lives inside the
//! `Playing` variant, so two overlays can never be up at once.

use crossterm::event::{KeyEvent, MouseEvent};
use tracing::{debug, info};

use crate::animator::Ambience;
use crate::audio::{AudioSink, Sound};
use crate::energy::{Energy, DEFAULT_MAX_ENERGY};
use crate::games::{Game, GameEvent, GameId, Status};
use crate::rng::GameRng;
use crate::scheduler::{Subscription, TickSource};
use crate::typewriter::Typewriter;

const GIFT_OPEN_MS: u64 = 600;
const FIREWORKS_DELAY_MS: u64 = 2000;
const FINAL_CHAR_MS: u64 = 150;

pub const DEFAULT_GREETING: &str =
    "Happy birthday, my love! Stay my sweetheart forever. I love you so much! ♥";
pub const DEFAULT_FINAL_TEXT: &str = "We will always be together";
pub const FINAL_BODY: &str =
    "You finished every love challenge! Our love is strong and it will last forever!";

#[derive(Clone, Debug)]
pub struct Settings {
    pub greeting: String,
    pub final_text: String,
    pub typewriter_ms: u64,
    pub message_dwell_ms: u64,
    pub energy_max: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            final_text: DEFAULT_FINAL_TEXT.to_string(),
            typewriter_ms: 80,
            message_dwell_ms: 12_000,
            energy_max: DEFAULT_MAX_ENERGY,
        }
    }
}

pub enum Stage {
    Idle,
    GiftOpening,
    Message(Typewriter),
    Menu,
    Instructions(GameId),
    Playing(Box<dyn Game>),
    FinalMessage(Typewriter),
}

/// Copyable view of [`Stage`] for callers that only need to branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    GiftOpening,
    MessageShowing,
    GameMenu,
    Instructions(GameId),
    GameActive(GameId),
    FinalMessage,
}

impl Stage {
    pub fn phase(&self) -> Phase {
        match self {
            Stage::Idle => Phase::Idle,
            Stage::GiftOpening => Phase::GiftOpening,
            Stage::Message(_) => Phase::MessageShowing,
            Stage::Menu => Phase::GameMenu,
            Stage::Instructions(id) => Phase::Instructions(*id),
            Stage::Playing(game) => Phase::GameActive(game.id()),
            Stage::FinalMessage(_) => Phase::FinalMessage,
        }
    }
}

pub struct Shell {
    stage: Stage,
    energy: Energy,
    clock: TickSource,
    opening: Option<Subscription>,
    fireworks: Option<Subscription>,
    dwell: Option<Subscription>,
    ambience: Ambience,
    audio: Box<dyn AudioSink>,
    rng: GameRng,
    best: [u32; 4],
    settings: Settings,
}

impl Shell {
    pub fn new(settings: Settings, mut rng: GameRng, audio: Box<dyn AudioSink>) -> Self {
        let ambience = Ambience::new(rng.fork());
        Self {
            stage: Stage::Idle,
            energy: Energy::new(settings.energy_max),
            clock: TickSource::new(),
            opening: None,
            fireworks: None,
            dwell: None,
            ambience,
            audio,
            rng,
            best: [0; 4],
            settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.stage.phase()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn energy(&self) -> &Energy {
        &self.energy
    }

    pub fn ambience(&self) -> &Ambience {
        &self.ambience
    }

    pub fn best(&self, id: GameId) -> u32 {
        self.best[id.index()]
    }

    pub fn gift_opened(&self) -> bool {
        self.phase() != Phase::Idle
    }

    pub fn session_mut(&mut self) -> Option<&mut dyn Game> {
        match &mut self.stage {
            Stage::Playing(game) => Some(game.as_mut()),
            _ => None,
        }
    }

    pub fn open_gift(&mut self) {
        if self.gift_opened() {
            debug!(phase = ?self.phase(), "gift already opened");
            return;
        }
        self.audio.play(Sound::GiftOpen);
        self.stage = Stage::GiftOpening;
        self.opening = Some(self.clock.once(GIFT_OPEN_MS));
        self.fireworks = Some(self.clock.once(FIREWORKS_DELAY_MS));
        info!("gift opened");
    }

    /// Skip the rest of the greeting and go straight to the menu.
    pub fn play_now(&mut self) {
        if matches!(self.stage, Stage::Message(_)) {
            self.enter_menu();
        } else {
            debug!(phase = ?self.phase(), "play-now ignored");
        }
    }

    /// Show the instructions for `id`, closing whatever overlay is up.
    pub fn start_game(&mut self, id: GameId) {
        match self.phase() {
            Phase::GameMenu | Phase::Instructions(_) | Phase::FinalMessage => {}
            Phase::GameActive(_) => self.close_game(),
            phase => {
                debug!(?phase, game = id.title(), "start ignored");
                return;
            }
        }
        self.stage = Stage::Instructions(id);
        debug!(game = id.title(), "instructions shown");
    }

    pub fn confirm_start(&mut self) {
        let Stage::Instructions(id) = self.stage else {
            debug!(phase = ?self.phase(), "confirm ignored");
            return;
        };
        let mut game = id.create(self.rng.fork());
        game.start();
        self.stage = Stage::Playing(game);
        info!(game = id.title(), "game started");
    }

    pub fn close_instructions(&mut self) {
        if matches!(self.stage, Stage::Instructions(_)) {
            self.stage = Stage::Menu;
        }
    }

    pub fn close_game(&mut self) {
        if !matches!(self.stage, Stage::Playing(_)) {
            debug!(phase = ?self.phase(), "close ignored");
            return;
        }
        let Stage::Playing(mut game) = std::mem::replace(&mut self.stage, Stage::Menu) else {
            return;
        };
        self.retire(game.as_mut());
    }

    /// Add energy from any source. Filling the meter shows the final message.
    pub fn add_energy(&mut self, amount: u32) {
        if self.energy.add(amount) {
            self.show_final();
        }
    }

    pub fn dismiss_final(&mut self) {
        if matches!(self.stage, Stage::FinalMessage(_)) {
            self.stage = Stage::Menu;
        }
    }

    /// Back to the unopened gift. Energy and flags are zeroed; per-game best
    /// scores survive.
    pub fn reset(&mut self) {
        if let Stage::Playing(mut game) = std::mem::replace(&mut self.stage, Stage::Idle) {
            self.retire(game.as_mut());
        }
        self.clock.dispose_all();
        self.opening = None;
        self.fireworks = None;
        self.dwell = None;
        self.ambience.set_fireworks(false);
        self.energy.reset();
        info!("experience reset");
    }

    pub fn game_key(&mut self, key: KeyEvent) {
        let mut events = Vec::new();
        if let Some(game) = self.session_mut() {
            game.handle_key(key, &mut events);
        }
        self.apply(events);
    }

    pub fn game_mouse(&mut self, mouse: MouseEvent) {
        let mut events = Vec::new();
        if let Some(game) = self.session_mut() {
            game.handle_mouse(mouse, &mut events);
        }
        self.apply(events);
    }

    pub fn tick(&mut self, dt_ms: u64) {
        self.ambience.tick(dt_ms);

        // A stage entered during this tick starts its own clock next tick.
        let mut entered = false;
        for sub in self.clock.advance(dt_ms) {
            if Some(sub) == self.opening {
                self.opening = None;
                if matches!(self.stage, Stage::GiftOpening) {
                    entered = true;
                    let tw = Typewriter::new(&self.settings.greeting, self.settings.typewriter_ms);
                    // Nothing to reveal: dwell starts right away.
                    if tw.is_complete() {
                        self.dwell = Some(self.clock.once(self.settings.message_dwell_ms));
                    }
                    self.stage = Stage::Message(tw);
                }
            } else if Some(sub) == self.fireworks {
                self.fireworks = None;
                self.ambience.set_fireworks(true);
            } else if Some(sub) == self.dwell {
                self.dwell = None;
                if matches!(self.stage, Stage::Message(_)) {
                    self.enter_menu();
                }
            }
        }

        if entered {
            return;
        }
        let mut events = Vec::new();
        match &mut self.stage {
            Stage::Message(tw) => {
                if tw.tick(dt_ms) {
                    self.dwell = Some(self.clock.once(self.settings.message_dwell_ms));
                }
            }
            Stage::FinalMessage(tw) => {
                tw.tick(dt_ms);
            }
            Stage::Playing(game) => game.tick(dt_ms, &mut events),
            _ => {}
        }
        self.apply(events);
    }

    /// Session events of one batch. Energy is summed so a completion bonus
    /// reported next to the last pair is never cut off by the final message.
    fn apply(&mut self, events: Vec<GameEvent>) {
        let mut gained = 0u32;
        for event in events {
            match event {
                GameEvent::EnergyGain(amount) => gained = gained.saturating_add(amount),
                GameEvent::Sound(sound) => self.audio.play(sound),
                GameEvent::Ended { score } => {
                    if let Some(id) = self.playing_id() {
                        self.record_best(id, score);
                        info!(game = id.title(), score, "game over");
                    }
                }
            }
        }
        if gained > 0 {
            self.add_energy(gained);
        }
    }

    fn playing_id(&self) -> Option<GameId> {
        match self.phase() {
            Phase::GameActive(id) => Some(id),
            _ => None,
        }
    }

    fn record_best(&mut self, id: GameId, score: u32) {
        let best = &mut self.best[id.index()];
        *best = (*best).max(score);
    }

    fn enter_menu(&mut self) {
        if let Some(sub) = self.dwell.take() {
            self.clock.dispose(sub);
        }
        self.stage = Stage::Menu;
        debug!("menu shown");
    }

    fn show_final(&mut self) {
        let final_tw = Typewriter::new(&self.settings.final_text, FINAL_CHAR_MS);
        if let Stage::Playing(mut game) = std::mem::replace(&mut self.stage, Stage::FinalMessage(final_tw)) {
            self.retire(game.as_mut());
        }
        if let Some(sub) = self.dwell.take() {
            self.clock.dispose(sub);
        }
        self.audio.play(Sound::Fanfare);
        info!(energy = self.energy.value(), "energy full, final message shown");
    }

    /// Stop a session for good and keep its best score.
    fn retire(&mut self, game: &mut dyn Game) {
        let was_running = game.status() == Status::Active;
        game.end();
        let id = game.id();
        self.record_best(id, game.high_score());
        info!(game = id.title(), score = game.score(), was_running, "game closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Recorder;
    use crossterm::event::KeyCode;

    fn shell() -> (Shell, Recorder) {
        let rec = Recorder::default();
        let settings = Settings {
            greeting: "hi".to_string(),
            typewriter_ms: 10,
            message_dwell_ms: 100,
            ..Settings::default()
        };
        let shell = Shell::new(settings, GameRng::seeded(21), Box::new(rec.clone()));
        (shell, rec)
    }

    fn to_menu(s: &mut Shell) {
        s.open_gift();
        s.tick(GIFT_OPEN_MS);
        assert_eq!(s.phase(), Phase::MessageShowing);
        s.play_now();
        assert_eq!(s.phase(), Phase::GameMenu);
    }

    #[test]
    fn gift_flow_auto_advances_to_menu() {
        let (mut s, rec) = shell();
        assert_eq!(s.phase(), Phase::Idle);
        s.open_gift();
        assert_eq!(s.phase(), Phase::GiftOpening);
        assert_eq!(rec.played.borrow()[0], Sound::GiftOpen);

        s.tick(GIFT_OPEN_MS);
        assert_eq!(s.phase(), Phase::MessageShowing);
        s.tick(10);
        s.tick(10);
        // revealed; now dwelling
        s.tick(99);
        assert_eq!(s.phase(), Phase::MessageShowing);
        s.tick(1);
        assert_eq!(s.phase(), Phase::GameMenu);
    }

    #[test]
    fn second_gift_click_is_ignored() {
        let (mut s, rec) = shell();
        s.open_gift();
        s.open_gift();
        assert_eq!(rec.played.borrow().len(), 1);
    }

    #[test]
    fn fireworks_start_two_seconds_after_gift() {
        let (mut s, _) = shell();
        s.open_gift();
        s.tick(FIREWORKS_DELAY_MS - 1);
        assert!(!s.ambience().fireworks_on());
        s.tick(1);
        assert!(s.ambience().fireworks_on());
    }

    #[test]
    fn play_now_cancels_dwell() {
        let (mut s, _) = shell();
        s.open_gift();
        s.tick(GIFT_OPEN_MS);
        s.tick(20);
        s.play_now();
        s.start_game(GameId::Memory);
        s.tick(1000);
        assert_eq!(s.phase(), Phase::Instructions(GameId::Memory));
    }

    #[test]
    fn instructions_then_game_then_menu() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::HeartCatch);
        assert_eq!(s.phase(), Phase::Instructions(GameId::HeartCatch));
        s.close_instructions();
        assert_eq!(s.phase(), Phase::GameMenu);

        s.start_game(GameId::HeartCatch);
        s.confirm_start();
        assert_eq!(s.phase(), Phase::GameActive(GameId::HeartCatch));
        assert_eq!(s.session_mut().map(|g| g.status()), Some(Status::Active));
        s.close_game();
        assert_eq!(s.phase(), Phase::GameMenu);
        assert!(s.session_mut().is_none());
    }

    #[test]
    fn starting_another_game_closes_the_running_one() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::Rhythm);
        s.confirm_start();
        s.start_game(GameId::Puzzle);
        assert_eq!(s.phase(), Phase::Instructions(GameId::Puzzle));
        assert!(s.session_mut().is_none());
    }

    #[test]
    fn operations_out_of_state_are_noops() {
        let (mut s, _) = shell();
        s.start_game(GameId::Memory);
        s.confirm_start();
        s.close_game();
        s.dismiss_final();
        s.play_now();
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn filling_energy_mid_game_shows_final_once() {
        let (mut s, rec) = shell();
        to_menu(&mut s);
        s.start_game(GameId::HeartCatch);
        s.confirm_start();
        s.add_energy(299);
        assert_eq!(s.phase(), Phase::GameActive(GameId::HeartCatch));
        s.add_energy(5);
        assert_eq!(s.phase(), Phase::FinalMessage);
        assert_eq!(s.energy().value(), 300);
        assert!(s.session_mut().is_none());

        s.dismiss_final();
        assert_eq!(s.phase(), Phase::GameMenu);
        s.add_energy(50);
        assert_eq!(s.phase(), Phase::GameMenu);
        let fanfares = rec.played.borrow().iter().filter(|x| **x == Sound::Fanfare).count();
        assert_eq!(fanfares, 1);
    }

    #[test]
    fn session_events_feed_meter_and_best() {
        let (mut s, rec) = shell();
        to_menu(&mut s);
        s.start_game(GameId::Puzzle);
        s.confirm_start();
        s.apply(vec![
            GameEvent::EnergyGain(30),
            GameEvent::Sound(Sound::Fanfare),
            GameEvent::Ended { score: 900 },
        ]);
        assert_eq!(s.energy().value(), 30);
        assert_eq!(s.best(GameId::Puzzle), 900);
        assert_eq!(s.phase(), Phase::GameActive(GameId::Puzzle));
        assert_eq!(rec.played.borrow().last(), Some(&Sound::Fanfare));
    }

    #[test]
    fn completion_bonus_in_same_batch_counts_fully() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::Memory);
        s.confirm_start();
        s.add_energy(250);
        s.apply(vec![GameEvent::EnergyGain(10), GameEvent::EnergyGain(50)]);
        assert_eq!(s.energy().value(), 300);
        assert_eq!(s.phase(), Phase::FinalMessage);
    }

    #[test]
    fn reset_returns_to_idle_and_zeroes_energy() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::Rhythm);
        s.confirm_start();
        s.add_energy(120);
        s.reset();
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.energy().value(), 0);
        assert!(!s.ambience().fireworks_on());
        assert!(!s.gift_opened());

        // pending gift timers are gone too
        s.tick(10_000);
        assert_eq!(s.phase(), Phase::Idle);
        assert!(!s.ambience().fireworks_on());
    }

    #[test]
    fn reset_rearms_final_message() {
        let (mut s, _) = shell();
        s.add_energy(300);
        assert_eq!(s.phase(), Phase::FinalMessage);
        s.reset();
        to_menu(&mut s);
        s.add_energy(300);
        assert_eq!(s.phase(), Phase::FinalMessage);
    }

    #[test]
    fn game_keys_reach_the_session() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::Rhythm);
        s.confirm_start();
        s.game_key(KeyEvent::from(KeyCode::Char('p')));
        s.tick(60_000);
        assert_eq!(s.session_mut().map(|g| g.status()), Some(Status::Active));
    }

    #[test]
    fn closed_session_never_ticks_again() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::HeartCatch);
        s.confirm_start();
        s.tick(5_000);
        s.close_game();
        let before = s.energy().value();
        s.tick(60_000);
        assert_eq!(s.energy().value(), before);
        assert_eq!(s.phase(), Phase::GameMenu);
    }

    #[test]
    fn empty_greeting_still_reaches_the_menu() {
        let rec = Recorder::default();
        let settings = Settings {
            greeting: String::new(),
            message_dwell_ms: 100,
            ..Settings::default()
        };
        let mut s = Shell::new(settings, GameRng::seeded(3), Box::new(rec));
        s.open_gift();
        s.tick(GIFT_OPEN_MS);
        assert_eq!(s.phase(), Phase::MessageShowing);
        s.tick(99);
        assert_eq!(s.phase(), Phase::MessageShowing);
        s.tick(1);
        assert_eq!(s.phase(), Phase::GameMenu);
    }

    #[test]
    fn restarting_in_place_keeps_the_best_score() {
        let (mut s, _) = shell();
        to_menu(&mut s);
        s.start_game(GameId::Rhythm);
        s.confirm_start();
        // first note has reached the hit line by now
        s.tick(1504);
        for c in ['a', 's', 'd', 'f'] {
            s.game_key(KeyEvent::from(KeyCode::Char(c)));
        }
        let scored = s.session_mut().map(|g| g.score()).unwrap_or(0);
        assert!(scored > 0);

        s.game_key(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(s.session_mut().map(|g| g.score()), Some(0));
        s.close_game();
        assert_eq!(s.best(GameId::Rhythm), scored);
    }
}
