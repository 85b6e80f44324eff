use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tracing::debug;

use crate::animator::{animate, Animated};
use crate::audio::Sound;
use crate::games::{Game, GameEvent, GameId, Status, UserAction};
use crate::rng::GameRng;
use crate::scheduler::{Subscription, TickSource};

pub const LANES: usize = 4;
const LANE_KEYS: [char; LANES] = ['a', 's', 'd', 'f'];
const NOTE_GLYPHS: [&str; LANES] = ["♥", "♡", "❣", "♪"];
const GAME_SECS: u32 = 30;
const SPAWN_MS: u64 = 800;
const MOTION_MS: u64 = 16;
const NOTE_SPEED: f32 = 2.0;
const SPAWN_Y: f32 = -10.0;
const DESPAWN_Y: f32 = 110.0;
pub const HIT_LINE: f32 = 80.0;
const WINDOW_TOP: f32 = 70.0;
const WINDOW_BOTTOM: f32 = 90.0;
const HIT_ENERGY: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    Perfect,
    Good,
    Ok,
}

impl Grade {
    /// Grade a hit by its distance from the hit line.
    pub fn from_distance(distance: f32) -> Grade {
        if distance < 5.0 {
            Grade::Perfect
        } else if distance < 10.0 {
            Grade::Good
        } else {
            Grade::Ok
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            Grade::Perfect => 100,
            Grade::Good => 50,
            Grade::Ok => 25,
        }
    }

    fn label(&self) -> (&'static str, Color) {
        match self {
            Grade::Perfect => ("PERFECT!", Color::Rgb(255, 215, 0)),
            Grade::Good => ("GOOD", Color::Rgb(80, 220, 120)),
            Grade::Ok => ("OK", Color::Rgb(170, 170, 170)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Note {
    pub lane: usize,
    pub y: f32,
    pub hit: bool,
}

impl Note {
    fn in_window(&self) -> bool {
        !self.hit && (WINDOW_TOP..=WINDOW_BOTTOM).contains(&self.y)
    }

    fn distance(&self) -> f32 {
        (self.y - HIT_LINE).abs()
    }
}

impl Animated for Note {
    fn step(&mut self, _rng: &mut GameRng) {
        self.y += NOTE_SPEED;
    }

    fn expired(&self) -> bool {
        self.hit || self.y >= DESPAWN_Y
    }
}

#[derive(Clone, Copy)]
struct Timers {
    spawn: Subscription,
    motion: Subscription,
    countdown: Subscription,
}

pub struct Rhythm {
    notes: Vec<Note>,
    score: u32,
    high_score: u32,
    combo: u32,
    best_combo: u32,
    last_grade: Option<Grade>,
    remaining_secs: u32,
    status: Status,
    paused: bool,
    clock: TickSource,
    timers: Option<Timers>,
    rng: GameRng,
}

impl Rhythm {
    pub fn new(rng: GameRng) -> Self {
        Self {
            notes: Vec::new(),
            score: 0,
            high_score: 0,
            combo: 0,
            best_combo: 0,
            last_grade: None,
            remaining_secs: GAME_SECS,
            status: Status::Ready,
            paused: false,
            clock: TickSource::new(),
            timers: None,
            rng,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[cfg(test)]
    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[cfg(test)]
    pub(crate) fn push_note(&mut self, lane: usize, y: f32) {
        self.notes.push(Note { lane, y, hit: false });
    }

    /// Resolve a key press on `lane`. The pending note closest to the hit
    /// line wins; the rest of the lane stays pending. No note in reach
    /// breaks the combo.
    fn hit_lane(&mut self, lane: usize, out: &mut Vec<GameEvent>) {
        let target = self
            .notes
            .iter_mut()
            .filter(|n| n.lane == lane && n.in_window())
            .min_by(|a, b| a.distance().total_cmp(&b.distance()));

        let Some(note) = target else {
            self.combo = 0;
            self.last_grade = None;
            return;
        };
        note.hit = true;
        let grade = Grade::from_distance(note.distance());
        self.score += grade.points();
        self.combo += 1;
        self.best_combo = self.best_combo.max(self.combo);
        self.last_grade = Some(grade);
        out.push(GameEvent::EnergyGain(HIT_ENERGY));
        out.push(GameEvent::Sound(Sound::HeartPop));
    }

    fn stop(&mut self) {
        self.clock.dispose_all();
        self.timers = None;
        self.paused = false;
        if self.status == Status::Active {
            self.status = Status::Ended;
        }
        self.high_score = self.high_score.max(self.score);
    }

    fn lane_lines(&self, lane: usize, h: usize) -> Vec<Line<'static>> {
        let bg = Color::Rgb(20, 10, 30);
        let hit_row = ((HIT_LINE / 100.0) * h as f32) as usize;
        let mut rows: Vec<Line<'static>> = (0..h)
            .map(|r| {
                if r == hit_row {
                    Line::from(Span::styled(
                        "━━━",
                        Style::default().fg(Color::Rgb(255, 215, 0)).bg(bg),
                    ))
                } else {
                    Line::from(Span::styled("   ", Style::default().bg(bg)))
                }
            })
            .collect();
        for note in self.notes().iter().filter(|n| n.lane == lane && !n.hit && n.y >= 0.0) {
            let r = ((note.y / 100.0) * h as f32) as usize;
            if r < h {
                rows[r] = Line::from(Span::styled(
                    format!(" {} ", NOTE_GLYPHS[lane]),
                    Style::default().fg(Color::Rgb(255, 105, 180)).bg(bg).add_modifier(Modifier::BOLD),
                ));
            }
        }
        rows
    }
}

impl Game for Rhythm {
    fn id(&self) -> GameId {
        GameId::Rhythm
    }

    fn start(&mut self) {
        self.high_score = self.high_score.max(self.score);
        self.clock.dispose_all();
        self.notes.clear();
        self.score = 0;
        self.combo = 0;
        self.last_grade = None;
        self.remaining_secs = GAME_SECS;
        self.paused = false;
        self.timers = Some(Timers {
            spawn: self.clock.every(SPAWN_MS),
            motion: self.clock.every(MOTION_MS),
            countdown: self.clock.every(1000),
        });
        self.status = Status::Active;
        debug!("rhythm started");
    }

    fn tick(&mut self, dt_ms: u64, out: &mut Vec<GameEvent>) {
        if self.paused {
            return;
        }
        let Some(timers) = self.timers else { return };
        for sub in self.clock.advance(dt_ms) {
            if self.status != Status::Active {
                break;
            }
            if sub == timers.spawn {
                let lane = self.rng.index(LANES);
                self.notes.push(Note { lane, y: SPAWN_Y, hit: false });
            } else if sub == timers.motion {
                animate(&mut self.notes, &mut self.rng);
            } else if sub == timers.countdown {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 {
                    self.stop();
                    out.push(GameEvent::Ended { score: self.score });
                }
            }
        }
    }

    fn on_action(&mut self, action: UserAction, out: &mut Vec<GameEvent>) {
        if self.status != Status::Active || self.paused {
            return;
        }
        if let UserAction::Lane(lane) = action {
            if lane < LANES {
                self.hit_lane(lane, out);
            }
        }
    }

    fn end(&mut self) {
        self.stop();
    }

    fn handle_key(&mut self, key: KeyEvent, out: &mut Vec<GameEvent>) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.start(),
            KeyCode::Enter | KeyCode::Char(' ') if self.status != Status::Active => self.start(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if self.status == Status::Active {
                    self.paused = !self.paused;
                }
            }
            KeyCode::Char(c) => {
                if let Some(lane) = LANE_KEYS.iter().position(|k| *k == c.to_ascii_lowercase()) {
                    self.on_action(UserAction::Lane(lane), out);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(230, 60, 90)))
            .title(" ♪ Love Rhythm ")
            .title_style(Style::default().fg(Color::Rgb(255, 100, 130)).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let mut status = vec![
            Span::styled(
                format!(" Score: {} ", self.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Combo: {} ", self.combo), Style::default().fg(Color::Rgb(255, 105, 180))),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Time: {}s ", self.remaining_secs), Style::default().fg(Color::Rgb(180, 130, 255))),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Best: {} ", self.high_score), Style::default().fg(Color::Cyan)),
        ];
        if let Some(grade) = self.last_grade {
            let (label, color) = grade.label();
            status.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
            status.push(Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)));
        }
        frame.render_widget(Paragraph::new(Line::from(status)), chunks[0]);

        let lane_w = 5u16;
        let total_w = lane_w * LANES as u16;
        let left = chunks[1].x + chunks[1].width.saturating_sub(total_w) / 2;
        let h = chunks[1].height as usize;
        for lane in 0..LANES {
            let x = left + lane as u16 * lane_w;
            if x + lane_w > chunks[1].x + chunks[1].width {
                break;
            }
            let rect = Rect::new(x, chunks[1].y, lane_w, chunks[1].height);
            let lane_block = Block::default()
                .borders(Borders::LEFT | Borders::RIGHT)
                .border_style(Style::default().fg(Color::Rgb(80, 40, 80)));
            let body = lane_block.inner(rect);
            frame.render_widget(lane_block, rect);
            frame.render_widget(Paragraph::new(self.lane_lines(lane, h)), body);

            let key = Rect::new(x, chunks[2].y, lane_w, 1);
            frame.render_widget(
                Paragraph::new(LANE_KEYS[lane].to_ascii_uppercase().to_string())
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD)),
                key,
            );
        }

        let help = if self.status == Status::Ended {
            Line::from(vec![
                Span::styled(" 🎵 SONG OVER! ", Style::default().fg(Color::Rgb(255, 100, 130)).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("Score: {} │ Best combo: {} │ ENTER play again, Esc menu", self.score, self.best_combo()),
                    Style::default().fg(Color::Gray),
                ),
            ])
        } else if self.is_paused() {
            Line::from(Span::styled(
                " ⏸ PAUSED - Press P to resume ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(vec![
                Span::styled(" A S D F Hit ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("P Pause ", Style::default().fg(Color::DarkGray)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("R Restart ", Style::default().fg(Color::DarkGray)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("Esc Menu", Style::default().fg(Color::DarkGray)),
            ])
        };
        frame.render_widget(Paragraph::new(help), chunks[3]);
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn high_score(&self) -> u32 {
        self.high_score.max(self.score)
    }

    fn status(&self) -> Status {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Rhythm {
        let mut g = Rhythm::new(GameRng::seeded(8));
        g.start();
        g
    }

    #[test]
    fn grades_by_distance() {
        assert_eq!(Grade::from_distance(4.0), Grade::Perfect);
        assert_eq!(Grade::from_distance(8.0), Grade::Good);
        assert_eq!(Grade::from_distance(15.0), Grade::Ok);
        assert_eq!(Grade::Perfect.points(), 100);
        assert_eq!(Grade::Good.points(), 50);
        assert_eq!(Grade::Ok.points(), 25);
    }

    #[test]
    fn perfect_hit_scores_and_builds_combo() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(1, 84.0);
        g.on_action(UserAction::Lane(1), &mut out);
        assert_eq!(g.score(), 100);
        assert_eq!(g.combo(), 1);
        assert_eq!(out[0], GameEvent::EnergyGain(3));
    }

    #[test]
    fn good_and_edge_of_window() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(0, 72.0);
        g.on_action(UserAction::Lane(0), &mut out);
        assert_eq!(g.score(), 50);
        g.push_note(0, 90.0);
        g.on_action(UserAction::Lane(0), &mut out);
        assert_eq!(g.score(), 75);
        assert_eq!(g.combo(), 2);
    }

    #[test]
    fn miss_resets_combo_without_scoring() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(2, 80.0);
        g.on_action(UserAction::Lane(2), &mut out);
        assert_eq!(g.combo(), 1);

        g.push_note(2, 50.0);
        g.push_note(3, 80.0);
        out.clear();
        g.on_action(UserAction::Lane(2), &mut out);
        assert_eq!(g.combo(), 0);
        assert_eq!(g.score(), 100);
        assert!(out.is_empty());
        assert_eq!(g.best_combo(), 1);
    }

    #[test]
    fn closest_note_resolves_first() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(1, 72.0);
        g.push_note(1, 81.0);
        g.on_action(UserAction::Lane(1), &mut out);
        assert_eq!(g.score(), 100);
        let pending: Vec<_> = g.notes().iter().filter(|n| !n.hit).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].y, 72.0);
    }

    #[test]
    fn hit_notes_leave_on_next_motion() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(0, 80.0);
        g.on_action(UserAction::Lane(0), &mut out);
        g.tick(MOTION_MS, &mut out);
        assert!(g.notes().is_empty());
    }

    #[test]
    fn notes_spawn_and_fall() {
        let mut g = started();
        let mut out = Vec::new();
        g.tick(SPAWN_MS, &mut out);
        assert_eq!(g.notes().len(), 1);
        let y0 = g.notes()[0].y;
        g.tick(MOTION_MS, &mut out);
        assert_eq!(g.notes()[0].y, y0 + NOTE_SPEED);
    }

    #[test]
    fn pause_freezes_the_clock() {
        let mut g = started();
        let mut out = Vec::new();
        g.handle_key(KeyEvent::from(KeyCode::Char('p')), &mut out);
        assert!(g.is_paused());
        g.tick(60_000, &mut out);
        assert_eq!(g.status(), Status::Active);
        assert!(g.notes().is_empty());
        g.handle_key(KeyEvent::from(KeyCode::Char('p')), &mut out);
        g.tick(GAME_SECS as u64 * 1000, &mut out);
        assert_eq!(g.status(), Status::Ended);
        assert!(out.iter().any(|e| matches!(e, GameEvent::Ended { .. })));
    }

    #[test]
    fn lane_keys_map_to_lanes() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(3, 80.0);
        g.handle_key(KeyEvent::from(KeyCode::Char('F')), &mut out);
        assert_eq!(g.score(), 100);
    }

    #[test]
    fn restart_folds_score_into_high_score() {
        let mut g = started();
        let mut out = Vec::new();
        g.push_note(2, HIT_LINE);
        g.on_action(UserAction::Lane(2), &mut out);
        assert_eq!(g.score(), 100);
        g.start();
        assert_eq!(g.score(), 0);
        assert_eq!(g.high_score(), 100);
    }
}
