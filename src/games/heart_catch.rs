use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tracing::debug;

use crate::animator::Animated;
use crate::audio::Sound;
use crate::games::{in_rect, Game, GameEvent, GameId, Status, UserAction};
use crate::rng::GameRng;
use crate::scheduler::{Subscription, TickSource};

const GAME_SECS: u32 = 30;
const SPAWN_MS: u64 = 800;
const MOTION_MS: u64 = 16;
const BOMB_CHANCE: f64 = 0.15;
const BASKET_HALF: f32 = 8.0;
const BASKET_TOP: f32 = 85.0;
const BASKET_BOTTOM: f32 = 95.0;
const HEART_ENERGY: u32 = 5;
const NUDGE: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    SmallHeart,
    MediumHeart,
    LargeHeart,
    Bomb,
}

impl ItemKind {
    fn glyph(&self) -> &'static str {
        match self {
            ItemKind::SmallHeart => "♡",
            ItemKind::MediumHeart => "♥",
            ItemKind::LargeHeart => "❤",
            ItemKind::Bomb => "●",
        }
    }

    fn color(&self) -> Color {
        match self {
            ItemKind::SmallHeart => Color::Rgb(255, 150, 200),
            ItemKind::MediumHeart => Color::Rgb(255, 105, 180),
            ItemKind::LargeHeart => Color::Rgb(255, 20, 147),
            ItemKind::Bomb => Color::Rgb(90, 90, 90),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FallingItem {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub kind: ItemKind,
    pub points: i32,
}

impl FallingItem {
    fn spawn(rng: &mut GameRng) -> Self {
        let (kind, points) = if rng.chance(BOMB_CHANCE) {
            (ItemKind::Bomb, -rng.range_i32(10, 50))
        } else {
            let roll = rng.unit();
            if roll < 0.2 {
                (ItemKind::LargeHeart, 30)
            } else if roll < 0.5 {
                (ItemKind::MediumHeart, 20)
            } else {
                (ItemKind::SmallHeart, 10)
            }
        };
        Self {
            x: rng.range_f32(5.0, 95.0),
            y: -5.0,
            speed: rng.range_f32(1.0, 3.0),
            kind,
            points,
        }
    }

    pub fn is_heart(&self) -> bool {
        self.kind != ItemKind::Bomb
    }

    /// Overlap test against the basket band. Only the position after the
    /// step is checked, so a fast item can pass the band between ticks.
    pub fn in_basket(&self, basket_x: f32) -> bool {
        self.y > BASKET_TOP
            && self.y < BASKET_BOTTOM
            && self.x > basket_x - BASKET_HALF
            && self.x < basket_x + BASKET_HALF
    }
}

impl Animated for FallingItem {
    fn step(&mut self, _rng: &mut GameRng) {
        self.y += self.speed;
    }

    fn expired(&self) -> bool {
        self.y >= 100.0
    }
}

#[derive(Clone, Copy)]
struct Timers {
    spawn: Subscription,
    motion: Subscription,
    countdown: Subscription,
}

pub struct HeartCatch {
    items: Vec<FallingItem>,
    score: u32,
    high_score: u32,
    caught: u32,
    remaining_secs: u32,
    basket_x: f32,
    status: Status,
    clock: TickSource,
    timers: Option<Timers>,
    rng: GameRng,
    field: Rect,
}

impl HeartCatch {
    pub fn new(rng: GameRng) -> Self {
        Self {
            items: Vec::new(),
            score: 0,
            high_score: 0,
            caught: 0,
            remaining_secs: GAME_SECS,
            basket_x: 50.0,
            status: Status::Ready,
            clock: TickSource::new(),
            timers: None,
            rng,
            field: Rect::default(),
        }
    }

    #[cfg(test)]
    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn basket_x(&self) -> f32 {
        self.basket_x
    }

    /// Apply a catch; the score never drops below zero.
    pub fn apply_catch(&mut self, item: &FallingItem, out: &mut Vec<GameEvent>) {
        self.score = (self.score as i64 + item.points as i64).max(0) as u32;
        if item.is_heart() {
            self.caught += 1;
            out.push(GameEvent::EnergyGain(HEART_ENERGY));
            out.push(GameEvent::Sound(Sound::HeartPop));
        }
    }

    #[cfg(test)]
    pub(crate) fn push_item(&mut self, item: FallingItem) {
        self.items.push(item);
    }

    fn step_items(&mut self, out: &mut Vec<GameEvent>) {
        for item in self.items.iter_mut() {
            item.step(&mut self.rng);
        }
        let basket = self.basket_x;
        let mut kept = Vec::with_capacity(self.items.len());
        for item in std::mem::take(&mut self.items) {
            if item.in_basket(basket) {
                self.apply_catch(&item, out);
            } else if !item.expired() {
                kept.push(item);
            }
        }
        self.items = kept;
    }

    fn stop(&mut self) {
        self.clock.dispose_all();
        self.timers = None;
        if self.status == Status::Active {
            self.status = Status::Ended;
        }
        self.high_score = self.high_score.max(self.score);
    }

    fn set_basket(&mut self, x: f32) {
        self.basket_x = x.clamp(BASKET_HALF, 100.0 - BASKET_HALF);
    }

    fn render_field(&self, w: usize, h: usize) -> Vec<Line<'static>> {
        let bg = Color::Rgb(25, 15, 35);
        let mut grid: Vec<Vec<(String, Style)>> =
            vec![vec![(" ".to_string(), Style::default().bg(bg)); w]; h];
        if w == 0 || h == 0 {
            return Vec::new();
        }

        for item in &self.items {
            if item.y < 0.0 {
                continue;
            }
            let cx = ((item.x / 100.0) * w as f32) as usize;
            let cy = ((item.y / 100.0) * h as f32) as usize;
            if cx < w && cy < h {
                grid[cy][cx] = (
                    item.kind.glyph().to_string(),
                    Style::default().fg(item.kind.color()).bg(bg).add_modifier(Modifier::BOLD),
                );
            }
        }

        let by = (((BASKET_TOP + BASKET_BOTTOM) / 2.0 / 100.0) * h as f32) as usize;
        let bx0 = (((self.basket_x() - BASKET_HALF) / 100.0) * w as f32) as usize;
        let bx1 = (((self.basket_x() + BASKET_HALF) / 100.0) * w as f32) as usize;
        if by < h {
            for bx in bx0..bx1.min(w) {
                let ch = if bx == bx0 {
                    "╰"
                } else if bx + 1 >= bx1.min(w) {
                    "╯"
                } else {
                    "═"
                };
                grid[by][bx] = (
                    ch.to_string(),
                    Style::default().fg(Color::Rgb(240, 200, 60)).bg(bg).add_modifier(Modifier::BOLD),
                );
            }
        }

        grid.into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(ch, style)| Span::styled(ch, style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }
}

impl Game for HeartCatch {
    fn id(&self) -> GameId {
        GameId::HeartCatch
    }

    fn start(&mut self) {
        // A restart keeps the best run so far.
        self.high_score = self.high_score.max(self.score);
        self.clock.dispose_all();
        self.items.clear();
        self.score = 0;
        self.caught = 0;
        self.remaining_secs = GAME_SECS;
        self.basket_x = 50.0;
        self.timers = Some(Timers {
            spawn: self.clock.every(SPAWN_MS),
            motion: self.clock.every(MOTION_MS),
            countdown: self.clock.every(1000),
        });
        self.status = Status::Active;
        debug!("heart catch started");
    }

    fn tick(&mut self, dt_ms: u64, out: &mut Vec<GameEvent>) {
        let Some(timers) = self.timers else { return };
        for sub in self.clock.advance(dt_ms) {
            if self.status != Status::Active {
                break;
            }
            if sub == timers.spawn {
                let item = FallingItem::spawn(&mut self.rng);
                self.items.push(item);
            } else if sub == timers.motion {
                self.step_items(out);
            } else if sub == timers.countdown {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 {
                    self.stop();
                    out.push(GameEvent::Ended { score: self.score });
                }
            }
        }
    }

    fn on_action(&mut self, action: UserAction, _out: &mut Vec<GameEvent>) {
        if self.status != Status::Active {
            return;
        }
        match action {
            UserAction::Pointer(x) => self.set_basket(x),
            UserAction::Nudge(dx) => self.set_basket(self.basket_x + dx),
            _ => {}
        }
    }

    fn end(&mut self) {
        self.stop();
    }

    fn handle_key(&mut self, key: KeyEvent, out: &mut Vec<GameEvent>) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.start(),
            KeyCode::Enter | KeyCode::Char(' ') if self.status != Status::Active => self.start(),
            KeyCode::Left => self.on_action(UserAction::Nudge(-NUDGE), out),
            KeyCode::Right => self.on_action(UserAction::Nudge(NUDGE), out),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, out: &mut Vec<GameEvent>) {
        if !matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
            return;
        }
        if self.field.width == 0 || !in_rect(self.field, mouse.column, mouse.row) {
            return;
        }
        let pct = (mouse.column - self.field.x) as f32 / self.field.width as f32 * 100.0;
        self.on_action(UserAction::Pointer(pct), out);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(255, 105, 180)))
            .title(" ♥ Heart Catch ")
            .title_style(Style::default().fg(Color::Rgb(255, 150, 200)).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(6), Constraint::Length(1)])
            .split(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("Time: {}s ", self.remaining_secs()),
                Style::default().fg(Color::Rgb(180, 130, 255)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Caught: {} ", self.caught), Style::default().fg(Color::Rgb(255, 105, 180))),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Best: {} ", self.high_score), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(status), chunks[0]);

        self.field = chunks[1];
        let lines = self.render_field(chunks[1].width as usize, chunks[1].height as usize);
        frame.render_widget(Paragraph::new(lines), chunks[1]);

        let help = if self.status == Status::Ended {
            Line::from(vec![
                Span::styled(" ⏰ TIME UP! ", Style::default().fg(Color::Rgb(255, 105, 180)).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("Score: {} │ ENTER play again, Esc menu", self.score),
                    Style::default().fg(Color::Gray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(" Mouse / ←→ Move basket ", Style::default().fg(Color::DarkGray)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("R Restart ", Style::default().fg(Color::DarkGray)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("Esc Menu", Style::default().fg(Color::DarkGray)),
            ])
        };
        frame.render_widget(Paragraph::new(help), chunks[2]);
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

    fn heart(kind: ItemKind, points: i32, x: f32, y: f32) -> FallingItem {
        FallingItem { x, y, speed: 2.0, kind, points }
    }

    fn started() -> HeartCatch {
        let mut g = HeartCatch::new(GameRng::seeded(42));
        g.start();
        g
    }

    #[test]
    fn large_heart_from_zero() {
        let mut g = started();
        let mut out = Vec::new();
        g.apply_catch(&heart(ItemKind::LargeHeart, 30, 50.0, 90.0), &mut out);
        assert_eq!(g.score(), 30);
        assert_eq!(out[0], GameEvent::EnergyGain(5));
    }

    #[test]
    fn bomb_clamps_at_zero() {
        let mut g = started();
        let mut out = Vec::new();
        g.apply_catch(&heart(ItemKind::MediumHeart, 20, 50.0, 90.0), &mut out);
        out.clear();
        g.apply_catch(&heart(ItemKind::Bomb, -50, 50.0, 90.0), &mut out);
        assert_eq!(g.score(), 0);
        assert!(out.is_empty(), "bombs never give energy");
    }

    #[test]
    fn item_moves_then_scores_in_same_tick() {
        let mut g = started();
        g.push_item(heart(ItemKind::SmallHeart, 10, 50.0, 84.0));
        let mut out = Vec::new();
        g.tick(MOTION_MS, &mut out);
        assert_eq!(g.score(), 10);
        assert!(g.items().is_empty());
        assert!(out.contains(&GameEvent::EnergyGain(5)));
    }

    #[test]
    fn items_outside_basket_fall_off() {
        let mut g = started();
        g.push_item(heart(ItemKind::SmallHeart, 10, 5.0, 99.0));
        let mut out = Vec::new();
        g.tick(MOTION_MS, &mut out);
        assert!(g.items().is_empty());
        assert_eq!(g.score(), 0);
    }

    #[test]
    fn spawn_split_is_roughly_right() {
        let mut rng = GameRng::seeded(9);
        let mut bombs = 0;
        let mut large = 0;
        let n = 10_000;
        for _ in 0..n {
            let item = FallingItem::spawn(&mut rng);
            match item.kind {
                ItemKind::Bomb => {
                    bombs += 1;
                    assert!((-50..=-10).contains(&item.points));
                }
                ItemKind::LargeHeart => {
                    large += 1;
                    assert_eq!(item.points, 30);
                }
                ItemKind::MediumHeart => assert_eq!(item.points, 20),
                ItemKind::SmallHeart => assert_eq!(item.points, 10),
            }
        }
        assert!((1200..1800).contains(&bombs));
        // 20% of the 85% that are hearts
        assert!((1400..2000).contains(&large));
    }

    #[test]
    fn same_seed_same_spawns() {
        let mut a = GameRng::seeded(77);
        let mut b = GameRng::seeded(77);
        for _ in 0..50 {
            assert_eq!(FallingItem::spawn(&mut a).kind, FallingItem::spawn(&mut b).kind);
        }
    }

    #[test]
    fn countdown_ends_and_silences_timers() {
        let mut g = started();
        let mut out = Vec::new();
        for _ in 0..(GAME_SECS * 1000 / 100) {
            g.tick(100, &mut out);
        }
        assert_eq!(g.status(), Status::Ended);
        assert_eq!(g.remaining_secs(), 0);
        assert_eq!(out.iter().filter(|e| matches!(e, GameEvent::Ended { .. })).count(), 1);

        let frozen = g.items().len();
        out.clear();
        g.tick(10_000, &mut out);
        assert!(out.is_empty());
        assert_eq!(g.items().len(), frozen);
    }

    #[test]
    fn basket_is_clamped() {
        let mut g = started();
        let mut out = Vec::new();
        g.on_action(UserAction::Pointer(0.0), &mut out);
        assert_eq!(g.basket_x(), 8.0);
        g.on_action(UserAction::Nudge(500.0), &mut out);
        assert_eq!(g.basket_x(), 92.0);
    }

    #[test]
    fn restart_resets_state() {
        let mut g = started();
        let mut out = Vec::new();
        g.apply_catch(&heart(ItemKind::LargeHeart, 30, 50.0, 90.0), &mut out);
        g.end();
        g.start();
        assert_eq!(g.score(), 0);
        assert_eq!(g.remaining_secs(), GAME_SECS);
        assert_eq!(g.status(), Status::Active);
    }

    #[test]
    fn restart_keeps_best_run() {
        let mut g = started();
        let mut out = Vec::new();
        g.apply_catch(&heart(ItemKind::MediumHeart, 20, 50.0, 90.0), &mut out);
        g.handle_key(KeyEvent::from(KeyCode::Char('r')), &mut out);
        assert_eq!(g.score(), 0);
        assert_eq!(g.high_score(), 20);
    }
}
