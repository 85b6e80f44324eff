use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tracing::debug;

use crate::audio::Sound;
use crate::games::{in_rect, Game, GameEvent, GameId, Status, UserAction};
use crate::rng::GameRng;
use crate::scheduler::{Subscription, TickSource};

pub const SYMBOLS: [&str; 8] = ["♥", "♡", "❣", "✿", "★", "♦", "☀", "♪"];
const COLS: usize = 4;
const FLIP_BACK_MS: u64 = 1000;
const PAIR_POINTS: u32 = 100;
const PAIR_ENERGY: u32 = 10;
const CLEAR_BONUS_ENERGY: u32 = 50;

#[derive(Clone, Debug)]
pub struct Card {
    pub symbol: usize,
    pub flipped: bool,
    pub matched: bool,
}

pub struct MemoryMatch {
    cards: Vec<Card>,
    face_up: Vec<usize>,
    score: u32,
    high_score: u32,
    moves: u32,
    status: Status,
    clock: TickSource,
    resolve: Option<Subscription>,
    rng: GameRng,
    cursor: usize,
    cells: Vec<Rect>,
}

impl MemoryMatch {
    pub fn new(rng: GameRng) -> Self {
        Self {
            cards: Vec::new(),
            face_up: Vec::with_capacity(2),
            score: 0,
            high_score: 0,
            moves: 0,
            status: Status::Ready,
            clock: TickSource::new(),
            resolve: None,
            rng,
            cursor: 0,
            cells: Vec::new(),
        }
    }

    fn deal(&mut self) {
        let mut deck: Vec<usize> = (0..SYMBOLS.len()).chain(0..SYMBOLS.len()).collect();
        self.rng.shuffle(&mut deck);
        self.cards = deck
            .into_iter()
            .map(|symbol| Card { symbol, flipped: false, matched: false })
            .collect();
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count()
    }

    fn select(&mut self, idx: usize) {
        if self.status != Status::Active || self.face_up.len() == 2 {
            return;
        }
        let Some(card) = self.cards.get_mut(idx) else { return };
        if card.matched || self.face_up.contains(&idx) {
            return;
        }
        card.flipped = true;
        self.face_up.push(idx);
        if self.face_up.len() == 2 {
            self.moves += 1;
            self.resolve = Some(self.clock.once(FLIP_BACK_MS));
        }
    }

    fn resolve_pair(&mut self, out: &mut Vec<GameEvent>) {
        self.resolve = None;
        let [a, b] = [self.face_up[0], self.face_up[1]];
        self.face_up.clear();

        if self.cards[a].symbol != self.cards[b].symbol {
            self.cards[a].flipped = false;
            self.cards[b].flipped = false;
            return;
        }

        self.cards[a].matched = true;
        self.cards[b].matched = true;
        self.score += PAIR_POINTS;
        out.push(GameEvent::EnergyGain(PAIR_ENERGY));
        out.push(GameEvent::Sound(Sound::HeartPop));

        if self.matched_count() == self.cards.len() {
            out.push(GameEvent::EnergyGain(CLEAR_BONUS_ENERGY));
            out.push(GameEvent::Sound(Sound::Fanfare));
            self.stop();
            out.push(GameEvent::Ended { score: self.score });
            debug!(moves = self.moves, "memory board cleared");
        }
    }

    fn stop(&mut self) {
        self.clock.dispose_all();
        self.resolve = None;
        if self.status == Status::Active {
            self.status = Status::Ended;
        }
        self.high_score = self.high_score.max(self.score);
    }

    fn card_cell(&self, idx: usize, card: &Card) -> Paragraph<'static> {
        let selected = idx == self.cursor && self.status == Status::Active;
        let (text, fg, bg) = if card.matched {
            (SYMBOLS[card.symbol], Color::Rgb(120, 230, 140), Color::Rgb(20, 60, 30))
        } else if card.flipped {
            (SYMBOLS[card.symbol], Color::Rgb(255, 105, 180), Color::Rgb(60, 20, 50))
        } else {
            ("?", Color::Rgb(200, 180, 255), Color::Rgb(50, 30, 90))
        };
        let border = if selected { Color::Rgb(255, 220, 80) } else { Color::Rgb(90, 70, 140) };
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(fg).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(if selected { BorderType::Double } else { BorderType::Rounded })
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(bg)),
        )
    }
}

impl Game for MemoryMatch {
    fn id(&self) -> GameId {
        GameId::Memory
    }

    fn start(&mut self) {
        self.high_score = self.high_score.max(self.score);
        self.clock.dispose_all();
        self.resolve = None;
        self.face_up.clear();
        self.deal();
        self.score = 0;
        self.moves = 0;
        self.cursor = 0;
        self.status = Status::Active;
    }

    fn tick(&mut self, dt_ms: u64, out: &mut Vec<GameEvent>) {
        for sub in self.clock.advance(dt_ms) {
            if self.status != Status::Active {
                break;
            }
            if Some(sub) == self.resolve {
                self.resolve_pair(out);
            }
        }
    }

    fn on_action(&mut self, action: UserAction, _out: &mut Vec<GameEvent>) {
        if let UserAction::Select(idx) = action {
            self.select(idx);
        }
    }

    fn end(&mut self) {
        self.stop();
    }

    fn handle_key(&mut self, key: KeyEvent, out: &mut Vec<GameEvent>) {
        let n = self.cards.len().max(1);
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.start(),
            KeyCode::Enter if self.status != Status::Active => self.start(),
            KeyCode::Left => self.cursor = (self.cursor + n - 1) % n,
            KeyCode::Right => self.cursor = (self.cursor + 1) % n,
            KeyCode::Up => self.cursor = (self.cursor + n - COLS) % n,
            KeyCode::Down => self.cursor = (self.cursor + COLS) % n,
            KeyCode::Enter | KeyCode::Char(' ') => self.on_action(UserAction::Select(self.cursor), out),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, out: &mut Vec<GameEvent>) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if let Some(idx) = self.cells.iter().position(|r| in_rect(*r, mouse.column, mouse.row)) {
            self.cursor = idx;
            self.on_action(UserAction::Select(idx), out);
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(150, 100, 255)))
            .title(" ✿ Love Memory ")
            .title_style(Style::default().fg(Color::Rgb(190, 150, 255)).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(8), Constraint::Length(1)])
            .split(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Moves: {} ", self.moves()), Style::default().fg(Color::Rgb(150, 100, 255))),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("Pairs: {}/{} ", self.matched_count() / 2, SYMBOLS.len()),
                Style::default().fg(Color::Green),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Best: {} ", self.high_score), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(status), chunks[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(chunks[1]);
        self.cells.clear();
        for row in rows.iter() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 4); COLS])
                .split(*row);
            self.cells.extend(cols.iter().copied());
        }
        for (idx, card) in self.cards().iter().enumerate() {
            if let Some(cell) = self.cells.get(idx) {
                frame.render_widget(self.card_cell(idx, card), *cell);
            }
        }

        let help = if self.status == Status::Ended {
            Line::from(vec![
                Span::styled(" 🎉 ALL PAIRS FOUND! ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("{} moves │ ENTER play again, Esc menu", self.moves()),
                    Style::default().fg(Color::Gray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(" ←↑↓→ Move ", Style::default().fg(Color::DarkGray)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("SPACE/Click Flip ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
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

    fn started(seed: u64) -> MemoryMatch {
        let mut g = MemoryMatch::new(GameRng::seeded(seed));
        g.start();
        g
    }

    fn partner_of(g: &MemoryMatch, idx: usize) -> usize {
        let sym = g.cards()[idx].symbol;
        (0..g.cards().len())
            .find(|&j| j != idx && g.cards()[j].symbol == sym)
            .expect("every card has a partner")
    }

    fn mismatch_of(g: &MemoryMatch, idx: usize) -> usize {
        let sym = g.cards()[idx].symbol;
        (0..g.cards().len())
            .find(|&j| g.cards()[j].symbol != sym)
            .expect("deck has more than one symbol")
    }

    #[test]
    fn every_shuffle_has_eight_pairs() {
        for seed in 0..50 {
            let g = started(seed);
            assert_eq!(g.cards().len(), 16);
            for sym in 0..SYMBOLS.len() {
                assert_eq!(g.cards().iter().filter(|c| c.symbol == sym).count(), 2);
            }
        }
    }

    #[test]
    fn match_scores_after_delay() {
        let mut g = started(1);
        let mut out = Vec::new();
        let b = partner_of(&g, 0);
        g.on_action(UserAction::Select(0), &mut out);
        g.on_action(UserAction::Select(b), &mut out);
        assert_eq!(g.moves(), 1);
        g.tick(999, &mut out);
        assert_eq!(g.score(), 0);
        g.tick(1, &mut out);
        assert_eq!(g.score(), 100);
        assert!(out.contains(&GameEvent::EnergyGain(10)));
        assert!(g.cards()[0].matched && g.cards()[b].matched);
    }

    #[test]
    fn mismatch_flips_back() {
        let mut g = started(2);
        let mut out = Vec::new();
        let b = mismatch_of(&g, 0);
        g.on_action(UserAction::Select(0), &mut out);
        g.on_action(UserAction::Select(b), &mut out);
        g.tick(FLIP_BACK_MS, &mut out);
        assert!(!g.cards()[0].flipped && !g.cards()[b].flipped);
        assert_eq!(g.score(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn third_card_ignored_while_pair_pending() {
        let mut g = started(3);
        let mut out = Vec::new();
        let b = mismatch_of(&g, 0);
        let c = (0..16).find(|&j| j != 0 && j != b).unwrap();
        g.on_action(UserAction::Select(0), &mut out);
        g.on_action(UserAction::Select(b), &mut out);
        g.on_action(UserAction::Select(c), &mut out);
        assert!(!g.cards()[c].flipped);
        assert_eq!(g.moves(), 1);
    }

    #[test]
    fn same_card_twice_is_ignored() {
        let mut g = started(4);
        let mut out = Vec::new();
        g.on_action(UserAction::Select(5), &mut out);
        g.on_action(UserAction::Select(5), &mut out);
        assert_eq!(g.moves(), 0);
        g.tick(5000, &mut out);
        assert!(g.cards()[5].flipped, "a lone card stays face up");
    }

    #[test]
    fn clearing_the_board_completes_once() {
        let mut g = started(5);
        let mut out = Vec::new();
        for i in 0..16 {
            if g.cards()[i].matched {
                continue;
            }
            let j = partner_of(&g, i);
            g.on_action(UserAction::Select(i), &mut out);
            g.on_action(UserAction::Select(j), &mut out);
            assert_eq!(g.status(), Status::Active, "not done before the last pair resolves");
            g.tick(FLIP_BACK_MS, &mut out);
        }
        assert_eq!(g.matched_count(), 16);
        assert_eq!(g.status(), Status::Ended);
        assert_eq!(g.score(), 800);
        let energy: u32 = out
            .iter()
            .filter_map(|e| match e {
                GameEvent::EnergyGain(n) => Some(*n),
                _ => None,
            })
            .sum();
        assert_eq!(energy, 8 * 10 + 50);
        assert_eq!(out.iter().filter(|e| matches!(e, GameEvent::Ended { .. })).count(), 1);

        // matched cards are dead input
        g.on_action(UserAction::Select(0), &mut out);
        assert_eq!(g.moves(), 8);
    }

    #[test]
    fn closing_mid_pair_drops_pending_resolution() {
        let mut g = started(6);
        let mut out = Vec::new();
        let b = partner_of(&g, 0);
        g.on_action(UserAction::Select(0), &mut out);
        g.on_action(UserAction::Select(b), &mut out);
        g.end();
        g.tick(FLIP_BACK_MS * 2, &mut out);
        assert_eq!(g.score(), 0);
        assert!(out.is_empty());
    }
}
