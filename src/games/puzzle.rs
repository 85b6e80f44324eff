use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tracing::debug;

use crate::audio::Sound;
use crate::games::{in_rect, Game, GameEvent, GameId, Status, UserAction};
use crate::rng::GameRng;

const SIDE: usize = 3;
const PIECES: usize = SIDE * SIDE;
const GLYPHS: [&str; PIECES] = ["♥", "♡", "❣", "✿", "★", "♦", "☀", "♪", "❀"];
const SOLVE_ENERGY: u32 = 30;

/// Score for solving in `moves` swaps: 1000 minus 10 per move, floored at 100.
pub fn completion_score(moves: u32) -> u32 {
    1000u32.saturating_sub(moves.saturating_mul(10)).max(100)
}

#[derive(Clone, Debug)]
pub struct Piece {
    pub id: usize,
    pub current: usize,
    pub correct: usize,
}

impl Piece {
    pub fn in_place(&self) -> bool {
        self.current == self.correct
    }
}

pub struct SlidingPuzzle {
    pieces: Vec<Piece>,
    selected: Option<usize>,
    moves: u32,
    score: u32,
    high_score: u32,
    status: Status,
    rng: GameRng,
    cursor: usize,
    cells: Vec<Rect>,
}

impl SlidingPuzzle {
    pub fn new(rng: GameRng) -> Self {
        Self {
            pieces: Vec::new(),
            selected: None,
            moves: 0,
            score: 0,
            high_score: 0,
            status: Status::Ready,
            rng,
            cursor: 0,
            cells: Vec::new(),
        }
    }

    fn shuffle(&mut self) {
        let mut slots: Vec<usize> = (0..PIECES).collect();
        // A solved board is no puzzle; draw again.
        while slots.iter().enumerate().all(|(i, s)| i == *s) {
            self.rng.shuffle(&mut slots);
        }
        self.pieces = slots
            .into_iter()
            .enumerate()
            .map(|(id, current)| Piece { id, current, correct: id })
            .collect();
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn piece_at(&self, position: usize) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.current == position)
    }

    pub fn is_solved(&self) -> bool {
        self.pieces.iter().all(Piece::in_place)
    }

    fn select(&mut self, position: usize, out: &mut Vec<GameEvent>) {
        if self.status != Status::Active {
            return;
        }
        let Some(id) = self.piece_at(position).map(|p| p.id) else { return };
        match self.selected {
            None => self.selected = Some(id),
            Some(first) if first == id => self.selected = None,
            Some(first) => {
                let a = self.pieces[first].current;
                let b = self.pieces[id].current;
                self.pieces[first].current = b;
                self.pieces[id].current = a;
                self.moves += 1;
                self.selected = None;
                self.check_completion(out);
            }
        }
    }

    fn check_completion(&mut self, out: &mut Vec<GameEvent>) {
        if self.status != Status::Active || !self.is_solved() {
            return;
        }
        self.score = completion_score(self.moves);
        self.high_score = self.high_score.max(self.score);
        self.status = Status::Ended;
        out.push(GameEvent::EnergyGain(SOLVE_ENERGY));
        out.push(GameEvent::Sound(Sound::Fanfare));
        out.push(GameEvent::Ended { score: self.score });
        debug!(moves = self.moves, score = self.score, "puzzle solved");
    }

    fn tile(&self, position: usize) -> Paragraph<'static> {
        let Some(piece) = self.piece_at(position) else {
            return Paragraph::new("");
        };
        let is_selected = self.selected() == Some(piece.id);
        let under_cursor = position == self.cursor && self.status == Status::Active;
        let border = if is_selected {
            Color::Rgb(255, 220, 80)
        } else if piece.in_place() {
            Color::Rgb(80, 220, 120)
        } else if under_cursor {
            Color::Rgb(255, 255, 255)
        } else {
            Color::Rgb(160, 80, 120)
        };
        Paragraph::new(vec![
            Line::from(Span::styled(
                GLYPHS[piece.id],
                Style::default().fg(Color::Rgb(255, 105, 180)).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{}", piece.id + 1),
                Style::default().fg(Color::Rgb(200, 200, 220)),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(if under_cursor || is_selected { BorderType::Double } else { BorderType::Rounded })
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(Color::Rgb(40, 15, 30))),
        )
    }
}

impl Game for SlidingPuzzle {
    fn id(&self) -> GameId {
        GameId::Puzzle
    }

    fn start(&mut self) {
        self.high_score = self.high_score.max(self.score);
        self.shuffle();
        self.selected = None;
        self.moves = 0;
        self.score = 0;
        self.cursor = 0;
        self.status = Status::Active;
    }

    // Move-counted: nothing runs on the clock.
    fn tick(&mut self, _dt_ms: u64, _out: &mut Vec<GameEvent>) {}

    fn on_action(&mut self, action: UserAction, out: &mut Vec<GameEvent>) {
        if let UserAction::Select(position) = action {
            self.select(position, out);
        }
    }

    fn end(&mut self) {
        self.selected = None;
        if self.status == Status::Active {
            self.status = Status::Ended;
        }
    }

    fn handle_key(&mut self, key: KeyEvent, out: &mut Vec<GameEvent>) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Char('s') | KeyCode::Char('S') => self.start(),
            KeyCode::Enter if self.status != Status::Active => self.start(),
            KeyCode::Left => self.cursor = (self.cursor + PIECES - 1) % PIECES,
            KeyCode::Right => self.cursor = (self.cursor + 1) % PIECES,
            KeyCode::Up => self.cursor = (self.cursor + PIECES - SIDE) % PIECES,
            KeyCode::Down => self.cursor = (self.cursor + SIDE) % PIECES,
            KeyCode::Enter | KeyCode::Char(' ') => self.on_action(UserAction::Select(self.cursor), out),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, out: &mut Vec<GameEvent>) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if let Some(pos) = self.cells.iter().position(|r| in_rect(*r, mouse.column, mouse.row)) {
            self.cursor = pos;
            self.on_action(UserAction::Select(pos), out);
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(240, 80, 120)))
            .title(" ❀ Love Puzzle ")
            .title_style(Style::default().fg(Color::Rgb(255, 120, 150)).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(9), Constraint::Length(1)])
            .split(inner);

        let in_place = self.pieces().iter().filter(|p| p.in_place()).count();
        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Moves: {} ", self.moves()), Style::default().fg(Color::Rgb(240, 80, 120))),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("In place: {}/{} ", in_place, PIECES), Style::default().fg(Color::Green)),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Best: {} ", self.high_score), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(status), chunks[0]);

        let board_w = chunks[1].width.min(chunks[1].height * 3);
        let board = Rect::new(
            chunks[1].x + (chunks[1].width - board_w) / 2,
            chunks[1].y,
            board_w,
            chunks[1].height,
        );
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, 3); SIDE])
            .split(board);
        self.cells.clear();
        for row in rows.iter() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 3); SIDE])
                .split(*row);
            self.cells.extend(cols.iter().copied());
        }
        for pos in 0..PIECES {
            if let Some(cell) = self.cells.get(pos).copied() {
                frame.render_widget(self.tile(pos), cell);
            }
        }

        let help = if self.status == Status::Ended {
            Line::from(vec![
                Span::styled(" 🧩 SOLVED! ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("Score: {} in {} moves │ ENTER play again, Esc menu", self.score, self.moves()),
                    Style::default().fg(Color::Gray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(" ←↑↓→ Move ", Style::default().fg(Color::DarkGray)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("SPACE/Click Select & swap ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
                Span::styled("S Shuffle ", Style::default().fg(Color::DarkGray)),
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

    fn started(seed: u64) -> SlidingPuzzle {
        let mut g = SlidingPuzzle::new(GameRng::seeded(seed));
        g.start();
        g
    }

    /// Put every piece home with at most eight swaps.
    fn solve(g: &mut SlidingPuzzle, out: &mut Vec<GameEvent>) {
        for pos in 0..PIECES {
            let here = g.piece_at(pos).unwrap().id;
            if here == pos {
                continue;
            }
            let home = g.pieces()[pos].current;
            g.on_action(UserAction::Select(pos), out);
            g.on_action(UserAction::Select(home), out);
        }
    }

    #[test]
    fn score_formula() {
        assert_eq!(completion_score(0), 1000);
        assert_eq!(completion_score(10), 900);
        assert_eq!(completion_score(90), 100);
        assert_eq!(completion_score(100), 100);
        assert_eq!(completion_score(u32::MAX), 100);
    }

    #[test]
    fn shuffle_is_a_permutation_and_never_solved() {
        for seed in 0..100 {
            let g = started(seed);
            let mut seen: Vec<usize> = g.pieces().iter().map(|p| p.current).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..PIECES).collect::<Vec<_>>());
            assert!(!g.is_solved());
        }
    }

    #[test]
    fn selecting_twice_deselects() {
        let mut g = started(1);
        let mut out = Vec::new();
        g.on_action(UserAction::Select(4), &mut out);
        assert!(g.selected().is_some());
        g.on_action(UserAction::Select(4), &mut out);
        assert_eq!(g.selected(), None);
        assert_eq!(g.moves(), 0);
    }

    #[test]
    fn swap_exchanges_positions() {
        let mut g = started(2);
        let mut out = Vec::new();
        let a = g.piece_at(0).unwrap().id;
        let b = g.piece_at(8).unwrap().id;
        g.on_action(UserAction::Select(0), &mut out);
        g.on_action(UserAction::Select(8), &mut out);
        assert_eq!(g.piece_at(0).unwrap().id, b);
        assert_eq!(g.piece_at(8).unwrap().id, a);
        assert_eq!(g.moves(), 1);
    }

    #[test]
    fn solving_completes_exactly_once() {
        for seed in 0..20 {
            let mut g = started(seed);
            let mut out = Vec::new();
            solve(&mut g, &mut out);
            assert!(g.is_solved());
            assert_eq!(g.status(), Status::Ended);
            assert_eq!(g.score(), completion_score(g.moves()));
            assert_eq!(out.iter().filter(|e| **e == GameEvent::EnergyGain(30)).count(), 1);

            // further clicks after completion change nothing
            let moves = g.moves();
            g.on_action(UserAction::Select(0), &mut out);
            g.on_action(UserAction::Select(1), &mut out);
            assert_eq!(g.moves(), moves);
            assert!(g.is_solved());
        }
    }
}
