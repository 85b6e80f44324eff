use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::games::{in_rect, GameId};
use crate::shell::{Phase, Shell};

// Longest step fed to the simulation, so a stalled terminal does not
// fast-forward a whole game on resume.
const MAX_STEP_MS: u64 = 100;

pub struct App {
    pub should_quit: bool,
    pub shell: Shell,
    pub selected_game: usize, // 0-3 on the menu, 2x2 grid
    pub menu_tiles: Vec<Rect>,
    last_tick: Instant,
}

impl App {
    pub fn new(shell: Shell) -> Self {
        Self {
            should_quit: false,
            shell,
            selected_game: 0,
            menu_tiles: Vec::new(),
            last_tick: Instant::now(),
        }
    }

    pub fn on_tick(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_millis() as u64;
        self.last_tick = now;
        self.shell.tick(dt.min(MAX_STEP_MS));
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.shell.reset();
            self.selected_game = 0;
            return;
        }

        match self.shell.phase() {
            Phase::Idle => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.shell.open_gift(),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            Phase::GiftOpening => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                    self.should_quit = true;
                }
            }
            Phase::MessageShowing => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.shell.play_now(),
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {}
            },
            Phase::GameMenu => self.on_menu_key(key),
            Phase::Instructions(_) => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.shell.confirm_start(),
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => self.shell.close_instructions(),
                _ => {}
            },
            Phase::GameActive(_) => match key.code {
                KeyCode::Esc => self.shell.close_game(),
                _ => self.shell.game_key(key),
            },
            Phase::FinalMessage => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.shell.dismiss_final();
                }
            }
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent) {
        let n = GameId::all().len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.selected_game = idx;
                if let Some(id) = GameId::from_index(idx) {
                    self.shell.start_game(id);
                }
            }
            KeyCode::Right => self.selected_game = (self.selected_game + 1) % n,
            KeyCode::Left => self.selected_game = (self.selected_game + n - 1) % n,
            KeyCode::Up | KeyCode::Down => self.selected_game = (self.selected_game + 2) % n,
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = GameId::from_index(self.selected_game) {
                    self.shell.start_game(id);
                }
            }
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        let click = mouse.kind == MouseEventKind::Down(MouseButton::Left);
        match self.shell.phase() {
            Phase::Idle if click => self.shell.open_gift(),
            Phase::MessageShowing if click => self.shell.play_now(),
            Phase::GameMenu if click => {
                let hit = self
                    .menu_tiles
                    .iter()
                    .position(|r| in_rect(*r, mouse.column, mouse.row));
                if let Some(id) = hit.and_then(GameId::from_index) {
                    self.selected_game = id.index();
                    self.shell.start_game(id);
                }
            }
            Phase::Instructions(_) if click => self.shell.confirm_start(),
            Phase::GameActive(_) => self.shell.game_mouse(mouse),
            Phase::FinalMessage if click => self.shell.dismiss_final(),
            _ => {}
        }
    }
}
