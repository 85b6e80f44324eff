mod animator;
mod app;
mod audio;
mod cli;
mod config;
mod energy;
mod error;
mod event;
mod games;
mod logging;
mod rng;
mod scheduler;
mod shell;
mod typewriter;
mod ui;

use std::io;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tracing::{error, info};

use app::App;
use audio::{AudioSink, Muted, TerminalBell};
use cli::Cli;
use config::Config;
use error::AppError;
use event::{Event, EventHandler};
use rng::GameRng;
use shell::Shell;

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = Config::load(&config_path)?.with_cli(&cli);
    let _guard = logging::init(&cfg.log_path())?;
    info!(config = %config_path.display(), seed = ?cfg.seed, tick_ms = cfg.tick_ms, "starting giftbox");

    let audio: Box<dyn AudioSink> = if cfg.audio {
        Box::new(TerminalBell::stdout())
    } else {
        Box::new(Muted)
    };
    let shell = Shell::new(cfg.settings(), GameRng::from_config(cfg.seed), audio);
    let mut app = App::new(shell);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let event_handler = EventHandler::new(cfg.tick_ms);
    let result = run(&mut terminal, &mut app, &event_handler);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!(energy = app.shell.energy().value(), "exiting"),
        Err(err) => error!(%err, "main loop failed"),
    }
    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &EventHandler,
) -> Result<(), AppError> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next()? {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.on_key(key),
            Event::Mouse(mouse) => app.on_mouse(mouse),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
