use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use greedy_snake::render::draw;
use greedy_snake::{Coord, Direction, GameConfig, Session, StepInput};

#[derive(Parser)]
#[command(name = "greedy-snake")]
#[command(version, about = "Snake with three kinds of food and three lives")]
struct Cli {
    /// JSON file with board and pacing settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board width in board units
    #[arg(long)]
    width: Option<Coord>,

    /// Board height in board units
    #[arg(long)]
    height: Option<Coord>,

    /// Cell pitch in board units
    #[arg(long)]
    block: Option<Coord>,

    /// Base speed in ticks per second
    #[arg(long)]
    speed: Option<u32>,

    /// Seed for reproducible food placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write log records here (level from RUST_LOG, default info)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Config file first, then any flags on top.
    fn game_config(&self) -> Result<GameConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => GameConfig::default(),
        };
        if let Some(width) = self.width {
            cfg.width = width;
        }
        if let Some(height) = self.height {
            cfg.height = height;
        }
        if let Some(block) = self.block {
            cfg.block = block;
        }
        if let Some(speed) = self.speed {
            cfg.base_speed = speed;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let cfg = cli.game_config()?;
    let session = match cli.seed {
        Some(seed) => Session::with_seed(cfg, seed),
        None => Session::new(cfg),
    }
    .context("Invalid game configuration")?;

    // --- Init terminal ---
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    terminal.clear().context("Failed to clear terminal")?;

    let res = run(&mut terminal, session);

    // --- Restore terminal even on error ---
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    res
}

/// The screen belongs to the game, so logs only go to a file when asked for.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("Failed to initialise logger")?;
    Ok(())
}

fn tick_interval(speed: u32) -> Duration {
    Duration::from_secs(1) / speed.max(1)
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut session: Session) -> Result<()> {
    let mut frame = session.snapshot();
    let mut input = StepInput::default();
    let mut last_tick = Instant::now();

    loop {
        // --- Input (non-blocking) ---
        let tick_rate = tick_interval(frame.speed);
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout).context("Failed to poll for input")? {
            if let Event::Key(key) = event::read().context("Failed to read input")? {
                if key.kind == KeyEventKind::Press && handle_key(&mut input, key) {
                    break; // requested quit
                }
            }
        }

        // --- Tick ---
        if last_tick.elapsed() >= tick_rate {
            frame = session.step(std::mem::take(&mut input));
            last_tick = Instant::now();
        }

        // --- Render ---
        terminal
            .draw(|f| draw(f, &frame))
            .context("Failed to draw frame")?;
    }

    Ok(())
}

/// Fold a key press into the input for the next step.
/// Returns true if the caller should quit.
fn handle_key(input: &mut StepInput, key: KeyEvent) -> bool {
    match key.code {
        // Quit keys
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,

        // Vim movement (k/j/h/l) and arrows
        KeyCode::Char('k') | KeyCode::Up => input.direction = Some(Direction::Up),
        KeyCode::Char('j') | KeyCode::Down => input.direction = Some(Direction::Down),
        KeyCode::Char('h') | KeyCode::Left => input.direction = Some(Direction::Left),
        KeyCode::Char('l') | KeyCode::Right => input.direction = Some(Direction::Right),

        // Two presses within one tick cancel out.
        KeyCode::Char(' ') => input.pause = !input.pause,
        KeyCode::Char('r') | KeyCode::Char('R') => input.restart = true,

        _ => {}
    }
    false
}
