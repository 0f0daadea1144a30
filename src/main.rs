use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flowstate::{
    app::{App, Command},
    config::{parse_duration, Preset},
    input::handle_input,
    notify::DesktopNotifier,
    store::Store,
    ui::{render_ui, ViewState},
};
use ratatui::prelude::*;
use std::{fs, io, path::PathBuf, sync::Mutex, time::{Duration, Instant}};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const TICK_RATE: Duration = Duration::from_millis(100);
const ROLLOVER_INTERVAL: Duration = Duration::from_secs(60);
const LOG_FILE: &str = "flowstate.log";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Clone)]
#[command(author, version, about = "🍅 flowstate - Pomodoro timer with tasks and weekly stats")]
struct Args {
    /// Work duration, e.g. 25m or 1h
    #[arg(short, long, value_parser = parse_duration)]
    work: Option<f64>,
    /// Break duration, e.g. 5m
    #[arg(short, long, value_parser = parse_duration)]
    rest: Option<f64>,
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,
    /// Where settings, tasks and statistics are kept
    #[arg(long, default_value = "flowstate")]
    data_dir: PathBuf,
    #[arg(long)]
    no_sound: bool,
    #[arg(long)]
    no_notify: bool,
    #[arg(long)]
    dark: bool,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let store = Store::open(&args.data_dir)?;
    init_logging(&store)?;

    let notifier = DesktopNotifier {
        desktop: !args.no_notify,
        sound: !args.no_sound,
    };
    let mut app = App::load(store, Box::new(notifier), chrono::Local::now());
    apply_overrides(&args, &mut app);
    info!(data_dir = %args.data_dir.display(), "flowstate started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

/// CLI flags override stored settings and are persisted like any other change.
fn apply_overrides(args: &Args, app: &mut App) {
    let now = chrono::Local::now();
    if let Some(preset) = args.preset {
        app.dispatch(Command::ApplyPreset(preset), now);
    }
    if let Some(w) = args.work {
        app.dispatch(Command::SetWorkMinutes(w.round() as u32), now);
    }
    if let Some(r) = args.rest {
        app.dispatch(Command::SetBreakMinutes(r.round() as u32), now);
    }
    if args.dark && !app.dark_mode() {
        app.dispatch(Command::ToggleDarkMode, now);
    }
}

/// The terminal belongs to the UI, so logs go to a file in the data directory.
fn init_logging(store: &Store) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(store.root().join(LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FLOWSTATE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut view = ViewState::default();
    let mut last_tick = Instant::now();
    let mut last_rollover = Instant::now();

    loop {
        terminal.draw(|f| render_ui(f, app, &view, chrono::Local::now()))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && handle_input(key, app, &mut view, chrono::Local::now())
                {
                    info!("flowstate exiting");
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.tick(chrono::Local::now());
            view.advance_animation();
            last_tick = Instant::now();
        }

        if last_rollover.elapsed() >= ROLLOVER_INTERVAL {
            app.check_date_rollover(chrono::Local::now());
            last_rollover = Instant::now();
        }
    }
}
