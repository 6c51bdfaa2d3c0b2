mod app;
mod config;
mod git;
mod tracking;
mod ui;
mod watch;

use anyhow::{Context, Result};
use app::{App, Options, PollChange};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use watch::{FileWatcher, WatchEvent};

/// Browse a branch's commits grouped by the reasoning behind each change
#[derive(Parser)]
#[command(name = "codewalk", version, about)]
struct Cli {
    /// Repository path (defaults to current directory)
    path: Option<String>,

    /// Read tracking files from this directory instead of the configured one
    #[arg(long)]
    tracking_dir: Option<PathBuf>,

    /// Compare against this base ref instead of auto-detecting it
    #[arg(long)]
    base: Option<String>,

    /// Do not watch for tracking or branch changes
    #[arg(long)]
    no_watch: bool,

    /// Print the grouped changes as plain text and exit
    #[arg(long)]
    print: bool,

    /// With --print, include each hunk's diff
    #[arg(long, requires = "print")]
    patch: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut app = App::new(Options {
        path: cli.path,
        base: cli.base,
        tracking_dir: cli.tracking_dir,
    })?;

    if cli.print {
        print!("{}", ui::plain_text(app.nav.groups(), cli.patch));
        return Ok(());
    }

    // Load syntax highlighting (once, reused for all files)
    let highlighter = ui::highlight::Highlighter::new(app.config.display.syntax_highlight);
    let watch_enabled = app.config.watch.enabled && !cli.no_watch;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &highlighter, watch_enabled);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Log to the file named by `CODEWALK_LOG`, filtered by `RUST_LOG`.
/// Without it nothing is logged, keeping the alternate screen clean.
fn init_logging() -> Result<()> {
    use std::fs::File;
    use std::sync::Mutex;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let Some(log_path) = std::env::var_os("CODEWALK_LOG") else {
        return Ok(());
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Cannot open log file {}", PathBuf::from(&log_path).display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init()
        .context("Failed to install logger")?;

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    hl: &ui::highlight::Highlighter,
    watch_enabled: bool,
) -> Result<()> {
    let (watch_tx, watch_rx) = mpsc::channel::<WatchEvent>();

    let _watcher: Option<FileWatcher> = if watch_enabled {
        match FileWatcher::new(
            &app.tracking_dir,
            &app.git_dir,
            app.config.watch.debounce_ms,
            watch_tx,
        ) {
            Ok(w) => {
                app.watching = true;
                Some(w)
            }
            Err(e) => {
                log::warn!("File watching unavailable: {:#}", e);
                app.notify("Watch unavailable, polling instead");
                None
            }
        }
    } else {
        None
    };

    let poll_every = Duration::from_secs(app.config.watch.poll_secs.max(1));
    let mut last_poll = Instant::now();

    loop {
        // Viewport must match the body before drawing so scroll stays valid
        let size = terminal.size()?;
        app.nav.set_viewport_height(ui::body_height(size.height));

        terminal.draw(|f| ui::draw(f, app, hl))?;

        // Poll for events with a timeout (lets us process watch events too)
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }

        // Drain watch events; the strongest one wins
        let mut pending: Option<WatchEvent> = None;
        while let Ok(event) = watch_rx.try_recv() {
            if pending != Some(WatchEvent::BranchChanged) {
                pending = Some(event);
            }
        }

        // Polling fallback for missed file events
        if pending.is_none() && last_poll.elapsed() >= poll_every {
            last_poll = Instant::now();
            pending = app.poll_changes().map(|change| match change {
                PollChange::Head => WatchEvent::BranchChanged,
                PollChange::Tracking => WatchEvent::TrackingChanged,
            });
        }

        match pending {
            Some(WatchEvent::TrackingChanged) => match app.reload() {
                Ok(()) => app.notify("Tracking updated"),
                Err(e) => app.notify(&format!("Reload failed: {}", e)),
            },
            Some(WatchEvent::BranchChanged) => match app.reload_branch() {
                Ok(()) => {
                    let msg = format!("On {}", app.current_branch);
                    app.notify(&msg);
                }
                Err(e) => app.notify(&format!("Reload failed: {}", e)),
            },
            None => {}
        }

        // Auto-clear notifications
        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let page = app.nav.viewport_height() as isize;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Char('d') if ctrl => app.nav.move_selection(app.nav.half_page()),
        KeyCode::Char('u') if ctrl => app.nav.move_selection(-app.nav.half_page()),
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.nav.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.nav.move_selection(-1),
        KeyCode::Enter | KeyCode::Char(' ') => app.nav.toggle_expand(),
        KeyCode::Char('g') | KeyCode::Home => app.nav.jump_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.nav.jump_to_bottom(),
        KeyCode::PageDown => app.nav.move_selection(page),
        KeyCode::PageUp => app.nav.move_selection(-page),
        KeyCode::Char('c') => app.toggle_context(),
        KeyCode::Char('r') => match app.reload_branch() {
            Ok(()) => app.notify("Reloaded"),
            Err(e) => app.notify(&format!("Reload failed: {}", e)),
        },
        _ => {}
    }
}
