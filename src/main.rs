mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;
use typerush::{
    app_dirs::AppDirs,
    clock::{ClockToken, TICK_PERIOD},
    config::{Config, ConfigStore, EngineConfig, FileConfigStore},
    controller::{FinishEvent, ProgressEvent, SessionController},
    history::{HistorySummary, ResultLog},
    runtime::{AppEvent, CrosstermEventSource, EventSource, Metronome, Runner},
    session::SessionState,
    text::DifficultyProfile,
};

const REDRAW_INTERVAL_MS: u64 = 100;

/// timed typing test with an endless prompt and live wpm, cpm and accuracy
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed typing test. The prompt keeps growing as you type, so the test only ends when the clock runs out."
)]
pub struct Cli {
    /// number of seconds to run the test (commonly 15, 30, 60 or 120)
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// difficulty profile to draw words from; unknown names fall back to medium
    #[clap(short = 'd', long)]
    difficulty: Option<String>,

    /// minimum number of untyped characters kept ahead of the cursor
    #[clap(long)]
    lookahead: Option<usize>,

    /// minimum length of freshly generated text
    #[clap(long)]
    min_length: Option<usize>,

    /// seed for reproducible text
    #[clap(long)]
    seed: Option<u64>,

    /// store the given settings as the new defaults
    #[clap(long)]
    save: bool,

    /// print the registered difficulty profiles and exit
    #[clap(long)]
    list_profiles: bool,

    /// print the personal best summary and exit
    #[clap(long)]
    history: bool,
}

impl Cli {
    /// Apply command-line overrides on top of stored settings
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.secs {
            cfg.total_duration_secs = secs;
        }
        if let Some(ref difficulty) = self.difficulty {
            cfg.difficulty = difficulty.to_lowercase();
        }
        if let Some(lookahead) = self.lookahead {
            cfg.lookahead_threshold = lookahead;
        }
        if let Some(min_length) = self.min_length {
            cfg.minimum_initial_length = min_length;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg
    }
}

#[derive(Debug)]
pub struct App {
    pub controller: SessionController,
    pub input: String,
    pub metronome: Option<Metronome>,
    pub progress: Option<ProgressEvent>,
    pub history: Option<HistorySummary>,
    pub result_log: Option<ResultLog>,
}

impl App {
    pub fn new(controller: SessionController, result_log: Option<ResultLog>) -> Self {
        let history = load_history(result_log.as_ref());
        Self {
            controller,
            input: String::new(),
            metronome: None,
            progress: None,
            history,
            result_log,
        }
    }

    fn is_finished(&self) -> bool {
        self.controller.session().state() == SessionState::Finished
    }

    fn type_char<E: EventSource>(&mut self, c: char, runner: &Runner<E>) {
        if self.is_finished() {
            return;
        }
        self.input.push(c);
        self.apply_input(runner);
    }

    fn backspace<E: EventSource>(&mut self, runner: &Runner<E>) {
        if self.is_finished() {
            return;
        }
        self.input.pop();
        self.apply_input(runner);
    }

    fn apply_input<E: EventSource>(&mut self, runner: &Runner<E>) {
        let update = self.controller.process_input(&self.input);
        if let Some(token) = update.started {
            self.metronome = Some(runner.start_metronome(token, TICK_PERIOD));
        }
        if update.progress.is_some() {
            self.progress = update.progress;
        }
    }

    fn on_tick(&mut self, token: ClockToken) {
        let update = self.controller.on_tick(token);
        if let Some(finish) = update.finished {
            // dropping the metronome disarms it
            self.metronome = None;
            self.record(&finish);
        }
    }

    fn record(&mut self, finish: &FinishEvent) {
        let Some(ref log) = self.result_log else {
            return;
        };
        if let Err(err) = log.append(finish) {
            tracing::warn!(%err, path = %log.path().display(), "could not save result");
        }
        self.history = load_history(Some(log));
    }

    pub fn reset(&mut self) {
        self.metronome = None;
        self.controller.reset_session();
        self.input.clear();
        self.progress = None;
    }
}

fn load_history(log: Option<&ResultLog>) -> Option<HistorySummary> {
    log.and_then(|log| match log.summary(None) {
        Ok(summary) => summary,
        Err(err) => {
            tracing::warn!(%err, "could not read result history");
            None
        }
    })
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("TYPERUSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn print_history() {
    match ResultLog::new().map(|log| log.summary(None)) {
        Some(Ok(Some(h))) => println!(
            "{} runs, personal best {} wpm ({}% acc), average {:.0} ± {:.1} wpm",
            h.runs, h.best_wpm, h.best_accuracy, h.mean_wpm, h.wpm_std_dev
        ),
        Some(Err(err)) => eprintln!("could not read results: {err}"),
        _ => println!("no saved results yet"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = FileConfigStore::new();
    let config = cli.merge_into(store.load());
    let engine_config = EngineConfig::from(&config);
    if cli.save {
        // never persist settings a session would reject
        if let Err(err) = engine_config.validate() {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
        store.save(&config)?;
    }

    if cli.list_profiles {
        for id in DifficultyProfile::registered_ids() {
            println!("{id}");
        }
        return Ok(());
    }

    if cli.history {
        print_history();
        return Ok(());
    }

    let controller = match config.seed {
        Some(seed) => SessionController::with_seed(engine_config, seed),
        None => SessionController::new(engine_config),
    };
    let controller = match controller {
        Ok(controller) => controller,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller, ResultLog::new());
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(REDRAW_INTERVAL_MS),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Timeout => continue,
            AppEvent::Resize => {}
            AppEvent::ClockTick(token) => app.on_tick(token),
            AppEvent::Key(key) => {
                if !handle_key(app, key, &runner) {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

/// Returns false when the app should quit
fn handle_key<E: EventSource>(app: &mut App, key: KeyEvent, runner: &Runner<E>) -> bool {
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
        KeyCode::Tab | KeyCode::Left => app.reset(),
        KeyCode::Char('r') if app.is_finished() => app.reset(),
        KeyCode::Backspace => app.backspace(runner),
        KeyCode::Char(c) => app.type_char(c, runner),
        _ => {}
    }
    true
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
