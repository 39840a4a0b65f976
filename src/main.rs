use chronomaster::{
    app::{App, Control, Practice},
    app_dirs::AppDirs,
    clock::{Clock, MonotonicClock},
    config::{Config, ConfigStore, FileConfigStore},
    error::SessionError,
    logging,
    runtime::{CrosstermEventSource, EventSource, Runner},
    session::{MainsSetup, MainsType, PrelimsPaper, PrelimsSetup, SessionStore},
    ticker::{FixedTicker, Ticker},
};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};

/// exam pacing practice with lap timing, question heatmaps and answer-writing phases
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practise exam pacing in the terminal. Prelims mode times every question against the ideal pace and shows where the minutes went; Mains mode counts down one answer and walks you through outline, write and conclude phases."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// write logs to this file instead of the state directory
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,

    /// print a JSON report of every finished session on exit
    #[clap(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// time a prelims paper question by question
    Prelims {
        /// paper being practised
        #[clap(long, value_enum, default_value_t = PrelimsPaper::Gs)]
        paper: PrelimsPaper,

        /// number of questions (defaults to the configured value)
        #[clap(short = 'q', long)]
        questions: Option<u32>,

        /// minutes for the whole paper (defaults to the configured value)
        #[clap(short = 'm', long)]
        minutes: Option<u32>,
    },
    /// time a single mains answer
    Mains {
        /// answer type; 10m and 15m have fixed durations
        #[clap(short = 'k', long, value_enum)]
        kind: MainsType,

        /// essay duration in minutes
        #[clap(short = 'd', long)]
        duration: Option<u32>,
    },
    /// show, set or clear the display name
    Name {
        #[clap(subcommand)]
        action: NameAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum NameAction {
    Show,
    Set { name: String },
    Clear,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// The practice run described by the command, `None` for `name`.
    fn practice(&self, config: &Config) -> Result<Option<Practice>, SessionError> {
        match &self.command {
            Command::Prelims {
                paper,
                questions,
                minutes,
            } => PrelimsSetup::new(
                *paper,
                questions.unwrap_or(config.prelims_questions),
                minutes.unwrap_or(config.prelims_minutes),
            )
            .map(|setup| Some(Practice::Prelims(setup))),
            Command::Mains { kind, duration } => {
                MainsSetup::new(*kind, *duration, config.essay_minutes)
                    .map(|setup| Some(Practice::Mains(setup)))
            }
            Command::Name { .. } => Ok(None),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_store = cli.config_store();
    let config = config_store.load();

    let _log_guard = cli
        .log_file
        .clone()
        .or_else(AppDirs::log_path)
        .and_then(|path| logging::init(&config.log_level, &path));

    if let Command::Name { action } = &cli.command {
        return run_name(action, config_store);
    }

    let practice = match cli.practice(&config) {
        Ok(Some(practice)) => practice,
        Ok(None) => return Ok(()),
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let clock = MonotonicClock::new();
    let mut store = SessionStore::new(clock, config_store);
    store.load_name_from_storage();
    let mut app = App::new(store, clock, practice);

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_millis(config.tick_interval_ms.max(1)),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if cli.json {
        for report in app.reports() {
            println!("{}", report.to_json()?);
        }
    }

    Ok(())
}

fn start_tui<B, C, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    C: Clock + Clone,
    E: EventSource,
    T: Ticker,
{
    app.begin(runner);
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let Some(event) = runner.step() else {
            continue;
        };
        if app.handle(event, runner) == Control::Quit {
            break;
        }
        if app.take_bell() {
            execute!(io::stdout(), Print('\x07'))?;
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}

fn run_name(action: &NameAction, config_store: FileConfigStore) -> Result<(), Box<dyn Error>> {
    let mut store = SessionStore::new(MonotonicClock::new(), config_store);
    store.load_name_from_storage();

    match action {
        NameAction::Show => match store.name() {
            Some(name) => println!("{name}"),
            None => println!("no name set"),
        },
        NameAction::Set { name } => {
            store.set_name(Some(name.clone()))?;
            match store.name() {
                Some(name) => println!("name set to {name}"),
                None => println!("name cleared"),
            }
        }
        NameAction::Clear => {
            store.set_name(None)?;
            println!("name cleared");
        }
    }
    Ok(())
}
