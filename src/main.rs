use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode},
    tty::IsTty,
};
use lightsout::{
    clock::MonotonicClock,
    config::{Config, ConfigStore, FileConfigStore},
    engine::{Engine, SequenceEvent, TriggerOutcome, Verdict, LAMP_COUNT},
    history::{HistoryLedger, JUMP_START_SENTINEL},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::SessionConfig,
    stats::{benchmarks_beaten, PerformanceTier, Summary},
    store::{write_csv, HistoryStore, JsonFileStore, SqliteStore},
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};
use tracing::debug;

const TICK_RATE_MS: u64 = 100;

/// five-lamp start sequence reaction trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Watch five lamps light up one by one, wait for them to go out, and react as fast as you can. Early triggers are jump starts; every attempt is kept in a ranked history."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// history file to read and write (defaults to the state directory)
    #[clap(long, global = true)]
    history_file: Option<PathBuf>,

    /// history storage backend
    #[clap(long, value_enum, default_value_t = StoreKind::Json, global = true)]
    store: StoreKind,

    /// config file (defaults to the platform config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// shortest random hold after the fifth lamp, in milliseconds
    #[clap(long, global = true)]
    hold_min_ms: Option<u64>,

    /// longest random hold after the fifth lamp, in milliseconds
    #[clap(long, global = true)]
    hold_max_ms: Option<u64>,

    /// gap between lamps, in milliseconds
    #[clap(long, global = true)]
    lamp_interval_ms: Option<u64>,

    /// enable debug logging on stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// play the start sequence (default)
    Play,
    /// show the summary, fastest times and benchmarks beaten
    History {
        /// number of fastest times to list
        #[clap(short = 'n', long, default_value_t = 5)]
        top: usize,
    },
    /// delete all recorded attempts
    Clear,
    /// write the history as CSV
    Export {
        /// output file; stdout when omitted
        path: Option<PathBuf>,
    },
    /// print the effective settings, including command line overrides
    Config {
        /// write them to the config file so later runs pick them up
        #[clap(long)]
        save: bool,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreKind {
    Json,
    Sqlite,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Config file values with command line overrides applied
    fn effective_config(&self) -> Config {
        let mut cfg = self.config_store().load();
        if let Some(ms) = self.hold_min_ms {
            cfg.hold_min_ms = ms;
        }
        if let Some(ms) = self.hold_max_ms {
            cfg.hold_max_ms = ms;
        }
        if let Some(ms) = self.lamp_interval_ms {
            cfg.lamp_interval_ms = ms;
        }
        cfg
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::from(&self.effective_config())
    }

    fn open_store(&self) -> Result<Box<dyn HistoryStore>, Box<dyn Error>> {
        let store: Box<dyn HistoryStore> = match (self.store, &self.history_file) {
            (StoreKind::Json, Some(path)) => Box::new(JsonFileStore::with_path(path)),
            (StoreKind::Json, None) => Box::new(JsonFileStore::new()),
            (StoreKind::Sqlite, Some(path)) => Box::new(SqliteStore::open(path)?),
            (StoreKind::Sqlite, None) => Box::new(SqliteStore::open_default()?),
        };
        Ok(store)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let session = cli.session_config();
    if let Err(e) = session.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }
    debug!(store = %cli.store, ?session, "starting");

    let store = cli.open_store()?;
    let mut stdout = io::stdout();

    match cli.command.clone().unwrap_or(Command::Play) {
        Command::Play => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            let mut engine = Engine::new(session, MonotonicClock::new(), store);
            let runner = Runner::new(
                CrosstermEventSource::new(),
                FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
            );

            enable_raw_mode()?;
            let played = play(&mut engine, &runner, &mut stdout);
            disable_raw_mode()?;
            played?;
        }
        Command::History { top } => {
            let ledger = HistoryLedger::open(store, session.history_capacity);
            print_history(&ledger, top, &mut stdout)?;
        }
        Command::Clear => {
            let mut ledger = HistoryLedger::open(store, session.history_capacity);
            let removed = ledger.history().len();
            ledger.clear();
            writeln!(stdout, "cleared {} attempts", removed)?;
        }
        Command::Export { path } => {
            let ledger = HistoryLedger::open(store, session.history_capacity);
            let attempts = ledger.history().to_vec();
            match path {
                Some(path) => write_csv(&attempts, File::create(path)?)?,
                None => write_csv(&attempts, stdout.lock())?,
            }
        }
        Command::Config { save } => {
            let cfg = cli.effective_config();
            writeln!(stdout, "{}", serde_json::to_string_pretty(&cfg)?)?;
            if save {
                cli.config_store().save(&cfg)?;
            }
        }
    }

    Ok(())
}

/// Raw mode leaves the cursor where it was, so every line returns the carriage
fn say<W: Write>(out: &mut W, line: &str) -> io::Result<()> {
    write!(out, "{}\r\n", line)?;
    out.flush()
}

fn play<C, S, E, T>(
    engine: &mut Engine<C, S>,
    runner: &Runner<E, T>,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>>
where
    C: lightsout::clock::Clock + Clone,
    S: HistoryStore,
    E: lightsout::runtime::GameEventSource,
    T: lightsout::runtime::Ticker,
{
    say(out, "SPACE or ENTER to start and react, r to reset, q to quit")?;
    if let Some(best) = engine.best_time() {
        say(out, &format!("personal best {:.3}s", best))?;
    }

    loop {
        let wait = engine
            .next_deadline()
            .map(|due| due.saturating_sub(engine.now()))
            .unwrap_or(Duration::from_millis(TICK_RATE_MS));

        match runner.step_within(wait) {
            GameEvent::Quit => break,
            GameEvent::Reset => {
                engine.reset_to_idle();
                say(out, "reset, SPACE to start")?;
            }
            GameEvent::Trigger => {
                for event in engine.tick() {
                    report_event(out, &event)?;
                }
                if let Some(line) = describe_outcome(&engine.on_trigger()) {
                    say(out, &line)?;
                }
            }
            GameEvent::Tick => {}
        }

        for event in engine.tick() {
            report_event(out, &event)?;
        }
    }

    let summary = engine.summary();
    say(out, &summary_line(&summary))?;
    Ok(())
}

fn report_event<W: Write>(out: &mut W, event: &SequenceEvent) -> io::Result<()> {
    match event {
        SequenceEvent::LampLit { lamp, .. } => {
            let lit = usize::from(*lamp);
            let unlit = usize::from(LAMP_COUNT).saturating_sub(lit);
            say(out, &format!("{}{}", "(*) ".repeat(lit), "( ) ".repeat(unlit)))
        }
        SequenceEvent::HoldRolled { hold, .. } => {
            debug!(?hold, "waiting for lights out");
            Ok(())
        }
        SequenceEvent::LightsOut { .. } => say(out, "LIGHTS OUT!"),
    }
}

fn describe_outcome(outcome: &TriggerOutcome) -> Option<String> {
    match outcome {
        TriggerOutcome::Started => Some("get ready...".to_string()),
        TriggerOutcome::JumpStart(verdict) | TriggerOutcome::Reaction(verdict) => {
            Some(describe_verdict(verdict))
        }
        TriggerOutcome::Rejected(_) | TriggerOutcome::Ignored => None,
    }
}

fn describe_verdict(verdict: &Verdict) -> String {
    let attempt = &verdict.attempt;
    if attempt.is_jump_start() {
        return if attempt.reaction_time == JUMP_START_SENTINEL {
            "JUMP START! the lamps were still lighting".to_string()
        } else {
            format!("JUMP START! {:.3}s before lights out", -attempt.reaction_time)
        };
    }

    let mut line = format!("{:.3}s  {}", attempt.reaction_time, verdict.tier().label());
    if verdict.is_new_best {
        line.push_str("  NEW PERSONAL BEST");
    }
    if verdict.celebration.is_active() {
        line.push_str(&format!(
            "  [{} confetti]",
            verdict.celebration.particle_count()
        ));
    }
    line
}

fn format_secs(secs: Option<f64>) -> String {
    secs.map(|s| format!("{:.3}s", s))
        .unwrap_or_else(|| "-".to_string())
}

fn summary_line(summary: &Summary) -> String {
    format!(
        "{} attempts ({} valid, {} jump starts), best {}, average {}",
        summary.attempts,
        summary.valid,
        summary.jump_starts,
        format_secs(summary.best),
        format_secs(summary.average),
    )
}

fn print_history<S: HistoryStore, W: Write>(
    ledger: &HistoryLedger<S>,
    top: usize,
    out: &mut W,
) -> io::Result<()> {
    let summary = ledger.summary();
    writeln!(out, "{}", summary_line(&summary))?;
    writeln!(out, "consistency (std dev) {}", format_secs(summary.std_dev))?;

    let fastest = ledger.history().top_times(top);
    if !fastest.is_empty() {
        writeln!(out, "fastest:")?;
        for (rank, attempt) in fastest.iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {:.3}s  {:<16} {}",
                rank + 1,
                attempt.reaction_time,
                PerformanceTier::from_reaction(attempt.reaction_time).label(),
                attempt.created_at.format("%Y-%m-%d %H:%M"),
            )?;
        }
    }

    for benchmark in benchmarks_beaten(summary.best) {
        writeln!(
            out,
            "beat {} ({:.3}s, {})",
            benchmark.name, benchmark.time, benchmark.label
        )?;
    }
    Ok(())
}
