use chrono::Local;
use clap::Parser;
use logger::Logger;
use std::{
    io::{self, Write},
    path::PathBuf,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};
use tracker::{display, RecordSource, StaticStore, Tracker, TrackerConfig, TrackerError, ViewState};

/// Track a simulated flight in real time.
#[derive(Parser, Debug)]
#[command(name = "flight-tracker", version)]
struct Args {
    /// Artificial lookup latency, in milliseconds [default: 2000]
    #[arg(long)]
    query_delay_ms: Option<u64>,

    /// Time between live updates, in milliseconds [default: 3000]
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Give up on a lookup after this many milliseconds [default: 10000]
    #[arg(long)]
    query_timeout_ms: Option<u64>,

    /// Land the flight and stop live updates when it reaches 100%
    #[arg(long)]
    land_on_arrival: bool,

    /// Directory for the session log file
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Echo the log to the console, including every live update
    #[arg(short, long)]
    verbose: bool,

    /// Flight number to track right away
    flight: Option<String>,
}

impl Args {
    fn config(&self) -> TrackerConfig {
        let defaults = TrackerConfig::default();
        TrackerConfig {
            query_delay: self
                .query_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.query_delay),
            query_timeout: self
                .query_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.query_timeout),
            tick_interval: self
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            land_on_arrival: self.land_on_arrival,
            limits: defaults.limits,
        }
    }

    fn logger(&self) -> Result<Option<Logger>, TrackerError> {
        let Some(dir) = &self.log_dir else {
            return Ok(None);
        };
        let session = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let logger = Logger::new(dir, &session, self.verbose)
            .map_err(|e| TrackerError::Other(e.to_string()))?
            .with_debug(self.verbose);
        Ok(Some(logger))
    }
}

fn clean_scr() {
    print!("\x1B[2J\x1B[1;1H");
    io::stdout().flush().ok();
}

/// Everything typed after the command word, as one string. Flight numbers
/// are free text, so `track aa 123` searches for `AA 123`.
fn command_argument(words: &[&str]) -> String {
    words.get(1..).map(|rest| rest.join(" ")).unwrap_or_default()
}

fn track(tracker: &Tracker, flight: &str) {
    if flight.trim().is_empty() {
        println!("{}", TrackerError::EmptyQuery);
        return;
    }
    println!("Searching for {}...", flight.trim().to_uppercase());
    match tracker.search(flight) {
        Err(TrackerError::EmptyQuery) => println!("{}", TrackerError::EmptyQuery),
        // Failures are already on the display as an error banner.
        _ => show(tracker),
    }
}

fn current_view(tracker: &Tracker) -> ViewState {
    tracker
        .current()
        .unwrap_or_else(|e| ViewState::Failed(e.to_string()))
}

fn show(tracker: &Tracker) {
    print!("{}", display::render(&current_view(tracker), tracker.is_live()));
    io::stdout().flush().ok();
}

/// Re-renders the display on every change until Enter is pressed. The log
/// echo is muted meanwhile so it does not scribble over the screen.
fn watch(tracker: &Tracker, logger: Option<&Logger>) {
    let echo = logger.map(|logger| logger.echo_enabled()).unwrap_or(false);
    if let Some(logger) = logger {
        logger.set_echo(false);
    }
    watch_until_enter(tracker);
    if let Some(logger) = logger {
        logger.set_echo(echo);
    }
}

fn watch_until_enter(tracker: &Tracker) {
    let updates = tracker.subscribe();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buffer = String::new();
        let _ = io::stdin().read_line(&mut buffer);
        tx.send(()).ok();
    });

    let mut state = current_view(tracker);
    loop {
        clean_scr();
        println!("Last update: {}\n", Local::now().format("%H:%M:%S"));
        print!("{}", display::render(&state, tracker.is_live()));
        println!("\nPress Enter to leave watch mode");

        loop {
            if rx.try_recv().is_ok() {
                return;
            }
            match updates.recv_timeout(Duration::from_millis(100)) {
                Ok(next) => {
                    state = next;
                    break;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

fn main() -> Result<(), TrackerError> {
    let args = Args::parse();
    let config = args.config();
    let logger = args.logger()?;

    let store = Arc::new(StaticStore::new());
    let examples = store.known_flights();
    let source: Arc<dyn RecordSource> = store;
    let tracker = Tracker::new(source, config, logger.clone())?;

    if let Some(flight) = &args.flight {
        track(&tracker, flight);
    }

    loop {
        println!("Enter command (type '-h' or '--help' for options): ");
        let mut command = String::new();
        if io::stdin().read_line(&mut command).unwrap_or(0) == 0 {
            break;
        }

        let words: Vec<&str> = command.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        match words[0] {
            "track" => track(&tracker, &command_argument(&words)),

            "show" => show(&tracker),

            "watch" => watch(&tracker, logger.as_ref()),

            "stop" => {
                tracker.stop_updates();
                println!("Live updates stopped");
            }

            "examples" => println!("Try these example flights: {}", examples.join(", ")),

            "-h" | "--help" | "help" => print_help(),

            "exit" => break,

            _ => eprintln!("Invalid command. Use -h for help."),
        }
    }

    tracker.shutdown();
    Ok(())
}

fn print_help() {
    clean_scr();
    println!("Available commands:");
    println!("  track <flight>");
    println!("    Looks the flight up and shows it. Moving flights get live updates.");
    println!("  show");
    println!("    Shows the current flight once.");
    println!("  watch");
    println!("    Shows the current flight and redraws it on every live update.");
    println!("  stop");
    println!("    Stops the live updates of the current flight.");
    println!("  examples");
    println!("    Lists the flight numbers that can be tracked.");
    println!("  exit");
    println!("    Closes this application.");
}
