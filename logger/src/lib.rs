use chrono::Utc;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum LogLevel {
    Debug,
    Info(Color),
    Warn,
    Error,
}

impl LogLevel {
    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info(_) => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Console colours, shared with anything that wants to paint terminal output
/// the same way the log echo does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    White,
}

impl Color {
    /// ANSI escape that switches the terminal foreground to this colour.
    pub fn ansi_code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Blue => "\x1b[34m",
            Color::Yellow => "\x1b[33m",
            Color::Cyan => "\x1b[36m",
            Color::Magenta => "\x1b[35m",
            Color::White => "\x1b[37m",
        }
    }

    /// Wraps `text` in this colour and resets the terminal afterwards.
    pub fn paint(self, text: &str) -> String {
        format!("{}{}{}", self.ansi_code(), text, RESET)
    }
}

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone)]
pub struct Logger {
    log_file: PathBuf,
    // Shared by every clone, so muting one mutes all of them.
    echo: Arc<AtomicBool>,
    debug: bool,
}

impl Logger {
    /// Creates a new `Logger` writing to `<log_dir>/tracker_<session>.log`.
    ///
    /// # Parameters
    /// - `log_dir`: Directory for the log file. Created if missing.
    /// - `session`: Name of the tracking session, used in the file name.
    /// - `echo`: Whether messages are also printed to the console.
    ///
    /// # Returns
    /// A new `Logger` instance, with an empty log file.
    pub fn new(log_dir: &Path, session: &str, echo: bool) -> Result<Self, LoggerError> {
        if log_dir.exists() && !log_dir.is_dir() {
            return Err(LoggerError::InvalidPath(format!(
                "{} is not a directory.",
                log_dir.display()
            )));
        }
        std::fs::create_dir_all(log_dir)?;

        let sanitized = session.replace([':', '/', ' '], "_");
        let log_file = log_dir.join(format!("tracker_{}.log", sanitized));

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_file)?;

        Ok(Logger {
            log_file,
            echo: Arc::new(AtomicBool::new(echo)),
            debug: false,
        })
    }

    /// Enables or disables the `debug` level.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Turns the console echo on or off for this logger and all its clones.
    pub fn set_echo(&self, enabled: bool) {
        self.echo.store(enabled, Ordering::SeqCst);
    }

    pub fn echo_enabled(&self) -> bool {
        self.echo.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    fn log(&self, level: LogLevel, message: &str) -> Result<(), LoggerError> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let log_message = format!("[{}] [{}]: {}\n", level.tag(), timestamp, message);

        if self.echo_enabled() {
            let colored_message = match &level {
                LogLevel::Debug => Color::Cyan.paint(&log_message),
                LogLevel::Info(color) => color.paint(&log_message),
                LogLevel::Warn => format!("\x1b[93m{}{}", log_message, RESET), // bright yellow
                LogLevel::Error => format!("\x1b[91m{}{}", log_message, RESET), // bright red
            };
            print!("{}", colored_message);
            io::stdout().flush()?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;
        file.write_all(log_message.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Logs a debug message. Dropped unless debug output was enabled.
    pub fn debug(&self, message: &str) -> Result<(), LoggerError> {
        if !self.debug {
            return Ok(());
        }
        self.log(LogLevel::Debug, message)
    }

    /// Logs an informational message, echoed in `color`.
    pub fn info(&self, message: &str, color: Color) -> Result<(), LoggerError> {
        self.log(LogLevel::Info(color), message)
    }

    pub fn warn(&self, message: &str) -> Result<(), LoggerError> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> Result<(), LoggerError> {
        self.log(LogLevel::Error, message)
    }
}

#[derive(Debug)]
pub enum LoggerError {
    IoError(std::io::Error),
    InvalidPath(String),
}

impl std::fmt::Display for LoggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerError::IoError(e) => write!(f, "I/O Error: {}", e),
            LoggerError::InvalidPath(msg) => write!(f, "Invalid Path: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggerError::IoError(e) => Some(e),
            LoggerError::InvalidPath(_) => None,
        }
    }
}

impl From<std::io::Error> for LoggerError {
    fn from(err: std::io::Error) -> Self {
        LoggerError::IoError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tracker_logger_{}", name));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_logger_creation_and_logging() {
        let log_dir = scratch_dir("creation");
        let logger = Logger::new(&log_dir, "session-1", false).expect("Failed to create logger");

        logger
            .info("Tracking AA123", Color::Green)
            .expect("Failed to log message");
        logger.warn("Slow lookup").expect("Failed to log warning");

        let log_contents = fs::read_to_string(logger.path()).expect("Failed to read log file");
        assert!(log_contents.contains("[INFO]"));
        assert!(log_contents.contains("Tracking AA123"));
        assert!(log_contents.contains("[WARN]"));
        assert!(logger.path().ends_with("tracker_session-1.log"));

        fs::remove_dir_all(log_dir).expect("Failed to remove test directory");
    }

    #[test]
    fn test_debug_is_dropped_unless_enabled() {
        let log_dir = scratch_dir("debug");
        let quiet = Logger::new(&log_dir, "quiet", false).unwrap();
        quiet.debug("tick 1").unwrap();
        assert!(fs::read_to_string(quiet.path()).unwrap().is_empty());

        let loud = Logger::new(&log_dir, "loud", false).unwrap().with_debug(true);
        loud.debug("tick 1").unwrap();
        assert!(fs::read_to_string(loud.path()).unwrap().contains("[DEBUG]"));

        fs::remove_dir_all(log_dir).unwrap();
    }

    #[test]
    fn test_muting_echo_reaches_every_clone() {
        let log_dir = scratch_dir("echo");
        let logger = Logger::new(&log_dir, "echo", true).unwrap();
        let clone = logger.clone();
        assert!(clone.echo_enabled());

        logger.set_echo(false);
        assert!(!clone.echo_enabled());
        clone.info("still written to the file", Color::White).unwrap();
        assert!(fs::read_to_string(logger.path())
            .unwrap()
            .contains("still written to the file"));

        fs::remove_dir_all(log_dir).unwrap();
    }

    #[test]
    fn test_session_name_is_sanitized() {
        let log_dir = scratch_dir("sanitize");
        let logger = Logger::new(&log_dir, "a:b/c d", false).unwrap();
        assert!(logger.path().ends_with("tracker_a_b_c_d.log"));
        fs::remove_dir_all(log_dir).unwrap();
    }

    #[test]
    fn test_invalid_path() {
        let log_dir = scratch_dir("file_in_the_way");
        fs::create_dir_all(&log_dir).unwrap();
        let file = log_dir.join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        let result = Logger::new(&file, "session", false);
        assert!(matches!(result, Err(LoggerError::InvalidPath(_))));

        fs::remove_dir_all(log_dir).unwrap();
    }

    #[test]
    fn test_paint_resets_colour() {
        let painted = Color::Green.paint("En Route");
        assert!(painted.starts_with("\x1b[32m"));
        assert!(painted.ends_with("\x1b[0m"));
    }
}
