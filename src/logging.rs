// logging.rs
use chrono::Local;
use colored::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Per-agent logger. Every line goes through the `log` facade (file backend set up by
/// `cli_log::init_cli_log!`) and, when `echo` is set, to stdout with colours.
#[derive(Debug, Clone)]
pub struct Logger {
    tag: String,
    echo: bool,
}

impl Logger {
    pub fn new(tag: &str, echo: bool) -> Self {
        Self {
            tag: tag.to_uppercase(),
            echo,
        }
    }

    /// A logger that only writes through the `log` facade.
    pub fn quiet(tag: &str) -> Self {
        Self::new(tag, false)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => log::debug!("[{}] {}", self.tag, message),
            LogLevel::Info => log::info!("[{}] {}", self.tag, message),
            LogLevel::Warning => log::warn!("[{}] {}", self.tag, message),
            LogLevel::Error => log::error!("[{}] {}", self.tag, message),
        }

        if !self.echo || level == LogLevel::Debug {
            return;
        }
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        let level_str = match level {
            LogLevel::Debug => "DEBUG".blue(),
            LogLevel::Info => "INFO".green(),
            LogLevel::Warning => "WARN".yellow(),
            LogLevel::Error => "ERROR".red(),
        };
        // Clear the prompt line the terminal UI may have left behind.
        println!(
            "\r\x1B[K[{}] {} [{}] {}",
            timestamp,
            level_str,
            self.tag.bright_blue(),
            message
        );
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

#[test]
fn test_tag_is_uppercased() {
    let logger = Logger::quiet("inventory");
    assert_eq!(logger.tag(), "INVENTORY");
    logger.info("no output expected");
}
