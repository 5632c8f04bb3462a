//! Utilities for logging.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingFormat {
    Json,
    #[default]
    Full,
    Compact,
}

impl LoggingFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(LoggingFormat::Json),
            "full" => Some(LoggingFormat::Full),
            "compact" => Some(LoggingFormat::Compact),
            _ => None,
        }
    }
}

fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}

/// Configure the global tracing subscriber.
///
/// `RUST_LOG` directives take precedence over `default_level`. Calling this
/// more than once is a no-op, the first subscriber wins.
pub fn configure_global_logger(default_level: Level, format: LoggingFormat) {
    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter(default_level))
        .with_file(true)
        .with_line_number(true);

    let result = match format {
        LoggingFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().finish())
        }
        LoggingFormat::Full => tracing::subscriber::set_global_default(builder.finish()),
        LoggingFormat::Compact => {
            tracing::subscriber::set_global_default(builder.compact().finish())
        }
    };

    if result.is_err() {
        tracing::trace!("global logger already configured");
    }
}

/// Initialize a logger for tests.
///
/// Output goes through the test writer so it's captured per test.
pub fn init_test() {
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
