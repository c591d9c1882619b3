//! Logging initialization for the command-line tool.
//!
//! Library code only emits through the `log` facade. The binary installs a
//! `tracing-subscriber` formatter, which also receives `log` records, writing
//! to stderr so stdout stays free for data.

use log::LevelFilter;
use tracing_subscriber::filter::LevelFilter as SubscriberLevel;

use crate::error::BoxError;

/// Map a `log` level filter onto the subscriber's filter.
pub fn subscriber_level(level: LevelFilter) -> SubscriberLevel {
    match level {
        LevelFilter::Off => SubscriberLevel::OFF,
        LevelFilter::Error => SubscriberLevel::ERROR,
        LevelFilter::Warn => SubscriberLevel::WARN,
        LevelFilter::Info => SubscriberLevel::INFO,
        LevelFilter::Debug => SubscriberLevel::DEBUG,
        LevelFilter::Trace => SubscriberLevel::TRACE,
    }
}

/// Initialize logging with the specified level.
///
/// Fails if a global subscriber or logger is already installed.
pub fn init_logging(level: LevelFilter) -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_max_level(subscriber_level(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_level() {
        assert_eq!(subscriber_level(LevelFilter::Off), SubscriberLevel::OFF);
        assert_eq!(subscriber_level(LevelFilter::Info), SubscriberLevel::INFO);
        assert_eq!(subscriber_level(LevelFilter::Trace), SubscriberLevel::TRACE);
    }

    #[test]
    fn test_init_logging_once() {
        assert!(init_logging(LevelFilter::Debug).is_ok());
        log::debug!("logging installed");
        assert!(init_logging(LevelFilter::Info).is_err());
    }
}
