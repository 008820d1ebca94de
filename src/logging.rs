use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// Console logging plus an optional daily-rolling JSON file. Safe to call
/// more than once; only the first call installs the subscriber.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let file_layer = config.dir.as_ref().map(|dir| {
            let file_appender = tracing_appender::rolling::daily(dir, "ambit.log");
            fmt::Layer::new()
                .json()
                .with_writer(file_appender)
                .with_target(true)
                .with_ansi(false)
                .with_filter(env_filter(&config.level))
        });

        tracing_subscriber::registry()
            .with(
                fmt::Layer::new()
                    .with_target(true)
                    .with_filter(env_filter(&config.level)),
            )
            .with(file_layer)
            .init();
    });
}
