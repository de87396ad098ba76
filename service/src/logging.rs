use crate::config::Config;
use log::{info, LevelFilter};
use simplelog::{self, ConfigBuilder};

/// Modules to filter out from logging when not in Trace mode.
/// These are typically verbose dependencies that clutter normal log output.
const FILTERED_MODULES: &[&str] = &[
    "lapin",
    "amq_protocol",
    "pinky_swear",
    "async_io",
    "polling",
    "tower",
    "hyper",
    "axum",
];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger with configuration based on the provided Config.
    ///
    /// When the log level is set to Trace, all logs including dependency logs are shown.
    /// For all other log levels, verbose dependency logs are filtered out.
    pub fn init_logger(config: &Config) {
        let log_level_filter = Self::convert_level_filter(config.log_level_filter);
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);

        simplelog::TermLogger::init(
            log_level_filter,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .unwrap_or_else(|e| eprintln!("Logger already initialized: {e}"));
    }

    /// Logs the settings that decide where messages come from and where clients connect.
    pub fn log_startup_summary(config: &Config) {
        info!(
            "Runtime environment: {}, queue backend: {}, queue: \"{}\", listening on {}",
            config.runtime_env(),
            config.queue_backend,
            config.queue_name(),
            config.listen_address()
        );
    }

    /// Converts log::LevelFilter to simplelog::LevelFilter.
    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    /// Determines whether dependency logging should be filtered.
    ///
    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Builds a simplelog Config with optional module filtering.
    ///
    /// When `apply_filters` is true, logs from noisy dependencies are suppressed.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_client_logs_are_filtered_below_trace() {
        for module in ["lapin", "amq_protocol", "pinky_swear"] {
            assert!(FILTERED_MODULES.contains(&module), "{module} should be filtered");
        }
        assert!(Logger::should_filter_dependencies(LevelFilter::Debug));
        assert!(!Logger::should_filter_dependencies(LevelFilter::Trace));
    }

    #[test]
    fn test_filtered_modules_never_hide_our_own_crates() {
        for own in ["queue_relay", "queue", "sse", "web", "events", "service"] {
            assert!(
                !FILTERED_MODULES.contains(&own),
                "{own} logs must stay visible"
            );
        }
    }

    #[test]
    fn test_configured_level_is_passed_through_unchanged() {
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Off),
            simplelog::LevelFilter::Off
        );
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Debug),
            simplelog::LevelFilter::Debug
        );
    }
}
