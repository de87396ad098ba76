use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default AMQP broker URL used when `AMQP_URL` is not set.
pub const DEFAULT_AMQP_URL: &str = "amqp://localhost:5672/%2f";

/// Default name of the queue messages are published to and consumed from.
pub const DEFAULT_QUEUE_NAME: &str = "tasks";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Which Queue Gateway implementation backs the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueBackend {
    /// A real AMQP 0.9.1 broker (RabbitMQ) reached through `amqp_url`.
    Amqp,
    /// An in-process queue. Nothing leaves the process; useful for local
    /// development without a broker.
    Memory,
}

#[derive(Debug, PartialEq, Eq)]
pub struct QueueBackendParseError;

impl FromStr for QueueBackend {
    type Err = QueueBackendParseError;
    fn from_str(backend: &str) -> Result<QueueBackend, Self::Err> {
        match backend.to_lowercase().as_str() {
            "amqp" => Ok(QueueBackend::Amqp),
            "memory" => Ok(QueueBackend::Memory),
            _ => Err(QueueBackendParseError),
        }
    }
}

impl fmt::Display for QueueBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueBackend::Amqp => write!(f, "amqp"),
            QueueBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Sets the AMQP broker URL to connect to
    #[arg(short, long, env, default_value = DEFAULT_AMQP_URL)]
    amqp_url: String,

    /// The queue that submitted messages are published to and relayed from
    #[arg(short, long, env, default_value = DEFAULT_QUEUE_NAME)]
    queue_name: String,

    /// Selects the queue backend: a real AMQP broker or an in-process queue
    #[arg(
        long,
        env,
        default_value_t = QueueBackend::Amqp,
        value_parser = clap::builder::PossibleValuesParser::new(["AMQP", "MEMORY", "amqp", "memory"])
            .map(|s| s.parse::<QueueBackend>().unwrap()),
    )]
    pub queue_backend: QueueBackend,

    /// Directory of static files served for any path without a route
    #[arg(long, env, default_value = "public")]
    static_dir: String,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn amqp_url(&self) -> &str {
        &self.amqp_url
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn static_dir(&self) -> &str {
        &self.static_dir
    }

    /// The `interface:port` pair the HTTP server binds to.
    pub fn listen_address(&self) -> String {
        format!(
            "{}:{}",
            self.interface.as_deref().unwrap_or("127.0.0.1"),
            self.port
        )
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_broker_and_port_3000() {
        let config = Config::try_parse_from(["queue_relay"]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.queue_backend, QueueBackend::Amqp);
        assert_eq!(config.listen_address(), "127.0.0.1:3000");
        assert_eq!(config.static_dir(), "public");
    }

    #[test]
    fn test_command_line_overrides_defaults() {
        let config = Config::try_parse_from([
            "queue_relay",
            "--amqp-url",
            "amqp://broker:5672/%2f",
            "--queue-name",
            "orders",
            "--queue-backend",
            "memory",
            "--port",
            "8080",
            "--log-level-filter",
            "DEBUG",
            "--runtime-env",
            "production",
        ])
        .unwrap();

        assert_eq!(config.amqp_url(), "amqp://broker:5672/%2f");
        assert_eq!(config.queue_name(), "orders");
        assert_eq!(config.queue_backend, QueueBackend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
        assert!(config.is_production());
    }

    #[test]
    fn test_unknown_queue_backend_is_rejected() {
        assert!(Config::try_parse_from(["queue_relay", "--queue-backend", "kafka"]).is_err());
    }

    #[test]
    fn test_queue_backend_parse_is_case_insensitive() {
        assert_eq!("AMQP".parse::<QueueBackend>(), Ok(QueueBackend::Amqp));
        assert_eq!("Memory".parse::<QueueBackend>(), Ok(QueueBackend::Memory));
        assert_eq!("sqs".parse::<QueueBackend>(), Err(QueueBackendParseError));
    }

    #[test]
    fn test_rust_env_display_round_trips_through_from_str() {
        for env in [RustEnv::Development, RustEnv::Production, RustEnv::Staging] {
            assert_eq!(env.to_string().parse::<RustEnv>(), Ok(env));
        }
    }
}
