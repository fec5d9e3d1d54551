use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Open-Meteo forecast endpoint used when `OPEN_METEO_URL` is not set.
pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

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

/// What a campaign stream does once its fixed message list has been sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CampaignMode {
    /// Close the stream after the last message.
    Finite,
    /// Keep the connection open with heartbeat comments after the last message.
    Heartbeat,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CampaignModeParseError;

impl FromStr for CampaignMode {
    type Err = CampaignModeParseError;
    fn from_str(mode: &str) -> Result<CampaignMode, Self::Err> {
        match mode.to_lowercase().as_str() {
            "finite" => Ok(CampaignMode::Finite),
            "heartbeat" => Ok(CampaignMode::Heartbeat),
            _ => Err(CampaignModeParseError),
        }
    }
}

impl fmt::Display for CampaignMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CampaignMode::Finite => write!(f, "finite"),
            CampaignMode::Heartbeat => write!(f, "heartbeat"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to open event streams.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,

    /// The Open-Meteo forecast endpoint polled by weather streams.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_OPEN_METEO_URL)]
    open_meteo_url: String,

    /// Hard timeout in seconds for a single upstream request
    #[arg(long, env, default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// Latitude used when a client omits `lat` or sends a malformed value
    #[arg(long, env, default_value_t = 23.8103)]
    pub default_latitude: f64,

    /// Longitude used when a client omits `lon` or sends a malformed value
    #[arg(long, env, default_value_t = 90.4125)]
    pub default_longitude: f64,

    /// Poll interval in seconds used when a client omits `interval` or sends a malformed value
    #[arg(long, env, default_value_t = 30)]
    pub default_interval_secs: u64,

    /// Smallest poll interval in seconds a client may request. Lower values are raised to this.
    #[arg(long, env, default_value_t = 10)]
    pub min_interval_secs: u64,

    /// Path to a JSON file holding an array of message objects replayed by campaign streams.
    /// A small built-in sequence is used when unset.
    #[arg(long, env)]
    campaign_file: Option<PathBuf>,

    /// Seconds between two campaign messages. At least 1.
    #[arg(
        long,
        env,
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub campaign_interval_secs: u64,

    /// Behaviour of a campaign stream after its last message.
    #[arg(
        long,
        env,
        default_value_t = CampaignMode::Finite,
        value_parser = clap::builder::PossibleValuesParser::new([
            "FINITE", "HEARTBEAT", "finite", "heartbeat"
        ])
            .map(|s| s.parse::<CampaignMode>().unwrap()),
    )]
    pub campaign_mode: CampaignMode,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
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
    /// Builds a configuration from the environment only, ignoring the process
    /// command line, so it is usable from tests and tools.
    fn default() -> Self {
        Config::parse_from([env!("CARGO_PKG_NAME")])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Returns the Open-Meteo forecast endpoint.
    pub fn open_meteo_url(&self) -> &str {
        &self.open_meteo_url
    }

    pub fn set_open_meteo_url(mut self, open_meteo_url: String) -> Self {
        self.open_meteo_url = open_meteo_url;
        self
    }

    /// Returns the campaign message file, if configured.
    pub fn campaign_file(&self) -> Option<PathBuf> {
        self.campaign_file.clone()
    }

    pub fn set_campaign_file(mut self, campaign_file: PathBuf) -> Self {
        self.campaign_file = Some(campaign_file);
        self
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}
