//! Startup configuration from environment and arguments

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::Level;

pub const DEFAULT_DATASET: &str = "data/dataset.json";

/// How query results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "json" => Ok(OutputMode::Json),
            other => Err(format!("unknown output mode '{}', expected text or json", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dataset: PathBuf,
    pub log_level: Level,
    pub output: OutputMode,
}

impl Config {
    /// Read `UNITCONV_*` variables; a positional argument overrides the dataset path
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok(), env::args().skip(1))
    }

    pub fn from_lookup<F, I>(lookup: F, mut args: I) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
        I: Iterator<Item = String>,
    {
        let dataset = args
            .next()
            .or_else(|| lookup("UNITCONV_DATASET"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));

        let log_level = match lookup("UNITCONV_LOG") {
            Some(level) => Level::from_str(level.trim())
                .map_err(|_| format!("invalid UNITCONV_LOG level '{}'", level))?,
            None => Level::WARN,
        };

        let output = match lookup("UNITCONV_OUTPUT") {
            Some(mode) => mode.parse()?,
            None => OutputMode::default(),
        };

        Ok(Config { dataset, log_level, output })
    }
}
