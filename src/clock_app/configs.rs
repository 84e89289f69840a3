use agentic_clock::clock::ClockConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockAppConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    /// Recorded once through the lifecycle sink when the view appears
    #[serde(default = "ClockAppConfig::default_launch_message")]
    pub launch_message: String,
    /// Exit after this many seconds; runs until interrupted when unset
    #[serde(default)]
    pub run_for_secs: Option<u64>,
    /// CSV export of every delivered tick
    #[serde(default)]
    pub output_filepath: Option<String>,
    /// JSON dump of the effective config
    #[serde(default)]
    pub summary_filepath: Option<String>,
}

impl ClockAppConfig {
    /// Reads the TOML file named by `CONFIG_FILE` when set, then applies
    /// `AGENTIC_CLOCK_*` environment overrides (`__` separates nested keys).
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Ok(config_file) = std::env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("AGENTIC_CLOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let app: Self = config.try_deserialize()?;
        app.clock.validate()?;
        Ok(app)
    }

    fn default_launch_message() -> String {
        "clock view appeared".to_string()
    }
}
