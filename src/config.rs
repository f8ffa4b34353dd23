use std::path::Path;

use crate::ai::QLearningConfig;
use crate::error::ConfigError;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: QLearningConfig,
    pub training: TrainerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if agent.learning_rate <= 0.0 {
            return Err(invalid("agent.learning_rate must be > 0"));
        }
        if !(0.0..=1.0).contains(&agent.gamma) {
            return Err(invalid("agent.gamma must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&agent.epsilon_start) {
            return Err(invalid("agent.epsilon_start must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&agent.epsilon_min) {
            return Err(invalid("agent.epsilon_min must be in [0, 1]"));
        }
        if agent.epsilon_min > agent.epsilon_start {
            return Err(invalid("agent.epsilon_min must be <= agent.epsilon_start"));
        }
        if agent.epsilon_decay <= 0.0 || agent.epsilon_decay > 1.0 {
            return Err(invalid("agent.epsilon_decay must be in (0, 1]"));
        }
        if agent.batch_size == 0 {
            return Err(invalid("agent.batch_size must be > 0"));
        }
        if agent.replay_capacity < agent.batch_size {
            return Err(invalid("agent.replay_capacity must be >= agent.batch_size"));
        }
        if agent.win_rate_window == 0 {
            return Err(invalid("agent.win_rate_window must be > 0"));
        }

        let training = &self.training;
        if training.stages == 0 {
            return Err(invalid("training.stages must be > 0"));
        }
        if training.episodes_per_stage == 0 {
            return Err(invalid("training.episodes_per_stage must be > 0"));
        }
        if training.log_interval == 0 {
            return Err(invalid("training.log_interval must be > 0"));
        }

        Ok(())
    }

    /// Render every default value as TOML, for seeding a config file.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Validation(msg.into())
}
