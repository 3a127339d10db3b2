use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub converter: ToolConfig,
}

/// Settings for the external dwg2dxf binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub binary_path: String,
    pub timeout_secs: u64,
}

impl ToolConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConverterConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ConverterConfig {
            common: common_config,
            converter: ToolConfig {
                binary_path: get_env("CONVERTER_BINARY", Some("/usr/local/bin/dwg2dxf"), is_prod)?,
                timeout_secs: get_env("CONVERTER_TIMEOUT_SECS", Some("300"), is_prod)?
                    .parse()
                    .map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!(
                            "CONVERTER_TIMEOUT_SECS must be a number of seconds: {}",
                            e
                        ))
                    })?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
