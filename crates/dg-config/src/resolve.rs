//! Config resolution.
//!
//! Order: explicit `--config` file, then the `DG_CONFIG` environment
//! variable, then a named preset, then the `quick` preset.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fleet::FleetConfig;
use crate::preset::{get_preset, PresetName};
use crate::validate::ValidationError;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "DG_CONFIG";

/// Where the resolved config came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    CliFile(PathBuf),
    EnvFile(PathBuf),
    Preset(PresetName),
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CliFile(p) => write!(f, "file {}", p.display()),
            ConfigSource::EnvFile(p) => write!(f, "{} {}", CONFIG_ENV_VAR, p.display()),
            ConfigSource::Preset(name) => write!(f, "preset {}", name),
            ConfigSource::Default => write!(f, "default preset {}", PresetName::Quick),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: FleetConfig,
    pub source: ConfigSource,
}

/// Resolve and validate the fleet config using the process environment.
pub fn resolve_config(
    cli_path: Option<&Path>,
    preset: Option<&str>,
) -> Result<ResolvedConfig, ValidationError> {
    let env_path = std::env::var_os(CONFIG_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    resolve_config_with(cli_path, env_path.as_deref(), preset)
}

/// Resolve with an explicit env value instead of reading the environment.
pub fn resolve_config_with(
    cli_path: Option<&Path>,
    env_path: Option<&Path>,
    preset: Option<&str>,
) -> Result<ResolvedConfig, ValidationError> {
    let (config, source) = if let Some(path) = cli_path {
        (FleetConfig::from_file(path)?, ConfigSource::CliFile(path.to_path_buf()))
    } else if let Some(path) = env_path {
        (FleetConfig::from_file(path)?, ConfigSource::EnvFile(path.to_path_buf()))
    } else if let Some(name) = preset {
        let name: PresetName = name.parse()?;
        (get_preset(name), ConfigSource::Preset(name))
    } else {
        (get_preset(PresetName::Quick), ConfigSource::Default)
    };

    config.validate()?;
    debug!(source = %source, workers = config.workers.len(), "resolved fleet config");
    Ok(ResolvedConfig { config, source })
}
