// Configuration loading and parsing (repair.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// repair.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire repair.toml file.
#[derive(Debug, Clone, Deserialize)]
struct RepairFile {
    log: LogConfig,
    models: ModelPaths,
    export: ExportConfig,
    #[serde(rename = "pass")]
    passes: Vec<PassConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Event attributes never analyzed, by exact key.
    pub ignore_attributes: Vec<String>,
    /// Event attributes never analyzed, by key prefix (segment before the
    /// first `:`). Audit attributes from earlier runs go here.
    pub ignore_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPaths {
    pub embeddings: String,
    pub lexicon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub output_prefix: String,
}

/// One analysis pass: a name, the scorer options it runs, and a threshold.
/// Passes with more than one option combine their matrices by elementwise
/// max and use a fixed threshold instead of the configured one.
#[derive(Debug, Clone, Deserialize)]
pub struct PassConfig {
    pub name: String,
    pub options: Vec<String>,
    pub threshold: f64,
}

/// The assembled configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    pub models: ModelPaths,
    pub export: ExportConfig,
    pub passes: Vec<PassConfig>,
}

/// Scorer option names accepted in `pass.options`.
pub const KNOWN_OPTIONS: &[&str] = &["leven", "mean", "difference", "maxpair", "aligned"];

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/repair.toml` relative to the
/// given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let repair_path = base_dir.join("config").join("repair.toml");
    let repair_text = read_file(&repair_path)?;
    let repair_file: RepairFile =
        toml::from_str(&repair_text).map_err(|e| ConfigError::ParseError {
            path: repair_path.clone(),
            source: e,
        })?;

    let config = Config {
        log: repair_file.log,
        models: repair_file.models,
        export: repair_file.export,
        passes: repair_file.passes,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        // If config/ also doesn't exist, the app will fail to load config.
        // Return an error with a clear message about the missing defaults directory.
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        // Skip .example template files
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, skip it
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.passes.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "pass".into(),
            message: "at least one analysis pass must be configured".into(),
        });
    }

    for (idx, pass) in config.passes.iter().enumerate() {
        if pass.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("pass[{idx}].name"),
                message: "must not be empty".into(),
            });
        }

        if pass.options.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("pass[{idx}].options"),
                message: "must name at least one scorer option".into(),
            });
        }

        for option in &pass.options {
            if !KNOWN_OPTIONS.contains(&option.as_str()) {
                return Err(ConfigError::ValidationError {
                    field: format!("pass[{idx}].options"),
                    message: format!(
                        "unknown scorer option `{option}` (expected one of {KNOWN_OPTIONS:?})"
                    ),
                });
            }
        }

        if !(0.0..=1.0).contains(&pass.threshold) {
            return Err(ConfigError::ValidationError {
                field: format!("pass[{idx}].threshold"),
                message: format!(
                    "must be between 0.0 and 1.0 inclusive, got {}",
                    pass.threshold
                ),
            });
        }
    }

    if config.models.embeddings.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "models.embeddings".into(),
            message: "must not be empty".into(),
        });
    }

    if config.models.lexicon.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "models.lexicon".into(),
            message: "must not be empty".into(),
        });
    }

    if config.export.output_prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "export.output_prefix".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
