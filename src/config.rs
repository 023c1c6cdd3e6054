use crate::stages::StageKind;
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "codoscope.toml";

pub const DEFAULT_PANEL_HEIGHT: usize = 12;

pub const DEFAULT_STAGES: [StageKind; 5] = [
    StageKind::Source,
    StageKind::Tokens,
    StageKind::Ast,
    StageKind::PseudoIr,
    StageKind::Bytecode,
];

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {}", .path.display())]
    #[diagnostic(code(codoscope::config::io))]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("invalid configuration in {}: {message}", .path.display())]
    #[diagnostic(code(codoscope::config::parse))]
    Parse { path: PathBuf, message: String },
    #[error("unknown stage `{name}`")]
    #[diagnostic(
        code(codoscope::config::unknown_stage),
        help("known stages: source, tokens, ast, ast-opt, pseudo-ir, ir-opt, bytecode")
    )]
    UnknownStage { name: String },
    #[error("no stages selected")]
    #[diagnostic(
        code(codoscope::config::empty_stages),
        help("name at least one stage, e.g. `source,tokens`")
    )]
    EmptyStageList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub stages: Vec<StageKind>,
    pub panel_height: usize,
    /// Default log directive, used when no log env var is set.
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stages: DEFAULT_STAGES.to_vec(),
            panel_height: DEFAULT_PANEL_HEIGHT,
            log_level: None,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    panels: RawPanels,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawPanels {
    stages: Option<Vec<String>>,
    height: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawLogging {
    level: Option<String>,
}

impl Config {
    /// Loads `explicit` if given, else the default file if it exists in
    /// `dir`, else the built-in defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            tracing::debug!("no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let config = Self::parse(&content).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), stages = config.stages.len(), "configuration loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|error| ConfigError::Parse {
            path: PathBuf::new(),
            message: error.to_string(),
        })?;
        let mut config = Self::default();
        if let Some(names) = raw.panels.stages {
            config.stages = parse_stage_list(names.iter().map(String::as_str))?;
        }
        if let Some(height) = raw.panels.height {
            config.panel_height = height.max(1);
        }
        config.log_level = raw.logging.level;
        Ok(config)
    }

    /// Replaces the stage list with a comma separated override.
    pub fn override_stages(&mut self, list: &str) -> Result<(), ConfigError> {
        self.stages = parse_stage_list(list.split(',').filter(|name| !name.trim().is_empty()))?;
        Ok(())
    }
}

fn parse_stage_list<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<StageKind>, ConfigError> {
    let mut stages = Vec::new();
    for name in names {
        let kind = name
            .parse::<StageKind>()
            .map_err(|err| ConfigError::UnknownStage { name: err.0 })?;
        if !stages.contains(&kind) {
            stages.push(kind);
        }
    }
    if stages.is_empty() {
        return Err(ConfigError::EmptyStageList);
    }
    Ok(stages)
}
