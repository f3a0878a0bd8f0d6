use crate::design::DesignConfig;
use crate::response::ResponseConfig;
use crate::stimulus::StimulusSizes;
use crate::timeline::{Checkpoint, TimelineError, TimelineSpec};
use crate::trial::TrialDefinition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid trial timeline: {0}")]
    Timeline(#[from] TimelineError),
    #[error("design needs at least one block and one trial per block")]
    EmptyDesign,
    #[error("display width and viewing distance must be positive")]
    InvalidDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialVariant {
    #[default]
    Cued,
    TargetOnly,
}

/// Physical setup used for visual-angle conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width_mm: f32,
    pub viewing_distance_mm: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width_mm: 530.0,
            viewing_distance_mm: 570.0,
        }
    }
}

/// Experiment configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub display: DisplayConfig,
    pub stimuli: StimulusSizes,
    pub design: DesignConfig,
    pub variant: TrialVariant,
    /// Replaces the variant's checkpoints when set.
    pub timeline: Option<Vec<Checkpoint>>,
    /// Replaces the variant's response phase when set.
    pub response: Option<ResponseConfig>,
    pub results_path: PathBuf,
    /// Fixed seed for the trial order; random when absent.
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            stimuli: StimulusSizes::default(),
            design: DesignConfig::default(),
            variant: TrialVariant::default(),
            timeline: None,
            response: None,
            results_path: PathBuf::from("exo_cuing_results.json"),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.design.blocks == 0 || self.design.trials_per_block == 0 {
            return Err(ConfigError::EmptyDesign);
        }
        if self.display.width_mm <= 0.0 || self.display.viewing_distance_mm <= 0.0 {
            return Err(ConfigError::InvalidDisplay);
        }
        self.trial_definition()?;
        Ok(())
    }

    /// Resolves the variant preset and any overrides into one definition.
    pub fn trial_definition(&self) -> Result<TrialDefinition, ConfigError> {
        let preset = match self.variant {
            TrialVariant::Cued => TrialDefinition::cued(),
            TrialVariant::TargetOnly => TrialDefinition::target_only(),
        };
        if self.timeline.is_none() && self.response.is_none() {
            return Ok(preset);
        }

        let response = self
            .response
            .clone()
            .unwrap_or_else(|| preset.response().clone());
        let timeline = match &self.timeline {
            Some(checkpoints) => TimelineSpec::new(checkpoints.clone())?,
            None => match self.variant {
                TrialVariant::Cued => TimelineSpec::cued(response.timeout_ms),
                TrialVariant::TargetOnly => TimelineSpec::target_only(response.timeout_ms),
            },
        };
        Ok(TrialDefinition::new(timeline, response)?)
    }
}
