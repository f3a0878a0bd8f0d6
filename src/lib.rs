pub mod composition;
pub mod config;
pub mod design;
pub mod experiment;
pub mod geometry;
pub mod renderer;
pub mod response;
pub mod results;
pub mod stimulus;
pub mod timeline;
pub mod timer;
pub mod trial;

pub use composition::{Display, Draw};
pub use config::{ConfigError, ExperimentConfig, TrialVariant};
pub use design::{CueLocation, TargetLocation, TrialFactors};
pub use experiment::{ExperimentState, SessionPhase, Tick};
pub use geometry::{Point, ScreenGeometry};
pub use response::{ResponseConfig, ResponseLabel};
pub use results::{JsonFileSink, MemorySink, ResultSink, Summary};
pub use stimulus::{Anchor, StimulusCatalog, StimulusId, StimulusType};
pub use timeline::{Checkpoint, CheckpointLabel, TimelineSpec, TrialStage};
pub use trial::{TrialDefinition, TrialOutcome, TrialRun};
