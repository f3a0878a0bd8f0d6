use crate::composition::{Display, Draw};
use crate::design::{CueLocation, TargetLocation, TrialFactors};
use crate::response::{Response, ResponseCollector, ResponseConfig, ResponseLabel};
use crate::timeline::{Timeline, TimelineError, TimelineSpec, TrialStage, MAX_OFFSET_MS};
use serde::{Deserialize, Serialize};

/// Recorded result per trial. Field names are the persisted column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub block_num: usize,
    pub trial_num: usize,
    /// Milliseconds from response-phase start, `None` on a miss.
    pub reaction_time: Option<f64>,
    pub response: Option<ResponseLabel>,
    pub cue_location: CueLocation,
    pub target_location: TargetLocation,
}

impl TrialOutcome {
    pub fn is_miss(&self) -> bool {
        self.response.is_none()
    }

    pub fn factors(&self) -> TrialFactors {
        TrialFactors::new(self.cue_location, self.target_location)
    }
}

/// Checkpoints plus response-phase parameters: everything that differs
/// between trial variants.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialDefinition {
    timeline: TimelineSpec,
    response: ResponseConfig,
}

impl TrialDefinition {
    pub fn new(timeline: TimelineSpec, response: ResponseConfig) -> Result<Self, TimelineError> {
        if response.timeout_ms > MAX_OFFSET_MS {
            return Err(TimelineError::TimeoutOutOfRange {
                timeout_ms: response.timeout_ms,
                max_ms: MAX_OFFSET_MS,
            });
        }
        timeline.check_range()?;
        let start_ms = timeline
            .offset_of(response.starts_at)
            .ok_or(TimelineError::MissingCheckpoint(response.starts_at))?;
        let trial_end_ms = timeline.trial_end_ms();
        // both terms are bounded by MAX_OFFSET_MS
        let deadline_ms = start_ms + response.timeout_ms;
        if deadline_ms > trial_end_ms {
            return Err(TimelineError::ResponseWindowOverrun {
                deadline_ms,
                trial_end_ms,
            });
        }
        Ok(Self { timeline, response })
    }

    /// Full exogenous cuing trial with the extended response window.
    pub fn cued() -> Self {
        let response = ResponseConfig::extended();
        Self {
            timeline: TimelineSpec::cued(response.timeout_ms),
            response,
        }
    }

    /// Detection target only, with the short response window.
    pub fn target_only() -> Self {
        let response = ResponseConfig::short();
        Self {
            timeline: TimelineSpec::target_only(response.timeout_ms),
            response,
        }
    }

    pub fn timeline(&self) -> &TimelineSpec {
        &self.timeline
    }

    pub fn response(&self) -> &ResponseConfig {
        &self.response
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialStatus {
    Running(TrialStage),
    Finished(TrialOutcome),
}

/// State of one trial in progress. Owned by the experiment for the
/// lifetime of the trial and dropped once its outcome is taken.
#[derive(Debug, Clone)]
pub struct TrialRun {
    block_num: usize,
    trial_num: usize,
    factors: TrialFactors,
    timeline: Timeline,
    collector: ResponseCollector,
}

impl TrialRun {
    pub fn start(
        definition: &TrialDefinition,
        block_num: usize,
        trial_num: usize,
        factors: TrialFactors,
        start_ns: u64,
    ) -> Self {
        let timeline = definition.timeline.anchor(start_ns);
        // presence of starts_at is checked in TrialDefinition::new
        let phase_start = timeline
            .at(definition.response.starts_at)
            .unwrap_or(start_ns);
        Self {
            block_num,
            trial_num,
            factors,
            collector: ResponseCollector::new(&definition.response, phase_start),
            timeline,
        }
    }

    pub fn factors(&self) -> TrialFactors {
        self.factors
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn response(&self) -> Option<Response> {
        self.collector.response()
    }

    /// When the trial ended: the earlier of the response phase closing and
    /// the last checkpoint.
    pub fn end_ns(&self, now_ns: u64) -> Option<u64> {
        let timeline_end = (now_ns >= self.timeline.end_ns()).then(|| self.timeline.end_ns());
        match (self.collector.end_ns(now_ns), timeline_end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn stage(&self, now_ns: u64) -> TrialStage {
        if self.end_ns(now_ns).is_some() {
            TrialStage::Complete
        } else {
            self.timeline.stage_at(now_ns)
        }
    }

    pub fn display(&self, now_ns: u64) -> Display {
        Display::for_stage(
            self.stage(now_ns),
            self.factors.cue_location,
            self.factors.target_location,
        )
    }

    pub fn composition(&self, now_ns: u64) -> &'static [Draw] {
        self.display(now_ns).composition()
    }

    pub fn handle_key(&mut self, key: &str, at_ns: u64) -> Option<ResponseLabel> {
        if self.end_ns(at_ns).is_some() {
            return None;
        }
        self.collector.on_key(key, at_ns)
    }

    pub fn poll(&self, now_ns: u64) -> TrialStatus {
        match self.end_ns(now_ns) {
            Some(_) => TrialStatus::Finished(self.outcome()),
            None => TrialStatus::Running(self.timeline.stage_at(now_ns)),
        }
    }

    pub fn outcome(&self) -> TrialOutcome {
        let response = self.collector.response();
        TrialOutcome {
            block_num: self.block_num,
            trial_num: self.trial_num,
            reaction_time: response.map(|r| r.rt_ms()),
            response: response.map(|r| r.label),
            cue_location: self.factors.cue_location,
            target_location: self.factors.target_location,
        }
    }
}
