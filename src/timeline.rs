//! Named checkpoints of a trial and the stage machine they drive.
//!
//! A trial's visible state is never stored; it is recomputed from the
//! elapsed time on every frame so the display cannot drift from the clock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const NS_PER_MS: u64 = 1_000_000;

/// Longest offset or timeout a trial may use: one day.
pub const MAX_OFFSET_MS: u64 = 24 * 60 * 60 * 1000;

/// Checkpoint labels in the only order they may appear in a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointLabel {
    FixationOn,
    XCrossOn,
    CueOnset,
    CueOffset,
    TargetOnset,
    TargetOffset,
    TrialEnd,
}

impl CheckpointLabel {
    /// Stage that begins when this checkpoint is reached.
    pub fn entered_stage(self) -> TrialStage {
        match self {
            CheckpointLabel::FixationOn => TrialStage::Fixation,
            CheckpointLabel::XCrossOn => TrialStage::PreCue,
            CheckpointLabel::CueOnset => TrialStage::CueActive,
            CheckpointLabel::CueOffset => TrialStage::PostCue,
            CheckpointLabel::TargetOnset => TrialStage::TargetActive,
            CheckpointLabel::TargetOffset => TrialStage::PostTarget,
            CheckpointLabel::TrialEnd => TrialStage::Complete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointLabel::FixationOn => "fixation_on",
            CheckpointLabel::XCrossOn => "x_cross_on",
            CheckpointLabel::CueOnset => "cue_onset",
            CheckpointLabel::CueOffset => "cue_offset",
            CheckpointLabel::TargetOnset => "target_onset",
            CheckpointLabel::TargetOffset => "target_offset",
            CheckpointLabel::TrialEnd => "trial_end",
        }
    }
}

impl std::fmt::Display for CheckpointLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trial state machine stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrialStage {
    PreFixation,
    Fixation,
    PreCue,
    CueActive,
    PostCue,
    TargetActive,
    PostTarget,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub label: CheckpointLabel,
    pub offset_ms: u64,
}

impl Checkpoint {
    pub const fn new(label: CheckpointLabel, offset_ms: u64) -> Self {
        Self { label, offset_ms }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimelineError {
    #[error("timeline has no checkpoints")]
    Empty,
    #[error("checkpoint {label} at {offset_ms} ms does not come after {previous_ms} ms")]
    NotIncreasing {
        label: CheckpointLabel,
        offset_ms: u64,
        previous_ms: u64,
    },
    #[error("checkpoint {label} cannot follow {after}")]
    OutOfOrder {
        label: CheckpointLabel,
        after: CheckpointLabel,
    },
    #[error("timeline must end with trial_end")]
    MissingTrialEnd,
    #[error("checkpoint {0} is required but missing")]
    MissingCheckpoint(CheckpointLabel),
    #[error("checkpoint {label} at {offset_ms} ms exceeds the {max_ms} ms limit")]
    OffsetOutOfRange {
        label: CheckpointLabel,
        offset_ms: u64,
        max_ms: u64,
    },
    #[error("response timeout of {timeout_ms} ms exceeds the {max_ms} ms limit")]
    TimeoutOutOfRange { timeout_ms: u64, max_ms: u64 },
    #[error("response window closes at {deadline_ms} ms, after trial_end at {trial_end_ms} ms")]
    ResponseWindowOverrun { deadline_ms: u64, trial_end_ms: u64 },
}

/// One half-open span of trial-relative time. The last span has no end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub stage: TrialStage,
    pub start_ms: u64,
    pub end_ms: Option<u64>,
}

impl Interval {
    pub fn contains(&self, t_ms: u64) -> bool {
        t_ms >= self.start_ms && self.end_ms.map_or(true, |end| t_ms < end)
    }
}

/// Validated checkpoint list with offsets relative to trial start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSpec {
    checkpoints: Vec<Checkpoint>,
}

impl TimelineSpec {
    pub fn new(checkpoints: Vec<Checkpoint>) -> Result<Self, TimelineError> {
        let Some(last) = checkpoints.last() else {
            return Err(TimelineError::Empty);
        };
        if last.label != CheckpointLabel::TrialEnd {
            return Err(TimelineError::MissingTrialEnd);
        }
        for pair in checkpoints.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.label <= prev.label {
                return Err(TimelineError::OutOfOrder {
                    label: next.label,
                    after: prev.label,
                });
            }
            if next.offset_ms <= prev.offset_ms {
                return Err(TimelineError::NotIncreasing {
                    label: next.label,
                    offset_ms: next.offset_ms,
                    previous_ms: prev.offset_ms,
                });
            }
        }
        let spec = Self { checkpoints };
        spec.check_range()?;
        Ok(spec)
    }

    /// Rejects offsets too large to anchor as nanosecond timestamps.
    pub fn check_range(&self) -> Result<(), TimelineError> {
        match self.checkpoints.iter().find(|c| c.offset_ms > MAX_OFFSET_MS) {
            Some(c) => Err(TimelineError::OffsetOutOfRange {
                label: c.label,
                offset_ms: c.offset_ms,
                max_ms: MAX_OFFSET_MS,
            }),
            None => Ok(()),
        }
    }

    /// Fixation, X-cross, peripheral cue, then the detection target which
    /// stays up until the response window closes.
    pub fn cued(response_timeout_ms: u64) -> Self {
        use CheckpointLabel::*;
        Self {
            checkpoints: vec![
                Checkpoint::new(FixationOn, 0),
                Checkpoint::new(XCrossOn, 100),
                Checkpoint::new(CueOnset, 500),
                Checkpoint::new(CueOffset, 600),
                Checkpoint::new(TargetOnset, 700),
                Checkpoint::new(TrialEnd, response_timeout_ms.saturating_add(700)),
            ],
        }
    }

    /// Target display from the first frame until the response window closes.
    pub fn target_only(response_timeout_ms: u64) -> Self {
        Self {
            checkpoints: vec![
                Checkpoint::new(CheckpointLabel::TargetOnset, 0),
                Checkpoint::new(CheckpointLabel::TrialEnd, response_timeout_ms),
            ],
        }
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn offset_of(&self, label: CheckpointLabel) -> Option<u64> {
        self.checkpoints
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.offset_ms)
    }

    pub fn trial_end_ms(&self) -> u64 {
        // validated: the last checkpoint is always trial_end
        self.checkpoints.last().map_or(0, |c| c.offset_ms)
    }

    /// All spans from trial start onward, in order.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut spans = Vec::with_capacity(self.checkpoints.len() + 1);
        if let Some(first) = self.checkpoints.first() {
            if first.offset_ms > 0 {
                spans.push(Interval {
                    stage: TrialStage::PreFixation,
                    start_ms: 0,
                    end_ms: Some(first.offset_ms),
                });
            }
        }
        for (i, c) in self.checkpoints.iter().enumerate() {
            spans.push(Interval {
                stage: c.label.entered_stage(),
                start_ms: c.offset_ms,
                end_ms: self.checkpoints.get(i + 1).map(|n| n.offset_ms),
            });
        }
        spans
    }

    /// Stage active `t_ms` after trial start.
    pub fn stage_at_ms(&self, t_ms: u64) -> TrialStage {
        self.checkpoints
            .iter()
            .rev()
            .find(|c| c.offset_ms <= t_ms)
            .map_or(TrialStage::PreFixation, |c| c.label.entered_stage())
    }

    /// Fixes the relative offsets to an absolute trial start.
    pub fn anchor(&self, start_ns: u64) -> Timeline {
        Timeline {
            start_ns,
            spec: self.clone(),
        }
    }
}

/// Timeline of a running trial, anchored at its start timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    start_ns: u64,
    spec: TimelineSpec,
}

impl Timeline {
    pub fn start_ns(&self) -> u64 {
        self.start_ns
    }

    pub fn elapsed_ms(&self, now_ns: u64) -> u64 {
        now_ns.saturating_sub(self.start_ns) / NS_PER_MS
    }

    pub fn at(&self, label: CheckpointLabel) -> Option<u64> {
        self.spec
            .offset_of(label)
            .map(|ms| self.start_ns.saturating_add(ms.saturating_mul(NS_PER_MS)))
    }

    pub fn end_ns(&self) -> u64 {
        self.start_ns
            .saturating_add(self.spec.trial_end_ms().saturating_mul(NS_PER_MS))
    }

    pub fn stage_at(&self, now_ns: u64) -> TrialStage {
        self.spec.stage_at_ms(self.elapsed_ms(now_ns))
    }

    pub fn is_before(&self, now_ns: u64, label: CheckpointLabel) -> bool {
        self.at(label).is_some_and(|t| now_ns < t)
    }

    pub fn is_after(&self, now_ns: u64, label: CheckpointLabel) -> bool {
        self.at(label).is_some_and(|t| now_ns >= t)
    }

    pub fn is_between(&self, now_ns: u64, from: CheckpointLabel, to: CheckpointLabel) -> bool {
        self.is_after(now_ns, from) && self.is_before(now_ns, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CheckpointLabel::*;

    #[test]
    fn rejects_empty_and_unterminated_timelines() {
        assert_eq!(TimelineSpec::new(vec![]), Err(TimelineError::Empty));
        assert_eq!(
            TimelineSpec::new(vec![Checkpoint::new(FixationOn, 0)]),
            Err(TimelineError::MissingTrialEnd)
        );
    }

    #[test]
    fn rejects_repeated_offsets() {
        let err = TimelineSpec::new(vec![
            Checkpoint::new(FixationOn, 0),
            Checkpoint::new(XCrossOn, 100),
            Checkpoint::new(CueOnset, 100),
            Checkpoint::new(TrialEnd, 900),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TimelineError::NotIncreasing {
                label: CueOnset,
                offset_ms: 100,
                previous_ms: 100
            }
        );
    }

    #[test]
    fn rejects_backward_transitions() {
        let err = TimelineSpec::new(vec![
            Checkpoint::new(CueOnset, 0),
            Checkpoint::new(FixationOn, 100),
            Checkpoint::new(TrialEnd, 900),
        ])
        .unwrap_err();
        assert!(matches!(err, TimelineError::OutOfOrder { label: FixationOn, .. }));
    }

    #[test]
    fn rejects_offsets_beyond_one_day() {
        let err = TimelineSpec::new(vec![
            Checkpoint::new(TargetOnset, 0),
            Checkpoint::new(TrialEnd, u64::MAX),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TimelineError::OffsetOutOfRange {
                label: TrialEnd,
                offset_ms: u64::MAX,
                max_ms: MAX_OFFSET_MS
            }
        );

        let huge = TimelineSpec::cued(u64::MAX);
        assert_eq!(huge.trial_end_ms(), u64::MAX);
        assert!(huge.check_range().is_err());
        assert_eq!(huge.anchor(5).end_ns(), u64::MAX);
    }

    #[test]
    fn presets_are_valid() {
        for spec in [TimelineSpec::cued(5000), TimelineSpec::target_only(1700)] {
            assert!(TimelineSpec::new(spec.checkpoints().to_vec()).is_ok());
        }
        assert_eq!(TimelineSpec::cued(5000).trial_end_ms(), 5700);
        assert_eq!(TimelineSpec::target_only(1700).trial_end_ms(), 1700);
    }

    #[test]
    fn intervals_cover_the_trial_without_overlap() {
        let spec = TimelineSpec::new(vec![
            Checkpoint::new(FixationOn, 50),
            Checkpoint::new(XCrossOn, 100),
            Checkpoint::new(CueOnset, 500),
            Checkpoint::new(CueOffset, 600),
            Checkpoint::new(TargetOnset, 650),
            Checkpoint::new(TargetOffset, 750),
            Checkpoint::new(TrialEnd, 2000),
        ])
        .unwrap();
        let spans = spec.intervals();
        for t in 0..=spec.trial_end_ms() {
            let hits: Vec<_> = spans.iter().filter(|s| s.contains(t)).collect();
            assert_eq!(hits.len(), 1, "t = {t}");
            assert_eq!(hits[0].stage, spec.stage_at_ms(t), "t = {t}");
        }
    }

    #[test]
    fn stages_only_move_forward() {
        let spec = TimelineSpec::cued(5000);
        let mut last = TrialStage::PreFixation;
        for t in (0..6000).step_by(7) {
            let stage = spec.stage_at_ms(t);
            assert!(stage >= last);
            last = stage;
        }
        assert_eq!(last, TrialStage::Complete);
    }

    #[test]
    fn anchored_timeline_answers_checkpoint_queries() {
        let start = 3 * NS_PER_MS;
        let timeline = TimelineSpec::cued(5000).anchor(start);
        let t = start + 550 * NS_PER_MS;

        assert_eq!(timeline.stage_at(t), TrialStage::CueActive);
        assert!(timeline.is_between(t, CueOnset, CueOffset));
        assert!(timeline.is_before(t, TargetOnset));
        assert!(timeline.is_after(t, XCrossOn));
        assert!(!timeline.is_after(t, TargetOffset));
        assert_eq!(timeline.end_ns(), start + 5700 * NS_PER_MS);
        assert_eq!(timeline.stage_at(start - 1), TrialStage::Fixation);
    }

    #[test]
    fn boundaries_belong_to_the_later_interval() {
        let spec = TimelineSpec::cued(5000);
        assert_eq!(spec.stage_at_ms(99), TrialStage::Fixation);
        assert_eq!(spec.stage_at_ms(100), TrialStage::PreCue);
        assert_eq!(spec.stage_at_ms(5699), TrialStage::TargetActive);
        assert_eq!(spec.stage_at_ms(5700), TrialStage::Complete);
    }
}
