use crate::design::{CueLocation, TargetLocation};
use crate::stimulus::{Anchor, StimulusId};
use crate::timeline::TrialStage;

/// One stimulus placed at an anchor, centred on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub stimulus: StimulusId,
    pub anchor: Anchor,
}

const fn draw(stimulus: StimulusId, anchor: Anchor) -> Draw {
    Draw { stimulus, anchor }
}

use Anchor::{Center, LeftProbe, RightProbe};
use StimulusId::*;

const FIXATION: &[Draw] = &[
    draw(HorizontalCross, Center),
    draw(VerticalCross, Center),
    draw(ProbeCircle, LeftProbe),
    draw(ProbeCircle, RightProbe),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
];

const PRE_CUE: &[Draw] = &[
    draw(XCrossA, Center),
    draw(XCrossB, Center),
    draw(ProbeCircle, LeftProbe),
    draw(ProbeCircle, RightProbe),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
];

const LEFT_CUE: &[Draw] = &[
    draw(XCrossA, Center),
    draw(XCrossB, Center),
    draw(ProbeCircle, RightProbe),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
    draw(Cue, LeftProbe),
];

const RIGHT_CUE: &[Draw] = &[
    draw(XCrossA, Center),
    draw(XCrossB, Center),
    draw(ProbeCircle, LeftProbe),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
    draw(Cue, RightProbe),
];

const NEUTRAL_CUE: &[Draw] = &[
    draw(XCrossA, Center),
    draw(XCrossB, Center),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
    draw(Cue, LeftProbe),
    draw(Cue, RightProbe),
];

const LEFT_TARGET: &[Draw] = &[
    draw(XCrossA, Center),
    draw(XCrossB, Center),
    draw(ProbeCircle, LeftProbe),
    draw(ProbeCircle, RightProbe),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
    draw(Target, LeftProbe),
];

const RIGHT_TARGET: &[Draw] = &[
    draw(XCrossA, Center),
    draw(XCrossB, Center),
    draw(ProbeCircle, LeftProbe),
    draw(ProbeCircle, RightProbe),
    draw(InnerCircle, LeftProbe),
    draw(InnerCircle, RightProbe),
    draw(Target, RightProbe),
];

/// Screens a trial can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Fixation,
    PreCue,
    Cue(CueLocation),
    Target(TargetLocation),
}

impl Display {
    /// Stages without a screen of their own fall back to the pre-cue display.
    pub fn for_stage(stage: TrialStage, cue: CueLocation, target: TargetLocation) -> Self {
        match stage {
            TrialStage::Fixation => Display::Fixation,
            TrialStage::CueActive => Display::Cue(cue),
            TrialStage::TargetActive => Display::Target(target),
            _ => Display::PreCue,
        }
    }

    /// Draw list in back-to-front order.
    pub fn composition(self) -> &'static [Draw] {
        match self {
            Display::Fixation => FIXATION,
            Display::PreCue => PRE_CUE,
            Display::Cue(CueLocation::Left) => LEFT_CUE,
            Display::Cue(CueLocation::Right) => RIGHT_CUE,
            Display::Cue(CueLocation::Neutral) => NEUTRAL_CUE,
            Display::Target(TargetLocation::Left) => LEFT_TARGET,
            Display::Target(TargetLocation::Right) => RIGHT_TARGET,
        }
    }
}
