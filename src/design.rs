use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueLocation {
    Left,
    Right,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLocation {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueValidity {
    Valid,
    Invalid,
    Neutral,
}

/// Randomised factor values of one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialFactors {
    pub cue_location: CueLocation,
    pub target_location: TargetLocation,
}

impl TrialFactors {
    pub const ALL: [TrialFactors; 6] = [
        Self::new(CueLocation::Left, TargetLocation::Left),
        Self::new(CueLocation::Left, TargetLocation::Right),
        Self::new(CueLocation::Right, TargetLocation::Left),
        Self::new(CueLocation::Right, TargetLocation::Right),
        Self::new(CueLocation::Neutral, TargetLocation::Left),
        Self::new(CueLocation::Neutral, TargetLocation::Right),
    ];

    pub const fn new(cue_location: CueLocation, target_location: TargetLocation) -> Self {
        Self {
            cue_location,
            target_location,
        }
    }

    pub fn validity(&self) -> CueValidity {
        match (self.cue_location, self.target_location) {
            (CueLocation::Neutral, _) => CueValidity::Neutral,
            (CueLocation::Left, TargetLocation::Left)
            | (CueLocation::Right, TargetLocation::Right) => CueValidity::Valid,
            _ => CueValidity::Invalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub blocks: usize,
    pub trials_per_block: usize,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            blocks: 3,
            trials_per_block: 48,
        }
    }
}

/// Builds one block's trial list: as many full factorials as fit, topped up
/// with a random subset of one more, then shuffled.
pub fn block_trials<R: Rng + ?Sized>(trials_per_block: usize, rng: &mut R) -> Vec<TrialFactors> {
    let cells = TrialFactors::ALL.len();
    let mut trials = Vec::with_capacity(trials_per_block);
    for _ in 0..trials_per_block / cells {
        trials.extend_from_slice(&TrialFactors::ALL);
    }
    let mut partial = TrialFactors::ALL;
    partial.shuffle(rng);
    trials.extend_from_slice(&partial[..trials_per_block % cells]);
    trials.shuffle(rng);
    trials
}
