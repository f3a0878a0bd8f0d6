//! Experiment lifecycle as plain functions over an explicit state.
//!
//! The application's frame loop calls, in order: [`setup`] once,
//! [`begin_block`] when the participant is ready, then [`tick`] every
//! frame and [`handle_key`] on every keypress. `tick` prepares, runs and
//! cleans up trials on its own. [`clean_up`] closes the session.

use crate::composition::{Display, Draw};
use crate::config::{ConfigError, ExperimentConfig};
use crate::design::{block_trials, TrialFactors};
use crate::geometry::ScreenGeometry;
use crate::response::ResponseLabel;
use crate::results::{ResultSink, Summary};
use crate::stimulus::StimulusCatalog;
use crate::timeline::TrialStage;
use crate::trial::{TrialDefinition, TrialOutcome, TrialRun, TrialStatus};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Between blocks; waiting for the participant.
    AwaitingBlock,
    InTrial,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Idle,
    Running(TrialStage),
    TrialFinished(TrialOutcome),
}

/// Everything the session owns between frames
pub struct ExperimentState {
    pub config: ExperimentConfig,
    pub catalog: StimulusCatalog,
    pub definition: TrialDefinition,
    pub phase: SessionPhase,
    /// 1-based; 0 until the first block begins.
    pub block_num: usize,
    /// 1-based within the block; 0 until its first trial.
    pub trial_num: usize,
    pub outcomes: Vec<TrialOutcome>,
    block_trials: Vec<TrialFactors>,
    current: Option<TrialRun>,
    sink: Box<dyn ResultSink>,
    rng: StdRng,
}

impl ExperimentState {
    pub fn current_trial(&self) -> Option<&TrialRun> {
        self.current.as_ref()
    }

    pub fn blocks_remaining(&self) -> usize {
        self.config.design.blocks.saturating_sub(self.block_num)
    }

    /// Draw list for the frame shown at `now_ns`.
    pub fn composition(&self, now_ns: u64) -> &'static [Draw] {
        match (self.phase, &self.current) {
            (SessionPhase::InTrial, Some(trial)) => trial.composition(now_ns),
            (SessionPhase::Finished, _) => &[],
            _ => Display::Fixation.composition(),
        }
    }

    /// Rebuilds the catalog for a new window size.
    pub fn resize(&mut self, geometry: &ScreenGeometry) {
        self.catalog = StimulusCatalog::build(geometry, &self.config.stimuli);
    }
}

pub fn setup(
    config: ExperimentConfig,
    geometry: &ScreenGeometry,
    sink: Box<dyn ResultSink>,
) -> Result<ExperimentState, ConfigError> {
    config.validate()?;
    let definition = config.trial_definition()?;
    let catalog = StimulusCatalog::build(geometry, &config.stimuli);
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    log::info!(
        "Experiment set up: {} blocks x {} trials, {:?} variant, {:.1} px/deg",
        config.design.blocks,
        config.design.trials_per_block,
        config.variant,
        geometry.pixels_per_degree(),
    );

    Ok(ExperimentState {
        config,
        catalog,
        definition,
        phase: SessionPhase::AwaitingBlock,
        block_num: 0,
        trial_num: 0,
        outcomes: Vec::new(),
        block_trials: Vec::new(),
        current: None,
        sink,
        rng,
    })
}

/// Starts the next block and its first trial. Returns false when there is
/// no block left or a block is already running.
pub fn begin_block(state: &mut ExperimentState, now_ns: u64) -> bool {
    if state.phase != SessionPhase::AwaitingBlock || state.blocks_remaining() == 0 {
        return false;
    }
    state.block_num += 1;
    state.trial_num = 0;
    state.block_trials = block_trials(state.config.design.trials_per_block, &mut state.rng);
    log::info!(
        "Block {}/{} started",
        state.block_num,
        state.config.design.blocks
    );
    prepare_trial(state, now_ns)
}

/// Starts the next trial of the current block at `now_ns`.
pub fn prepare_trial(state: &mut ExperimentState, now_ns: u64) -> bool {
    let Some(factors) = state.block_trials.get(state.trial_num).copied() else {
        return false;
    };
    state.trial_num += 1;
    state.current = Some(TrialRun::start(
        &state.definition,
        state.block_num,
        state.trial_num,
        factors,
        now_ns,
    ));
    state.phase = SessionPhase::InTrial;
    log::debug!(
        "Trial {}.{} started at {} ns: cue {:?}, target {:?}",
        state.block_num,
        state.trial_num,
        now_ns,
        factors.cue_location,
        factors.target_location
    );
    true
}

/// Advances the session to `now_ns`. A finished trial is cleaned up and the
/// next one prepared before returning. A sink error is returned only after
/// the session has moved on, so the next tick continues normally.
pub fn tick(state: &mut ExperimentState, now_ns: u64) -> Result<Tick> {
    let Some(trial) = &state.current else {
        return Ok(Tick::Idle);
    };
    match trial.poll(now_ns) {
        TrialStatus::Running(stage) => Ok(Tick::Running(stage)),
        TrialStatus::Finished(outcome) => {
            let recorded = trial_clean_up(state, &outcome);
            if !prepare_trial(state, now_ns) {
                state.phase = if state.blocks_remaining() > 0 {
                    log::info!("Block {} complete, press SPACE to continue", state.block_num);
                    SessionPhase::AwaitingBlock
                } else {
                    SessionPhase::Finished
                };
            }
            recorded?;
            Ok(Tick::TrialFinished(outcome))
        }
    }
}

pub fn handle_key(state: &mut ExperimentState, key: &str, at_ns: u64) -> Option<ResponseLabel> {
    let label = state.current.as_mut()?.handle_key(key, at_ns)?;
    log::debug!("Response {:?} recorded at {} ns", label, at_ns);
    Some(label)
}

/// Retires the current trial. The outcome is kept in `outcomes` even when
/// the sink rejects it.
pub fn trial_clean_up(state: &mut ExperimentState, outcome: &TrialOutcome) -> Result<()> {
    state.current = None;
    state.outcomes.push(outcome.clone());
    match outcome.reaction_time {
        Some(rt) => log::info!(
            "Trial {}.{}: {:?} after {:.3} ms",
            outcome.block_num,
            outcome.trial_num,
            outcome.response,
            rt
        ),
        None => log::info!("Trial {}.{}: miss", outcome.block_num, outcome.trial_num),
    }
    state.sink.record(outcome).with_context(|| {
        format!(
            "failed to record trial {}.{}",
            outcome.block_num, outcome.trial_num
        )
    })
}

/// Flushes the result sink and summarises the session. Safe to call with
/// a trial still running; that trial is discarded.
pub fn clean_up(state: &mut ExperimentState) -> Result<Summary> {
    if state.current.take().is_some() {
        log::warn!("Session ended during a trial; the unfinished trial is not saved");
    }
    state.phase = SessionPhase::Finished;
    state.sink.finish()?;
    let summary = Summary::from_outcomes(&state.outcomes);
    summary.log();
    Ok(summary)
}
