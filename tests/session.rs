use exo_cuing::design::DesignConfig;
use exo_cuing::experiment::{self, SessionPhase, Tick};
use exo_cuing::{
    Anchor, CueLocation, Display, ExperimentConfig, JsonFileSink, MemorySink, ResponseLabel,
    ScreenGeometry, StimulusId, TrialStage, TrialVariant,
};

const MS: u64 = 1_000_000;

fn geometry() -> ScreenGeometry {
    ScreenGeometry::new(1920, 1080, 530.0, 570.0)
}

fn config(variant: TrialVariant, blocks: usize, trials_per_block: usize) -> ExperimentConfig {
    ExperimentConfig {
        variant,
        design: DesignConfig {
            blocks,
            trials_per_block,
        },
        seed: Some(2024),
        ..ExperimentConfig::default()
    }
}

#[test]
fn cued_session_runs_every_trial_and_renders_cue_on_its_side() {
    let mut state = experiment::setup(
        config(TrialVariant::Cued, 2, 6),
        &geometry(),
        Box::new(MemorySink::default()),
    )
    .unwrap();

    let mut now = 0;
    for block in 1..=2 {
        assert_eq!(state.phase, SessionPhase::AwaitingBlock);
        assert!(experiment::begin_block(&mut state, now));
        assert_eq!(state.block_num, block);

        loop {
            let trial = state.current_trial().unwrap();
            let start = trial.timeline().start_ns();
            let factors = trial.factors();

            // mid-cue frame
            let cue_frame = state.composition(start + 550 * MS);
            let cue_anchors: Vec<Anchor> = cue_frame
                .iter()
                .filter(|d| d.stimulus == StimulusId::Cue)
                .map(|d| d.anchor)
                .collect();
            let expected = match factors.cue_location {
                CueLocation::Left => vec![Anchor::LeftProbe],
                CueLocation::Right => vec![Anchor::RightProbe],
                CueLocation::Neutral => vec![Anchor::LeftProbe, Anchor::RightProbe],
            };
            assert_eq!(cue_anchors, expected);

            assert_eq!(
                experiment::tick(&mut state, start + 800 * MS).unwrap(),
                Tick::Running(TrialStage::TargetActive)
            );
            assert_eq!(
                experiment::handle_key(&mut state, "z", start + 1000 * MS),
                Some(ResponseLabel::Left)
            );
            now = start + 1001 * MS;
            let Tick::TrialFinished(outcome) = experiment::tick(&mut state, now).unwrap() else {
                panic!("response should finish the trial");
            };
            assert_eq!(outcome.reaction_time, Some(300.0));
            assert_eq!(outcome.factors(), factors);

            if state.phase != SessionPhase::InTrial {
                break;
            }
        }
    }

    assert_eq!(state.phase, SessionPhase::Finished);
    assert_eq!(state.outcomes.len(), 12);
    let mut trial_nums: Vec<usize> = state
        .outcomes
        .iter()
        .filter(|o| o.block_num == 2)
        .map(|o| o.trial_num)
        .collect();
    trial_nums.sort();
    assert_eq!(trial_nums, vec![1, 2, 3, 4, 5, 6]);

    let summary = experiment::clean_up(&mut state).unwrap();
    assert_eq!(summary.hits, 12);
    assert_eq!(summary.cuing_effect_ms(), Some(0.0));
}

#[test]
fn target_only_session_saves_misses_as_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let mut state = experiment::setup(
        config(TrialVariant::TargetOnly, 1, 3),
        &geometry(),
        Box::new(JsonFileSink::new(&path)),
    )
    .unwrap();

    experiment::begin_block(&mut state, 0);
    assert_eq!(
        state.composition(0),
        Display::Target(state.current_trial().unwrap().factors().target_location).composition()
    );

    let mut now = 0;
    while state.phase == SessionPhase::InTrial {
        now += 1700 * MS;
        assert!(matches!(
            experiment::tick(&mut state, now).unwrap(),
            Tick::TrialFinished(_)
        ));
    }
    experiment::clean_up(&mut state).unwrap();

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row["block_num"], 1);
        assert_eq!(row["trial_num"], i + 1);
        assert!(row["reaction_time"].is_null());
        assert!(row["response"].is_null());
    }
}

#[test]
fn aborting_mid_trial_keeps_finished_trials_only() {
    let mut state = experiment::setup(
        config(TrialVariant::TargetOnly, 1, 4),
        &geometry(),
        Box::new(MemorySink::default()),
    )
    .unwrap();
    experiment::begin_block(&mut state, 0);
    experiment::handle_key(&mut state, "/", 200 * MS);
    experiment::tick(&mut state, 201 * MS).unwrap();

    let summary = experiment::clean_up(&mut state).unwrap();
    assert_eq!(summary.trials, 1);
    assert_eq!(state.phase, SessionPhase::Finished);
}

#[test]
fn same_seed_and_keys_give_same_outcomes() {
    let run = || {
        let mut state = experiment::setup(
            config(TrialVariant::Cued, 1, 12),
            &geometry(),
            Box::new(MemorySink::default()),
        )
        .unwrap();
        experiment::begin_block(&mut state, 0);
        while let Some(trial) = state.current_trial() {
            let start = trial.timeline().start_ns();
            let key = if state.trial_num % 2 == 0 { "Z" } else { "/" };
            experiment::handle_key(&mut state, key, start + 950 * MS);
            experiment::tick(&mut state, start + 951 * MS).unwrap();
        }
        state.outcomes
    };

    let first = run();
    assert_eq!(first.len(), 12);
    assert_eq!(first, run());
    assert!(first.iter().all(|o| o.reaction_time == Some(250.0)));
}
