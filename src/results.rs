use crate::design::CueValidity;
use crate::trial::TrialOutcome;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Destination for finished trial outcomes
pub trait ResultSink {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Buffers outcomes and writes them as one pretty-printed JSON array.
pub struct JsonFileSink {
    path: PathBuf,
    outcomes: Vec<TrialOutcome>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            outcomes: Vec::new(),
        }
    }
}

impl ResultSink for JsonFileSink {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("cannot create result file {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.outcomes)
            .context("failed to write results")?;
        writer.flush()?;
        log::info!(
            "Saved {} trial outcomes to {}",
            self.outcomes.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub outcomes: Vec<TrialOutcome>,
    pub finished: bool,
}

impl ResultSink for MemorySink {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RtStats {
    pub count: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl RtStats {
    fn from_rts(rts: impl IntoIterator<Item = f64>) -> Option<Self> {
        let rts: Vec<f64> = rts.into_iter().collect();
        if rts.is_empty() {
            return None;
        }
        Some(Self {
            count: rts.len(),
            mean_ms: rts.iter().sum::<f64>() / rts.len() as f64,
            min_ms: rts.iter().cloned().fold(f64::INFINITY, f64::min),
            max_ms: rts.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Session-level description of the collected outcomes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub trials: usize,
    pub hits: usize,
    pub overall: Option<RtStats>,
    pub valid: Option<RtStats>,
    pub invalid: Option<RtStats>,
    pub neutral: Option<RtStats>,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let rts_for = |validity: Option<CueValidity>| {
            RtStats::from_rts(
                outcomes
                    .iter()
                    .filter(|o| validity.map_or(true, |v| o.factors().validity() == v))
                    .filter_map(|o| o.reaction_time),
            )
        };
        Self {
            trials: outcomes.len(),
            hits: outcomes.iter().filter(|o| !o.is_miss()).count(),
            overall: rts_for(None),
            valid: rts_for(Some(CueValidity::Valid)),
            invalid: rts_for(Some(CueValidity::Invalid)),
            neutral: rts_for(Some(CueValidity::Neutral)),
        }
    }

    pub fn hit_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.hits as f64 / self.trials as f64
        }
    }

    /// Invalid minus valid mean RT, the classic cuing effect.
    pub fn cuing_effect_ms(&self) -> Option<f64> {
        Some(self.invalid?.mean_ms - self.valid?.mean_ms)
    }

    pub fn log(&self) {
        log::info!(
            "Trials: {}, response rate: {:.1}%",
            self.trials,
            self.hit_rate() * 100.0
        );
        if let Some(rt) = self.overall {
            log::info!(
                "Reaction times: mean {:.3} ms, min {:.3} ms, max {:.3} ms",
                rt.mean_ms,
                rt.min_ms,
                rt.max_ms
            );
        }
        for (name, stats) in [
            ("valid", self.valid),
            ("invalid", self.invalid),
            ("neutral", self.neutral),
        ] {
            if let Some(rt) = stats {
                log::info!("  {name}: mean {:.3} ms over {} hits", rt.mean_ms, rt.count);
            }
        }
        if let Some(effect) = self.cuing_effect_ms() {
            log::info!("Cuing effect (invalid - valid): {effect:.3} ms");
        }
    }
}
