use crate::timeline::CheckpointLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const NS_PER_MS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLabel {
    Left,
    Right,
}

/// Keypress collection parameters for one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Key text (as reported by the keyboard layout) to response label.
    pub key_map: BTreeMap<String, ResponseLabel>,
    /// Stop collecting as soon as a mapped key is pressed.
    pub interrupts: bool,
    /// Collection window, measured from `starts_at`.
    pub timeout_ms: u64,
    pub starts_at: CheckpointLabel,
}

impl ResponseConfig {
    pub const SHORT_TIMEOUT_MS: u64 = 1700;
    pub const EXTENDED_TIMEOUT_MS: u64 = 5000;

    fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            key_map: BTreeMap::from([
                ("z".to_string(), ResponseLabel::Left),
                ("/".to_string(), ResponseLabel::Right),
            ]),
            interrupts: true,
            timeout_ms,
            starts_at: CheckpointLabel::TargetOnset,
        }
    }

    pub fn short() -> Self {
        Self::with_timeout(Self::SHORT_TIMEOUT_MS)
    }

    pub fn extended() -> Self {
        Self::with_timeout(Self::EXTENDED_TIMEOUT_MS)
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self::extended()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub label: ResponseLabel,
    /// Time from phase start to the keypress.
    pub rt_ns: u64,
}

impl Response {
    pub fn rt_ms(&self) -> f64 {
        self.rt_ns as f64 / NS_PER_MS as f64
    }
}

/// Listens for the first mapped key inside `[start, start + timeout)`.
#[derive(Debug, Clone)]
pub struct ResponseCollector {
    key_map: BTreeMap<String, ResponseLabel>,
    interrupts: bool,
    start_ns: u64,
    deadline_ns: u64,
    response: Option<Response>,
}

impl ResponseCollector {
    pub fn new(config: &ResponseConfig, start_ns: u64) -> Self {
        Self {
            key_map: config
                .key_map
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
            interrupts: config.interrupts,
            start_ns,
            deadline_ns: start_ns.saturating_add(config.timeout_ms.saturating_mul(NS_PER_MS)),
            response: None,
        }
    }

    pub fn start_ns(&self) -> u64 {
        self.start_ns
    }

    pub fn deadline_ns(&self) -> u64 {
        self.deadline_ns
    }

    pub fn response(&self) -> Option<Response> {
        self.response
    }

    pub fn is_listening(&self, now_ns: u64) -> bool {
        now_ns >= self.start_ns && self.end_ns(now_ns).is_none()
    }

    /// Offers a keypress to the collector. Returns the recorded label when
    /// the key counts as the trial's response.
    pub fn on_key(&mut self, key: &str, at_ns: u64) -> Option<ResponseLabel> {
        if self.response.is_some() || !self.is_listening(at_ns) {
            return None;
        }
        let label = *self.key_map.get(&key.to_lowercase())?;
        self.response = Some(Response {
            label,
            rt_ns: at_ns - self.start_ns,
        });
        Some(label)
    }

    /// Moment the phase ended, if it has: the keypress for an interrupting
    /// response, otherwise the timeout boundary.
    pub fn end_ns(&self, now_ns: u64) -> Option<u64> {
        if self.interrupts {
            if let Some(response) = self.response {
                return Some(self.start_ns + response.rt_ns);
            }
        }
        (now_ns >= self.deadline_ns).then_some(self.deadline_ns)
    }

    pub fn is_done(&self, now_ns: u64) -> bool {
        self.end_ns(now_ns).is_some()
    }
}
