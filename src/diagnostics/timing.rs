use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall-clock time spent in one reconstruction stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Per-stage timings summed over every processed plane.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Adds `elapsed_ms` to the stage named `label`, creating it on first use.
    pub fn add(&mut self, label: &str, elapsed_ms: f64) {
        match self.stages.iter_mut().find(|s| s.label == label) {
            Some(stage) => stage.elapsed_ms += elapsed_ms,
            None => self.stages.push(StageTiming::new(label, elapsed_ms)),
        }
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_stages_accumulate() {
        let mut t = TimingBreakdown::default();
        t.add("build", 1.5);
        t.add("vertex", 0.5);
        t.add("build", 2.0);
        assert_eq!(t.stages.len(), 2);
        assert_eq!(t.stage_ms("build"), Some(3.5));
        assert_eq!(t.stage_ms("classify"), None);
    }
}
