use std::sync::LazyLock;

use regex::Regex;

static PERCENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})(?:\.\d+)?\s*%").unwrap());

const TRANSCRIBE_FLOOR: u8 = 25;
const TRANSCRIBE_CEIL: u8 = 90;
/// Ratio mapping the engine's own 0-100 scale into the 25-90 band.
const PERCENT_SCALE: f32 = 0.65;
/// Per-segment increment; counting alone approaches but never reaches the
/// band ceiling.
const SEGMENT_STEP: f32 = 0.8;
const SEGMENT_CAP: u8 = 89;

const LOADING_FLOOR: u8 = 25;
const PROCESSING_FLOOR: u8 = 30;

/// Coarse phase label derived from the engine's diagnostic lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    #[default]
    Starting,
    Loading,
    Processing,
}

impl EnginePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnginePhase::Starting => "starting",
            EnginePhase::Loading => "loading",
            EnginePhase::Processing => "processing",
        }
    }
}

/// Heuristic progress estimate over the engine's unstructured output.
///
/// The engine exposes no progress API, so this is a best-effort reading of
/// its log lines: an explicit percentage token wins, then segment counting,
/// then phase keywords. Estimates from the two numeric sources can disagree
/// in magnitude; both are pushed through the same non-decreasing clamp and
/// the disagreement is accepted as approximation.
#[derive(Debug, Default)]
pub struct ProgressEstimator {
    phase: EnginePhase,
    segments: u32,
    last: u8,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn current(&self) -> u8 {
        self.last
    }

    /// Ingest one output line and return the updated estimate. Exactly one
    /// rule applies per line; the returned value never decreases.
    pub fn observe(&mut self, line: &str) -> u8 {
        let lower = line.to_lowercase();

        let raw = if let Some(pct) = extract_percent(line) {
            self.phase = EnginePhase::Processing;
            TRANSCRIBE_FLOOR + (pct as f32 * PERCENT_SCALE).round() as u8
        } else if lower.contains("segment") || lower.contains("frame") || lower.contains("progress")
        {
            self.phase = EnginePhase::Processing;
            self.segments += 1;
            let counted = TRANSCRIBE_FLOOR as f32 + self.segments as f32 * SEGMENT_STEP;
            (counted as u8).min(SEGMENT_CAP)
        } else if lower.contains("loading") || lower.contains("initializing") {
            self.phase = EnginePhase::Loading;
            LOADING_FLOOR
        } else if lower.contains("processing") {
            self.phase = EnginePhase::Processing;
            PROCESSING_FLOOR
        } else {
            self.last
        };

        self.last = self.last.max(raw.min(TRANSCRIBE_CEIL));
        self.last
    }
}

fn extract_percent(line: &str) -> Option<u8> {
    let caps = PERCENT_TOKEN.captures(line)?;
    let value: u32 = caps.get(1)?.as_str().parse().ok()?;
    if value > 100 {
        return None;
    }
    Some(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_percent_maps_into_band() {
        let mut est = ProgressEstimator::new();
        assert_eq!(est.observe("whisper_full: progress = 0%"), 25);
        assert_eq!(est.observe("progress = 100%"), 90);
    }

    #[test]
    fn percent_after_prior_thirty_yields_fifty_two() {
        let mut est = ProgressEstimator::new();
        est.observe("processing audio");
        assert_eq!(est.current(), 30);
        assert_eq!(est.observe("whisper: 42%"), 52);
    }

    #[test]
    fn lower_raw_estimate_never_decreases_reported_value() {
        let mut est = ProgressEstimator::new();
        assert_eq!(est.observe("progress: 80%"), 77);
        assert_eq!(est.observe("progress: 10%"), 77);
        assert_eq!(est.current(), 77);
    }

    #[test]
    fn segment_counting_approaches_but_never_reaches_ninety() {
        let mut est = ProgressEstimator::new();
        let mut last = 0;
        for _ in 0..500 {
            last = est.observe("[00:01.000 --> 00:02.000] segment text");
        }
        assert_eq!(last, 89);
    }

    #[test]
    fn phase_keywords_set_floor_without_decreasing() {
        let mut est = ProgressEstimator::new();
        assert_eq!(est.observe("loading model from ggml-base.bin"), 25);
        assert_eq!(est.phase(), EnginePhase::Loading);
        assert_eq!(est.observe("processing 3 channels"), 30);
        assert_eq!(est.phase(), EnginePhase::Processing);

        // A later loading line must not pull the estimate back down.
        assert_eq!(est.observe("50%"), 58);
        assert_eq!(est.observe("loading secondary model"), 58);
    }

    #[test]
    fn highest_priority_rule_wins_on_multi_match_lines() {
        let mut est = ProgressEstimator::new();
        // Contains both a percent token and the segment keyword: percent wins,
        // so the segment counter stays untouched.
        assert_eq!(est.observe("segment progress 40%"), 51);
        let mut expected_from_counting = ProgressEstimator::new();
        expected_from_counting.observe("segment");
        assert!(est.current() > expected_from_counting.current());
    }

    #[test]
    fn unrelated_lines_leave_estimate_untouched() {
        let mut est = ProgressEstimator::new();
        assert_eq!(est.observe("system_info: n_threads = 4"), 0);
        est.observe("33%");
        let before = est.current();
        assert_eq!(est.observe("some transcript text"), before);
    }

    #[test]
    fn out_of_range_percent_tokens_are_ignored() {
        let mut est = ProgressEstimator::new();
        assert_eq!(est.observe("weird value 400%"), 0);
    }
}
