//! Overall confidence scoring for a completed run.

use super::types::Source;

/// Score returned when no signal is available.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Penalty subtracted per recorded stage error.
pub const ERROR_PENALTY_PER_ERROR: f64 = 0.1;

/// Source count at which the adequacy signal saturates, unless overridden.
pub const DEFAULT_TARGET_SOURCE_COUNT: usize = 10;

/// Signals feeding the confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    /// Mean credibility over all sources, `None` when there are none.
    pub average_credibility: Option<f64>,
    /// Verifier's own confidence, `None` when verification was skipped.
    pub verification_confidence: Option<f64>,
    /// Number of sources retrieved.
    pub source_count: usize,
    /// Source count at which adequacy reaches 1.0.
    pub target_source_count: usize,
    /// Number of recorded stage errors.
    pub error_count: usize,
}

impl ConfidenceInputs {
    /// Collect the inputs from session state.
    pub fn from_sources(
        sources: &[Source],
        verification_confidence: Option<f64>,
        target_source_count: usize,
        error_count: usize,
    ) -> Self {
        let average_credibility = if sources.is_empty() {
            None
        } else {
            let total: f64 = sources.iter().map(|s| s.credibility_score).sum();
            Some(total / sources.len() as f64)
        };

        Self {
            average_credibility,
            verification_confidence,
            source_count: sources.len(),
            target_source_count,
            error_count,
        }
    }

    /// `min(source_count / target, 1)`, or `None` with no sources.
    pub fn source_adequacy(&self) -> Option<f64> {
        if self.source_count == 0 {
            return None;
        }
        let target = self.target_source_count.max(1) as f64;
        Some((self.source_count as f64 / target).min(1.0))
    }
}

fn sanitize(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

/// Combine the available signals into one score in `[0, 1]`.
///
/// Absent signals are left out of the average rather than counted as zero.
/// The error penalty is applied after averaging, then the result is clamped.
/// With no signal at all the neutral default is returned.
pub fn aggregate(inputs: &ConfidenceInputs) -> f64 {
    let signals: Vec<f64> = [
        inputs.average_credibility.and_then(sanitize),
        inputs.verification_confidence.and_then(sanitize),
        inputs.source_adequacy(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if signals.is_empty() {
        return NEUTRAL_CONFIDENCE;
    }

    let base = signals.iter().sum::<f64>() / signals.len() as f64;
    let penalty = inputs.error_count as f64 * ERROR_PENALTY_PER_ERROR;

    (base - penalty).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(scores: &[f64]) -> Vec<Source> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Source::new(format!("https://example.com/{}", i), "t").with_credibility(*s)
            })
            .collect()
    }

    #[test]
    fn test_no_signals_is_neutral() {
        let inputs = ConfidenceInputs::from_sources(&[], None, 10, 0);
        assert_eq!(aggregate(&inputs), NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_no_signals_with_errors_is_still_neutral() {
        let inputs = ConfidenceInputs::from_sources(&[], None, 10, 7);
        assert_eq!(aggregate(&inputs), NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_perfect_sources_beat_adequacy_alone() {
        let srcs = sources(&[1.0, 1.0]);
        let inputs = ConfidenceInputs::from_sources(&srcs, None, 10, 0);
        let adequacy = inputs.source_adequacy().unwrap();
        let score = aggregate(&inputs);
        assert!((score - 0.6).abs() < 1e-9);
        assert!(score >= adequacy);
    }

    #[test]
    fn test_missing_verification_is_excluded_not_zero() {
        let srcs = sources(&[0.8; 10]);
        let without = aggregate(&ConfidenceInputs::from_sources(&srcs, None, 10, 0));
        assert!((without - 0.9).abs() < 1e-9);

        let with = aggregate(&ConfidenceInputs::from_sources(&srcs, Some(0.3), 10, 0));
        assert!((with - (0.8 + 0.3 + 1.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_penalty_and_clamp() {
        let srcs = sources(&[0.6, 0.6]);
        let one_error = aggregate(&ConfidenceInputs::from_sources(&srcs, Some(0.6), 10, 1));
        let expected = (0.6 + 0.6 + 0.2) / 3.0 - 0.1;
        assert!((one_error - expected).abs() < 1e-9);

        let ten_errors = aggregate(&ConfidenceInputs::from_sources(&srcs, Some(0.6), 10, 10));
        assert_eq!(ten_errors, 0.0);
    }

    #[test]
    fn test_result_always_in_unit_interval() {
        let cases = [
            (vec![], Some(1.0), 0),
            (vec![], Some(0.0), 10),
            (vec![1.0; 30], Some(1.0), 0),
            (vec![0.0; 3], Some(0.0), 10),
            (vec![0.3, 0.9], None, 2),
        ];
        for (scores, verification, errors) in cases {
            let srcs = sources(&scores);
            let score = aggregate(&ConfidenceInputs::from_sources(&srcs, verification, 10, errors));
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_non_finite_signals_are_ignored() {
        let inputs = ConfidenceInputs {
            average_credibility: Some(f64::NAN),
            verification_confidence: Some(f64::INFINITY),
            source_count: 0,
            target_source_count: 10,
            error_count: 0,
        };
        assert_eq!(aggregate(&inputs), NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_zero_target_does_not_divide_by_zero() {
        let srcs = sources(&[0.5]);
        let inputs = ConfidenceInputs::from_sources(&srcs, None, 0, 0);
        assert_eq!(inputs.source_adequacy(), Some(1.0));
    }
}
