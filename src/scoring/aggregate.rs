use serde::Serialize;

use crate::config::ScoreWeights;
use crate::types::{ErrorType, RecognitionSegment, RecognizedWord};

/// Accuracy contributed by an aligned word that carries no accuracy (e.g. an omission).
const MISSING_ACCURACY: f64 = 0.0;
/// Fluency assumed for a segment that did not report one.
const MISSING_FLUENCY: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub accuracy: f64,
    pub fluency: f64,
    pub completeness: f64,
    /// `None` when no segment reported prosody; the composite is then reweighted.
    pub prosody: Option<f64>,
    pub composite: f64,
}

pub fn aggregate_scores(
    aligned: &[RecognizedWord],
    segments: &[RecognitionSegment],
    reference_count: usize,
    weights: &ScoreWeights,
) -> ComponentScores {
    let accuracy = accuracy_score(aligned);
    let weighted_fluency: Vec<(Option<f64>, u64)> = segments
        .iter()
        .map(|segment| (segment.fluency_score, segment.duration_ticks()))
        .collect();
    let fluency = fluency_score(&weighted_fluency);
    let correct = aligned
        .iter()
        .filter(|word| word.error_type == ErrorType::Correct)
        .count();
    let completeness = completeness_score(correct, reference_count);
    let prosody_values: Vec<Option<f64>> = segments.iter().map(|s| s.prosody_score).collect();
    let prosody = prosody_score(&prosody_values);
    if prosody.is_none() && !segments.is_empty() {
        tracing::debug!(
            segments = segments.len(),
            "no prosody reported; composite score reweighted"
        );
    }

    let mut scores = ComponentScores {
        accuracy,
        fluency,
        completeness,
        prosody,
        composite: 0.0,
    };
    scores.composite = composite_score(&scores, weights);
    scores
}

/// Mean word accuracy over every aligned word except insertions.
pub fn accuracy_score(aligned: &[RecognizedWord]) -> f64 {
    let scored: Vec<f64> = aligned
        .iter()
        .filter(|word| word.error_type != ErrorType::Insertion)
        .map(|word| {
            word.accuracy_score
                .filter(|value| value.is_finite())
                .unwrap_or(MISSING_ACCURACY)
        })
        .collect();
    mean(&scored)
}

/// Segment fluency weighted by each segment's total word duration in ticks.
pub fn fluency_score(segments: &[(Option<f64>, u64)]) -> f64 {
    let total_ticks: f64 = segments.iter().map(|(_, ticks)| *ticks as f64).sum();
    if total_ticks <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = segments
        .iter()
        .map(|(fluency, ticks)| {
            fluency
                .filter(|value| value.is_finite())
                .unwrap_or(MISSING_FLUENCY)
                * *ticks as f64
        })
        .sum();
    weighted / total_ticks
}

pub fn completeness_score(correct_count: usize, reference_count: usize) -> f64 {
    if reference_count == 0 {
        return 0.0;
    }
    (correct_count as f64 / reference_count as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn prosody_score(scores: &[Option<f64>]) -> Option<f64> {
    let reported: Vec<f64> = scores
        .iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite())
        .collect();
    (!reported.is_empty()).then(|| mean(&reported))
}

/// Weighted blend normalized by the weights of the components actually present.
pub fn composite_score(scores: &ComponentScores, weights: &ScoreWeights) -> f64 {
    let components = [
        (Some(scores.accuracy), weights.accuracy),
        (scores.prosody, weights.prosody),
        (Some(scores.fluency), weights.fluency),
        (Some(scores.completeness), weights.completeness),
    ];
    let active_weight: f64 = components
        .iter()
        .filter(|(value, _)| value.is_some())
        .map(|(_, weight)| weight)
        .sum();
    if active_weight <= 0.0 {
        return 0.0;
    }
    components
        .iter()
        .filter_map(|(value, weight)| value.map(|v| v * weight / active_weight))
        .sum()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(accuracy: f64, fluency: f64, completeness: f64, prosody: Option<f64>) -> ComponentScores {
        ComponentScores {
            accuracy,
            fluency,
            completeness,
            prosody,
            composite: 0.0,
        }
    }

    #[test]
    fn accuracy_skips_insertions_and_counts_omissions_as_zero() {
        let aligned = vec![
            RecognizedWord::new("a").with_accuracy(90.0),
            RecognizedWord::new("x")
                .with_accuracy(10.0)
                .with_error_type(ErrorType::Insertion),
            RecognizedWord::omission("b"),
            RecognizedWord::new("c").with_accuracy(60.0),
        ];
        assert!((accuracy_score(&aligned) - 50.0).abs() < 1e-9);
        assert_eq!(accuracy_score(&[]), 0.0);
    }

    #[test]
    fn fluency_is_duration_weighted() {
        let fluency = fluency_score(&[(Some(100.0), 3), (Some(60.0), 1), (None, 0)]);
        assert!((fluency - 90.0).abs() < 1e-9);
        assert_eq!(fluency_score(&[(Some(80.0), 0)]), 0.0);
        assert_eq!(fluency_score(&[]), 0.0);
    }

    #[test]
    fn non_finite_accuracy_and_fluency_count_as_absent() {
        let aligned = vec![
            RecognizedWord::new("a").with_accuracy(f64::NAN),
            RecognizedWord::new("b").with_accuracy(80.0),
            RecognizedWord::new("c").with_accuracy(f64::INFINITY),
        ];
        assert!((accuracy_score(&aligned) - 80.0 / 3.0).abs() < 1e-9);

        let fluency = fluency_score(&[(Some(f64::NAN), 1), (Some(90.0), 1)]);
        assert!((fluency - 45.0).abs() < 1e-9);
        assert_eq!(fluency_score(&[(Some(f64::NEG_INFINITY), 5)]), 0.0);
    }

    #[test]
    fn completeness_is_clamped() {
        assert_eq!(completeness_score(12, 10), 100.0);
        assert_eq!(completeness_score(5, 10), 50.0);
        assert_eq!(completeness_score(3, 0), 0.0);
    }

    #[test]
    fn prosody_mean_over_reported_segments() {
        assert_eq!(prosody_score(&[Some(70.0), None, Some(90.0)]), Some(80.0));
        assert_eq!(prosody_score(&[None, None]), None);
        assert_eq!(prosody_score(&[]), None);
    }

    #[test]
    fn composite_reweights_without_prosody() {
        let weights = ScoreWeights::default();
        let composite = composite_score(&scores(80.0, 60.0, 100.0, None), &weights);
        assert!((composite - 80.0).abs() < 1e-9);
    }

    #[test]
    fn composite_uses_nominal_weights_with_prosody() {
        let weights = ScoreWeights::default();
        let composite = composite_score(&scores(80.0, 60.0, 100.0, Some(50.0)), &weights);
        // 0.4*80 + 0.2*50 + 0.2*60 + 0.2*100
        assert!((composite - 74.0).abs() < 1e-9);
    }

    #[test]
    fn composite_with_only_prosody_weight_and_no_prosody_is_zero() {
        let weights = ScoreWeights {
            accuracy: 0.0,
            prosody: 1.0,
            fluency: 0.0,
            completeness: 0.0,
        };
        assert_eq!(composite_score(&scores(80.0, 60.0, 100.0, None), &weights), 0.0);
    }

    #[test]
    fn aggregate_scores_from_segments() {
        let segment = RecognitionSegment {
            words: vec![
                RecognizedWord::new("hello").with_accuracy(100.0).with_timing(0, 5_000_000),
                RecognizedWord::new("world").with_accuracy(80.0).with_timing(6_000_000, 5_000_000),
            ],
            fluency_score: Some(70.0),
            ..RecognitionSegment::default()
        };
        let aligned = segment.words.clone();
        let result = aggregate_scores(&aligned, &[segment], 2, &ScoreWeights::default());
        assert!((result.accuracy - 90.0).abs() < 1e-9);
        assert!((result.fluency - 70.0).abs() < 1e-9);
        assert_eq!(result.completeness, 100.0);
        assert_eq!(result.prosody, None);
        // (0.4*90 + 0.2*70 + 0.2*100) / 0.8
        assert!((result.composite - 87.5).abs() < 1e-9);
    }
}
