use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DelayThresholds;
use crate::scoring::timeline::{SilenceGap, TimelineEntry};
use crate::types::{ErrorType, RecognizedWord};

const DELAY_FLUENCY_WEIGHT: f64 = 0.5;
const DELAY_SILENCE_WEIGHT: f64 = 0.3;
const DELAY_COMPLETENESS_WEIGHT: f64 = 0.2;

const QUALITY_DELAY_WEIGHT: f64 = 0.5;
const QUALITY_ACCURACY_WEIGHT: f64 = 0.25;
const QUALITY_FLUENCY_WEIGHT: f64 = 0.25;

pub const MIN_QUALITY_SCORE: u8 = 1;
pub const MAX_QUALITY_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WordCounts {
    pub reference_word_count: usize,
    pub recognized_word_count: usize,
    pub correct: usize,
    pub insertions: usize,
    pub omissions: usize,
    pub mispronunciations: usize,
}

impl WordCounts {
    pub fn tally(aligned: &[RecognizedWord], reference_count: usize, recognized_count: usize) -> Self {
        let mut counts = Self {
            reference_word_count: reference_count,
            recognized_word_count: recognized_count,
            ..Self::default()
        };
        for word in aligned {
            match word.error_type {
                ErrorType::Correct => counts.correct += 1,
                ErrorType::Insertion => counts.insertions += 1,
                ErrorType::Omission => counts.omissions += 1,
                ErrorType::Mispronunciation => counts.mispronunciations += 1,
            }
        }
        counts
    }

    /// (mispronunciations + omissions + insertions) / reference words, in percent.
    pub fn word_error_rate_percent(&self) -> f64 {
        if self.reference_word_count == 0 {
            return 0.0;
        }
        let errors = self.mispronunciations + self.omissions + self.insertions;
        errors as f64 / self.reference_word_count as f64 * 100.0
    }
}

/// Running statistics for one case-folded word.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerWordAggregate {
    pub occurrences: usize,
    pub avg_accuracy: Option<f64>,
    pub min_accuracy: Option<f64>,
    pub max_accuracy: Option<f64>,
    pub total_duration_sec: f64,
    #[serde(skip)]
    scored_occurrences: usize,
}

impl PerWordAggregate {
    pub fn observe(&mut self, accuracy: Option<f64>, duration_sec: f64) {
        self.occurrences += 1;
        self.total_duration_sec += duration_sec;
        let Some(acc) = accuracy.filter(|a| a.is_finite()) else {
            return;
        };
        self.scored_occurrences += 1;
        let n = self.scored_occurrences as f64;
        self.avg_accuracy = Some(match self.avg_accuracy {
            Some(avg) => avg + (acc - avg) / n,
            None => acc,
        });
        self.min_accuracy = Some(self.min_accuracy.map_or(acc, |m| m.min(acc)));
        self.max_accuracy = Some(self.max_accuracy.map_or(acc, |m| m.max(acc)));
    }
}

pub fn per_word_aggregates(timeline: &[TimelineEntry]) -> BTreeMap<String, PerWordAggregate> {
    let mut per_word: BTreeMap<String, PerWordAggregate> = BTreeMap::new();
    for entry in timeline {
        let Some(word) = entry.word.as_deref() else {
            continue;
        };
        let key = word.to_lowercase();
        if key.is_empty() {
            continue;
        }
        per_word
            .entry(key)
            .or_default()
            .observe(entry.accuracy_score, entry.duration_sec);
    }
    per_word
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccuracyDistribution {
    #[serde(rename = "<60")]
    pub below_60: usize,
    #[serde(rename = "60-79")]
    pub from_60_to_79: usize,
    #[serde(rename = "80-89")]
    pub from_80_to_89: usize,
    #[serde(rename = "90-99")]
    pub from_90_to_99: usize,
    #[serde(rename = "100")]
    pub perfect: usize,
    pub unknown: usize,
}

impl AccuracyDistribution {
    pub fn from_timeline(timeline: &[TimelineEntry]) -> Self {
        let mut distribution = Self::default();
        for entry in timeline {
            distribution.record(entry.accuracy_score);
        }
        distribution
    }

    pub fn record(&mut self, accuracy: Option<f64>) {
        let bucket = match accuracy.filter(|a| !a.is_nan()) {
            None => &mut self.unknown,
            Some(s) if s < 60.0 => &mut self.below_60,
            Some(s) if s < 80.0 => &mut self.from_60_to_79,
            Some(s) if s < 90.0 => &mut self.from_80_to_89,
            Some(s) if s < 100.0 => &mut self.from_90_to_99,
            Some(_) => &mut self.perfect,
        };
        *bucket += 1;
    }

    pub fn total(&self) -> usize {
        self.below_60
            + self.from_60_to_79
            + self.from_80_to_89
            + self.from_90_to_99
            + self.perfect
            + self.unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum DelayLevel {
    Natural = 0,
    Slight = 1,
    Medium = 2,
    Severe = 3,
}

impl DelayLevel {
    pub const ALL: [DelayLevel; 4] = [Self::Natural, Self::Slight, Self::Medium, Self::Severe];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Slight => "slight delay",
            Self::Medium => "Medium delay",
            Self::Severe => "severe delay",
        }
    }

    /// Each threshold is the inclusive lower bound of the next level.
    pub fn from_delay_index(delay_index: f64, thresholds: &DelayThresholds) -> Self {
        if delay_index < thresholds.slight {
            Self::Natural
        } else if delay_index < thresholds.medium {
            Self::Slight
        } else if delay_index < thresholds.severe {
            Self::Medium
        } else {
            Self::Severe
        }
    }

    pub fn labels() -> BTreeMap<u8, &'static str> {
        Self::ALL.iter().map(|l| (l.code(), l.label())).collect()
    }
}

impl From<DelayLevel> for u8 {
    fn from(level: DelayLevel) -> Self {
        level.code()
    }
}

fn unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Silence duration over span duration; zero for an empty span.
pub fn silence_ratio(silences: &[SilenceGap], span_duration_sec: f64) -> f64 {
    if span_duration_sec <= 0.0 {
        return 0.0;
    }
    let total: f64 = silences.iter().map(|s| s.duration_sec).sum();
    total / span_duration_sec
}

/// Heuristic in [0, 1], higher meaning more hesitant speech.
pub fn delay_index(fluency_score: f64, completeness_score: f64, silence_ratio: f64) -> f64 {
    DELAY_FLUENCY_WEIGHT * (1.0 - unit(fluency_score / 100.0))
        + DELAY_SILENCE_WEIGHT * silence_ratio
        + DELAY_COMPLETENESS_WEIGHT * (1.0 - unit(completeness_score / 100.0))
}

/// Bounded 1–10 quality score, higher is better.
pub fn quality_score(delay_index: f64, accuracy_score: f64, fluency_score: f64) -> u8 {
    let quality = QUALITY_DELAY_WEIGHT * unit(1.0 - delay_index)
        + QUALITY_ACCURACY_WEIGHT * unit(accuracy_score / 100.0)
        + QUALITY_FLUENCY_WEIGHT * unit(fluency_score / 100.0);
    let scaled = (1.0 + unit(quality) * 9.0).round();
    (scaled as u8).clamp(MIN_QUALITY_SCORE, MAX_QUALITY_SCORE)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryStats {
    pub timeline_word_count: usize,
    pub timeline_span_sec: f64,
    pub avg_word_duration_sec: f64,
    pub median_word_duration_sec: f64,
}

impl SummaryStats {
    pub fn from_timeline(
        timeline: &[TimelineEntry],
        span_duration_sec: f64,
        articulation_time_sec: f64,
    ) -> Self {
        let count = timeline.len();
        let mut durations: Vec<f64> = timeline.iter().map(|e| e.duration_sec).collect();
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Self {
            timeline_word_count: count,
            timeline_span_sec: span_duration_sec,
            avg_word_duration_sec: if count > 0 {
                articulation_time_sec / count as f64
            } else {
                0.0
            },
            median_word_duration_sec: median_sorted(&durations),
        }
    }
}

pub(crate) fn median_sorted(sorted_values: &[f64]) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let mid = sorted_values.len() / 2;
    if sorted_values.len() % 2 == 0 {
        (sorted_values[mid - 1] + sorted_values[mid]) / 2.0
    } else {
        sorted_values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::timeline::{build_timeline, detect_silences, span_duration_sec};

    const SEC: u64 = 10_000_000;

    #[test]
    fn word_error_rate_example() {
        let counts = WordCounts {
            reference_word_count: 10,
            mispronunciations: 1,
            omissions: 1,
            insertions: 0,
            ..WordCounts::default()
        };
        assert!((counts.word_error_rate_percent() - 20.0).abs() < 1e-9);
        assert_eq!(WordCounts::default().word_error_rate_percent(), 0.0);
    }

    #[test]
    fn tally_counts_every_classification() {
        let aligned = vec![
            RecognizedWord::new("a"),
            RecognizedWord::new("b").with_error_type(ErrorType::Insertion),
            RecognizedWord::omission("c"),
            RecognizedWord::new("d").with_error_type(ErrorType::Mispronunciation),
            RecognizedWord::new("e"),
        ];
        let counts = WordCounts::tally(&aligned, 4, 4);
        assert_eq!(counts.correct, 2);
        assert_eq!(counts.insertions, 1);
        assert_eq!(counts.omissions, 1);
        assert_eq!(counts.mispronunciations, 1);
        assert!((counts.word_error_rate_percent() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn per_word_running_mean() {
        let words = vec![
            RecognizedWord::new("The").with_accuracy(90.0).with_timing(0, SEC),
            RecognizedWord::new("the").with_accuracy(80.0).with_timing(2 * SEC, SEC),
            RecognizedWord::new("THE").with_accuracy(100.0).with_timing(4 * SEC, SEC),
            RecognizedWord::new("").with_accuracy(50.0),
        ];
        let per_word = per_word_aggregates(&build_timeline(&words));
        assert_eq!(per_word.len(), 1);
        let the = &per_word["the"];
        assert_eq!(the.occurrences, 3);
        assert!((the.avg_accuracy.unwrap_or_default() - 90.0).abs() < 1e-9);
        assert_eq!(the.min_accuracy, Some(80.0));
        assert_eq!(the.max_accuracy, Some(100.0));
        assert_eq!(the.total_duration_sec, 3.0);
    }

    #[test]
    fn per_word_unscored_occurrence_keeps_mean() {
        let mut agg = PerWordAggregate::default();
        agg.observe(Some(70.0), 0.5);
        agg.observe(None, 0.5);
        agg.observe(Some(90.0), 0.5);
        assert_eq!(agg.occurrences, 3);
        assert_eq!(agg.avg_accuracy, Some(80.0));
    }

    #[test]
    fn distribution_buckets() {
        let mut dist = AccuracyDistribution::default();
        for score in [Some(10.0), Some(59.9), Some(60.0), Some(85.0), Some(99.9), Some(100.0), None] {
            dist.record(score);
        }
        assert_eq!(dist.below_60, 2);
        assert_eq!(dist.from_60_to_79, 1);
        assert_eq!(dist.from_80_to_89, 1);
        assert_eq!(dist.from_90_to_99, 1);
        assert_eq!(dist.perfect, 1);
        assert_eq!(dist.unknown, 1);
        assert_eq!(dist.total(), 7);

        let json = serde_json::to_value(dist).expect("serialize");
        assert_eq!(json["<60"], 2);
        assert_eq!(json["100"], 1);
    }

    #[test]
    fn level_boundaries_are_inclusive_lower() {
        let t = DelayThresholds::default();
        assert_eq!(DelayLevel::from_delay_index(0.0, &t), DelayLevel::Natural);
        assert_eq!(DelayLevel::from_delay_index(0.1999, &t), DelayLevel::Natural);
        assert_eq!(DelayLevel::from_delay_index(0.20, &t), DelayLevel::Slight);
        assert_eq!(DelayLevel::from_delay_index(0.35, &t), DelayLevel::Medium);
        assert_eq!(DelayLevel::from_delay_index(0.55, &t), DelayLevel::Severe);
        assert_eq!(DelayLevel::from_delay_index(1.2, &t), DelayLevel::Severe);
    }

    #[test]
    fn level_labels() {
        let labels = DelayLevel::labels();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[&0], "natural");
        assert_eq!(labels[&2], "Medium delay");
        assert_eq!(serde_json::to_value(DelayLevel::Severe).expect("serialize"), 3);
    }

    #[test]
    fn delay_index_components() {
        assert_eq!(delay_index(100.0, 100.0, 0.0), 0.0);
        assert!((delay_index(0.0, 0.0, 0.0) - 0.7).abs() < 1e-9);
        assert!((delay_index(100.0, 100.0, 0.5) - 0.15).abs() < 1e-9);
        // scores outside [0, 100] are clamped
        assert!((delay_index(150.0, -20.0, 0.0) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn silence_ratio_from_timeline() {
        let timeline = build_timeline(&[
            RecognizedWord::new("a").with_timing(0, SEC),
            RecognizedWord::new("b").with_timing(2 * SEC, 2 * SEC),
        ]);
        let silences = detect_silences(&timeline);
        let ratio = silence_ratio(&silences, span_duration_sec(&timeline));
        assert!((ratio - 0.25).abs() < 1e-9);
        assert_eq!(silence_ratio(&silences, 0.0), 0.0);
    }

    #[test]
    fn quality_score_bounds() {
        assert_eq!(quality_score(0.0, 100.0, 100.0), 10);
        assert_eq!(quality_score(1.0, 0.0, 0.0), 1);
        assert_eq!(quality_score(5.0, -40.0, f64::NAN), 1);
        assert_eq!(quality_score(-3.0, 400.0, 400.0), 10);
        // 0.5*0.8 + 0.25*0.8 + 0.25*0.6 = 0.75 -> round(7.75) = 8
        assert_eq!(quality_score(0.2, 80.0, 60.0), 8);
    }

    #[test]
    fn summary_stats_median_and_average() {
        let timeline = build_timeline(&[
            RecognizedWord::new("a").with_timing(0, SEC),
            RecognizedWord::new("b").with_timing(2 * SEC, 3 * SEC),
            RecognizedWord::new("c").with_timing(6 * SEC, 2 * SEC),
        ]);
        let stats = SummaryStats::from_timeline(&timeline, 8.0, 6.0);
        assert_eq!(stats.timeline_word_count, 3);
        assert_eq!(stats.median_word_duration_sec, 2.0);
        assert_eq!(stats.avg_word_duration_sec, 2.0);
        assert_eq!(SummaryStats::from_timeline(&[], 0.0, 0.0), SummaryStats::default());
    }
}
