use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::scoring::aggregate::ComponentScores;
use crate::scoring::analytics::{
    AccuracyDistribution, DelayLevel, PerWordAggregate, SummaryStats, WordCounts,
};
use crate::scoring::timeline::{ticks_to_seconds, SilenceGap, SpeakingRates, TimelineEntry};
use crate::types::{Alternative, ErrorType, RecognitionSegment, RecognizedWord};

/// Complete result of one scoring run. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub level_measured: DelayLevel,
    pub levels: BTreeMap<u8, &'static str>,
    /// Quality score in 1..=10.
    pub score: u8,
    pub paragraph_pronunciation_score: f64,
    pub accuracy_score: f64,
    pub completeness_score: f64,
    pub fluency_score: f64,
    /// Zero when no segment reported prosody.
    pub prosody_score: f64,
    pub words: Vec<WordResult>,
    pub analytics: Analytics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordResult {
    pub word: String,
    pub accuracy_score: Option<f64>,
    pub error_type: ErrorType,
}

impl From<&RecognizedWord> for WordResult {
    fn from(word: &RecognizedWord) -> Self {
        Self {
            word: word.word.clone(),
            accuracy_score: word.accuracy_score,
            error_type: word.error_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub word_error_rate_percent: f64,
    pub counts: WordCounts,
    pub speaking_rates: SpeakingRates,
    pub accuracy_distribution: AccuracyDistribution,
    pub timeline: Vec<TimelineEntry>,
    pub silences: Vec<SilenceGap>,
    pub per_word: BTreeMap<String, PerWordAggregate>,
    pub transcripts: Transcripts,
    pub segments: Vec<Value>,
    pub segment_summaries: Vec<SegmentSummary>,
    pub raw: RawResults,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Transcripts {
    pub display: Vec<String>,
    pub lexical: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawResults {
    pub results: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub display: Option<String>,
    pub lexical: Option<String>,
    pub confidence: Option<f64>,
    pub fluency_score: Option<f64>,
    pub prosody_score: Option<f64>,
    pub offset_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
    pub alternatives: Vec<Alternative>,
}

impl From<&RecognitionSegment> for SegmentSummary {
    fn from(segment: &RecognitionSegment) -> Self {
        let (offset_sec, end_sec, duration_sec) = match segment.time_span_ticks() {
            Some((start, end)) => (
                ticks_to_seconds(start),
                ticks_to_seconds(end),
                ticks_to_seconds(end - start),
            ),
            None => (0.0, 0.0, ticks_to_seconds(segment.duration_ticks())),
        };
        Self {
            display: segment.display.clone(),
            lexical: segment.lexical.clone().or_else(|| segment.display.clone()),
            confidence: segment.confidence,
            fluency_score: segment.fluency_score,
            prosody_score: segment.prosody_score,
            offset_sec,
            end_sec,
            duration_sec,
            alternatives: segment.alternatives.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    pub stats: SummaryStats,
    pub silence_ratio: f64,
    pub delay_index: f64,
}

/// Everything computed upstream of the composer.
#[derive(Debug, Clone)]
pub struct ResultParts<'a> {
    pub segments: &'a [RecognitionSegment],
    pub aligned: Vec<RecognizedWord>,
    pub scores: ComponentScores,
    pub counts: WordCounts,
    pub speaking_rates: SpeakingRates,
    pub accuracy_distribution: AccuracyDistribution,
    pub timeline: Vec<TimelineEntry>,
    pub silences: Vec<SilenceGap>,
    pub per_word: BTreeMap<String, PerWordAggregate>,
    pub summary: Summary,
    pub level: DelayLevel,
    pub quality_score: u8,
}

pub fn compose_result(parts: ResultParts<'_>) -> ScoreResult {
    let segments = parts.segments;
    let transcripts = Transcripts {
        display: segments
            .iter()
            .map(|s| s.display.clone().or_else(|| s.lexical.clone()).unwrap_or_default())
            .collect(),
        lexical: segments
            .iter()
            .map(|s| s.lexical.clone().or_else(|| s.display.clone()).unwrap_or_default())
            .collect(),
    };

    ScoreResult {
        level_measured: parts.level,
        levels: DelayLevel::labels(),
        score: parts.quality_score,
        paragraph_pronunciation_score: parts.scores.composite,
        accuracy_score: parts.scores.accuracy,
        completeness_score: parts.scores.completeness,
        fluency_score: parts.scores.fluency,
        prosody_score: parts.scores.prosody.unwrap_or(0.0),
        words: parts.aligned.iter().map(WordResult::from).collect(),
        analytics: Analytics {
            word_error_rate_percent: parts.counts.word_error_rate_percent(),
            counts: parts.counts,
            speaking_rates: parts.speaking_rates,
            accuracy_distribution: parts.accuracy_distribution,
            timeline: parts.timeline,
            silences: parts.silences,
            per_word: parts.per_word,
            transcripts,
            segments: segments
                .iter()
                .map(|s| s.best.clone().unwrap_or_else(|| Value::Object(Map::new())))
                .collect(),
            segment_summaries: segments.iter().map(SegmentSummary::from).collect(),
            raw: RawResults {
                results: segments.iter().filter_map(|s| s.raw.clone()).collect(),
            },
            summary: parts.summary,
        },
    }
}
