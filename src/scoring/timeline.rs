use serde::Serialize;
use serde_json::Value;

use crate::config::ScoringConfig;
use crate::types::{ErrorType, RecognizedWord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub word: Option<String>,
    pub offset_sec: f64,
    pub duration_sec: f64,
    pub end_sec: f64,
    pub accuracy_score: Option<f64>,
    pub error_type: ErrorType,
    /// Raw recognizer label; `None` for words the recognizer did not label.
    pub error_label: Option<String>,
    pub syllables: Option<Value>,
    pub phonemes: Option<Value>,
    #[serde(skip)]
    offset_ticks: u64,
    #[serde(skip)]
    end_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SilenceGap {
    pub start_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeakingRates {
    pub wpm_overall_span: f64,
    pub wpm_articulation_time: f64,
    pub total_span_duration_sec: f64,
    pub total_articulation_time_sec: f64,
}

pub fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / ScoringConfig::TICKS_PER_SECOND
}

/// Word timeline ordered by offset; missing offsets and durations count as zero.
pub fn build_timeline(words: &[RecognizedWord]) -> Vec<TimelineEntry> {
    let untimed = words
        .iter()
        .filter(|w| w.offset_ticks.is_none() || w.duration_ticks.is_none())
        .count();
    if untimed > 0 {
        tracing::warn!(
            untimed,
            total = words.len(),
            "words without offset/duration placed on the timeline with zero timing"
        );
    }

    let mut timeline: Vec<TimelineEntry> = words
        .iter()
        .map(|w| {
            let offset_ticks = w.offset_ticks.unwrap_or(0);
            let duration_ticks = w.duration_ticks_or_zero();
            let end_ticks = offset_ticks.saturating_add(duration_ticks);
            TimelineEntry {
                word: (!w.word.is_empty()).then(|| w.word.clone()),
                offset_sec: ticks_to_seconds(offset_ticks),
                duration_sec: ticks_to_seconds(duration_ticks),
                end_sec: ticks_to_seconds(end_ticks),
                accuracy_score: w.accuracy_score,
                error_type: w.error_type,
                error_label: w.error_label.clone(),
                syllables: w.syllables.clone(),
                phonemes: w.phonemes.clone(),
                offset_ticks,
                end_ticks,
            }
        })
        .collect();
    timeline.sort_by_key(|entry| entry.offset_ticks);
    timeline
}

/// Latest end minus earliest offset, floored at zero.
pub fn span_duration_sec(timeline: &[TimelineEntry]) -> f64 {
    let Some(start) = timeline.iter().map(|e| e.offset_ticks).min() else {
        return 0.0;
    };
    let end = timeline.iter().map(|e| e.end_ticks).max().unwrap_or(start);
    ticks_to_seconds(end.saturating_sub(start))
}

pub fn speaking_rates(timeline: &[TimelineEntry]) -> SpeakingRates {
    let words = timeline.len() as f64;
    let span = span_duration_sec(timeline);
    let articulation: f64 = timeline.iter().map(|e| e.duration_sec).sum();
    SpeakingRates {
        wpm_overall_span: per_minute(words, span),
        wpm_articulation_time: per_minute(words, articulation),
        total_span_duration_sec: span,
        total_articulation_time_sec: articulation,
    }
}

fn per_minute(count: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        count / seconds * 60.0
    } else {
        0.0
    }
}

/// Strictly positive pauses between offset-adjacent words of a sorted timeline.
pub fn detect_silences(timeline: &[TimelineEntry]) -> Vec<SilenceGap> {
    timeline
        .windows(2)
        .filter(|pair| pair[1].offset_ticks > pair[0].end_ticks)
        .map(|pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            SilenceGap {
                start_sec: prev.end_sec,
                end_sec: next.offset_sec,
                duration_sec: ticks_to_seconds(next.offset_ticks - prev.end_ticks),
            }
        })
        .collect()
}
