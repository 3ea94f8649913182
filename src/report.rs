use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::scoring::analytics::median_sorted;
use crate::scoring::compose::ScoreResult;

const OUTLIER_TOP_N: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub cases: Vec<CaseReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub config: ScoringConfig,
    pub case_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub locale: String,
    pub level: u8,
    pub score: u8,
    pub composite: f64,
    pub accuracy: f64,
    pub fluency: f64,
    pub completeness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prosody: Option<f64>,
    pub word_error_rate_percent: f64,
    pub delay_index: f64,
    pub wpm_overall_span: f64,
    pub reference_word_count: usize,
    pub recognized_word_count: usize,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub counts: AggregateCounts,
    pub global: AggregateMetrics,
    /// Number of cases per delay level code.
    pub by_level: BTreeMap<u8, usize>,
    pub outliers: OutlierReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub total: u32,
    pub with_recognized_words: u32,
    pub without_recognized_words: u32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AggregateMetrics {
    pub score: Option<MetricDistribution>,
    pub composite: Option<MetricDistribution>,
    pub accuracy: Option<MetricDistribution>,
    pub fluency: Option<MetricDistribution>,
    pub completeness: Option<MetricDistribution>,
    pub prosody: Option<MetricDistribution>,
    pub word_error_rate_percent: Option<MetricDistribution>,
    pub delay_index: Option<MetricDistribution>,
    pub wpm_overall_span: Option<MetricDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDistribution {
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub worst_word_error_rate_percent: Vec<OutlierEntry>,
    pub worst_delay_index: Vec<OutlierEntry>,
    pub lowest_score: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f64,
}

pub fn compute_case_report(
    id: &str,
    locale: &str,
    result: &ScoreResult,
    include_result: bool,
) -> Result<CaseReport, ScoringError> {
    let analytics = &result.analytics;
    let counts = &analytics.counts;
    let mut notes = Vec::new();

    if counts.reference_word_count == 0 {
        notes.push("empty_reference".to_string());
    }
    if counts.recognized_word_count == 0 {
        notes.push("no_recognized_words".to_string());
    }
    let has_prosody = analytics
        .segment_summaries
        .iter()
        .any(|segment| segment.prosody_score.is_some());
    if !has_prosody && counts.recognized_word_count > 0 {
        notes.push("prosody_missing".to_string());
    }
    if counts.recognized_word_count != counts.reference_word_count {
        notes.push(format!(
            "word_count_mismatch:recognized={} reference={}",
            counts.recognized_word_count, counts.reference_word_count
        ));
    }
    if analytics.accuracy_distribution.unknown > 0 {
        notes.push(format!(
            "unscored_words={}",
            analytics.accuracy_distribution.unknown
        ));
    }

    Ok(CaseReport {
        id: id.to_string(),
        locale: locale.to_string(),
        level: result.level_measured.code(),
        score: result.score,
        composite: checked(result.paragraph_pronunciation_score, "composite")?,
        accuracy: checked(result.accuracy_score, "accuracy")?,
        fluency: checked(result.fluency_score, "fluency")?,
        completeness: checked(result.completeness_score, "completeness")?,
        prosody: if has_prosody {
            Some(checked(result.prosody_score, "prosody")?)
        } else {
            None
        },
        word_error_rate_percent: checked(
            analytics.word_error_rate_percent,
            "word_error_rate_percent",
        )?,
        delay_index: checked(analytics.summary.delay_index, "delay_index")?,
        wpm_overall_span: checked(
            analytics.speaking_rates.wpm_overall_span,
            "speaking_rates.wpm_overall_span",
        )?,
        reference_word_count: counts.reference_word_count,
        recognized_word_count: counts.recognized_word_count,
        notes,
        result: include_result.then(|| result.clone()),
    })
}

pub fn aggregate_reports(cases: &[CaseReport]) -> AggregateReport {
    let spoken: Vec<&CaseReport> = cases
        .iter()
        .filter(|case| case.recognized_word_count > 0)
        .collect();

    let mut by_level = BTreeMap::new();
    for case in cases {
        *by_level.entry(case.level).or_insert(0usize) += 1;
    }

    AggregateReport {
        counts: AggregateCounts {
            total: to_u32(cases.len()),
            with_recognized_words: to_u32(spoken.len()),
            without_recognized_words: to_u32(cases.len() - spoken.len()),
        },
        global: aggregate_metrics(&spoken),
        by_level,
        outliers: build_outliers(&spoken, OUTLIER_TOP_N),
    }
}

fn aggregate_metrics(cases: &[&CaseReport]) -> AggregateMetrics {
    let collect = |metric: fn(&CaseReport) -> Option<f64>| -> Option<MetricDistribution> {
        let values: Vec<f64> = cases.iter().filter_map(|case| metric(case)).collect();
        distribution_or_none(&values)
    };

    AggregateMetrics {
        score: collect(|c| Some(c.score as f64)),
        composite: collect(|c| Some(c.composite)),
        accuracy: collect(|c| Some(c.accuracy)),
        fluency: collect(|c| Some(c.fluency)),
        completeness: collect(|c| Some(c.completeness)),
        prosody: collect(|c| c.prosody),
        word_error_rate_percent: collect(|c| Some(c.word_error_rate_percent)),
        delay_index: collect(|c| Some(c.delay_index)),
        wpm_overall_span: collect(|c| Some(c.wpm_overall_span)),
    }
}

fn build_outliers(cases: &[&CaseReport], top_n: usize) -> OutlierReport {
    let lowest_score = ranked_outliers(cases, top_n, |case| -(case.score as f64))
        .into_iter()
        .map(|entry| OutlierEntry {
            value: -entry.value,
            ..entry
        })
        .collect();

    OutlierReport {
        worst_word_error_rate_percent: ranked_outliers(cases, top_n, |case| {
            case.word_error_rate_percent
        }),
        worst_delay_index: ranked_outliers(cases, top_n, |case| case.delay_index),
        lowest_score,
    }
}

/// Highest values first, ties broken by id.
fn ranked_outliers(
    cases: &[&CaseReport],
    top_n: usize,
    metric: impl Fn(&CaseReport) -> f64,
) -> Vec<OutlierEntry> {
    let mut entries: Vec<OutlierEntry> = cases
        .iter()
        .map(|case| OutlierEntry {
            id: case.id.clone(),
            value: metric(case),
        })
        .collect();

    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(top_n);
    entries
}

fn distribution_or_none(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(MetricDistribution {
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        p50: median_sorted(&sorted),
        p90: percentile_sorted(&sorted, 0.9),
        p95: percentile_sorted(&sorted, 0.95),
        p99: percentile_sorted(&sorted, 0.99),
    })
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked(value: f64, metric_name: &str) -> Result<f64, ScoringError> {
    if !value.is_finite() {
        return Err(ScoringError::invalid_input(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    Ok(value)
}
