use std::fs;
use std::path::{Path, PathBuf};

use pronunciation_scoring::{ErrorType, ScoreResult};
use textgrid::{Interval, TextGrid, Tier, TierType};

pub fn write_textgrid(
    case_path: &Path,
    reference_text: &str,
    result: &ScoreResult,
    suffix: &str,
) -> Result<PathBuf, String> {
    let out_path = build_textgrid_output_path(case_path, suffix)?;
    let analytics = &result.analytics;
    let max_word_end = analytics
        .timeline
        .iter()
        .map(|entry| entry.end_sec)
        .fold(0.0f64, f64::max);
    let xmax = max_word_end.max(analytics.speaking_rates.total_span_duration_sec).max(0.001);

    let mut textgrid = TextGrid::new(0.0, xmax).map_err(|err| {
        format!(
            "Failed to build TextGrid structure '{}': {err}",
            out_path.display()
        )
    })?;

    let mut words_intervals = Vec::with_capacity(analytics.timeline.len());
    let mut accuracy_intervals = Vec::with_capacity(analytics.timeline.len());
    let mut last_end = 0.0f64;
    for entry in &analytics.timeline {
        let start = entry.offset_sec.min(xmax).max(last_end);
        let end = entry.end_sec.min(xmax);
        if end <= start {
            continue;
        }
        words_intervals.push(Interval {
            xmin: start,
            xmax: end,
            text: entry.word.clone().unwrap_or_default(),
        });
        accuracy_intervals.push(Interval {
            xmin: start,
            xmax: end,
            text: accuracy_label(entry.accuracy_score, entry.error_type),
        });
        last_end = end;
    }

    let silence_intervals = analytics
        .silences
        .iter()
        .filter(|gap| gap.end_sec > gap.start_sec && gap.end_sec <= xmax)
        .map(|gap| Interval {
            xmin: gap.start_sec,
            xmax: gap.end_sec,
            text: format!("{:.2}", gap.duration_sec),
        })
        .collect();

    for (name, intervals) in [
        ("words", words_intervals),
        ("accuracy", accuracy_intervals),
        ("silences", silence_intervals),
    ] {
        textgrid
            .add_tier(interval_tier(name, xmax, intervals))
            .map_err(|err| {
                format!(
                    "Failed to add {name} tier for '{}': {err}",
                    out_path.display()
                )
            })?;
    }

    let reference = reference_text.trim();
    if !reference.is_empty() {
        let reference_tier = interval_tier(
            "reference",
            xmax,
            vec![Interval {
                xmin: 0.0,
                xmax,
                text: reference.to_string(),
            }],
        );
        textgrid.add_tier(reference_tier).map_err(|err| {
            format!(
                "Failed to add reference tier for '{}': {err}",
                out_path.display()
            )
        })?;
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create TextGrid output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    textgrid
        .to_file(&out_path, false)
        .map_err(|err| format!("Failed to write TextGrid '{}': {err}", out_path.display()))?;

    Ok(out_path)
}

fn interval_tier(name: &str, xmax: f64, intervals: Vec<Interval>) -> Tier {
    Tier {
        name: name.to_string(),
        tier_type: TierType::IntervalTier,
        xmin: 0.0,
        xmax,
        intervals,
        points: Vec::new(),
    }
}

fn accuracy_label(accuracy_score: Option<f64>, error_type: ErrorType) -> String {
    let score = accuracy_score
        .map(|value| format!("{value:.1}"))
        .unwrap_or_default();
    match error_type {
        ErrorType::Correct => score,
        other if score.is_empty() => other.as_str().to_string(),
        other => format!("{score} {}", other.as_str()),
    }
}

fn build_textgrid_output_path(case_path: &Path, suffix: &str) -> Result<PathBuf, String> {
    let stem = case_path
        .file_stem()
        .and_then(|value| value.to_str())
        .ok_or_else(|| {
            format!(
                "Failed to derive file stem for case path '{}'.",
                case_path.display()
            )
        })?;
    Ok(case_path.with_file_name(format!("{stem}{suffix}.TextGrid")))
}
