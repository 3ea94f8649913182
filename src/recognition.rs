//! Typed view of the recognizer's JSON result payload.
//!
//! Every field is optional and decoded leniently: a malformed value becomes
//! absent instead of failing the whole payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ScoringError;
use crate::types::{Alternative, ErrorType, RecognitionSegment, RecognizedWord};

/// Number of hypotheses kept as segment alternatives.
pub const MAX_ALTERNATIVES: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecognitionPayload {
    #[serde(rename = "NBest", deserialize_with = "lenient_vec")]
    pub nbest: Vec<Hypothesis>,
    #[serde(deserialize_with = "lenient_text")]
    pub display_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Hypothesis {
    #[serde(deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub display: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub lexical: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub pronunciation_assessment: Option<SegmentAssessment>,
    #[serde(deserialize_with = "lenient_vec")]
    pub words: Vec<PayloadWord>,
}

impl Hypothesis {
    pub fn display_text(&self) -> Option<String> {
        self.display
            .clone()
            .or_else(|| self.lexical.clone())
            .or_else(|| self.text.clone())
    }

    pub fn lexical_text(&self) -> Option<String> {
        self.lexical.clone().or_else(|| self.text.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SegmentAssessment {
    #[serde(deserialize_with = "lenient_number")]
    pub accuracy_score: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub fluency_score: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub prosody_score: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub completeness_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PayloadWord {
    #[serde(deserialize_with = "lenient_text")]
    pub word: Option<String>,
    #[serde(deserialize_with = "lenient_ticks")]
    pub offset: Option<u64>,
    #[serde(deserialize_with = "lenient_ticks")]
    pub duration: Option<u64>,
    #[serde(deserialize_with = "lenient_object")]
    pub pronunciation_assessment: Option<WordAssessment>,
    pub syllables: Option<Value>,
    pub phonemes: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WordAssessment {
    #[serde(deserialize_with = "lenient_number")]
    pub accuracy_score: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub error_type: Option<String>,
}

impl From<&PayloadWord> for RecognizedWord {
    fn from(word: &PayloadWord) -> Self {
        let assessment = word.pronunciation_assessment.as_ref();
        RecognizedWord {
            word: word.word.clone().unwrap_or_default(),
            accuracy_score: assessment.and_then(|pa| pa.accuracy_score),
            error_type: assessment
                .and_then(|pa| pa.error_type.as_deref())
                .map(ErrorType::from_label)
                .unwrap_or_default(),
            error_label: assessment.and_then(|pa| pa.error_type.clone()),
            offset_ticks: word.offset,
            duration_ticks: word.duration,
            syllables: word.syllables.clone().filter(|v| !v.is_null()),
            phonemes: word.phonemes.clone().filter(|v| !v.is_null()),
        }
    }
}

impl RecognitionSegment {
    /// Builds a segment from one raw recognizer payload, keeping the payload for audit.
    pub fn from_payload(raw: Value) -> Self {
        let payload = match RecognitionPayload::deserialize(&raw) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "unreadable recognition payload; keeping it raw only");
                RecognitionPayload::default()
            }
        };

        let best = payload.nbest.first();
        let assessment = best.and_then(|nb| nb.pronunciation_assessment.as_ref());
        let best_raw = raw
            .get("NBest")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .cloned();

        RecognitionSegment {
            words: best
                .map(|nb| nb.words.iter().map(RecognizedWord::from).collect())
                .unwrap_or_default(),
            fluency_score: assessment.and_then(|pa| pa.fluency_score),
            prosody_score: assessment.and_then(|pa| pa.prosody_score),
            confidence: best.and_then(|nb| nb.confidence),
            display: best
                .and_then(Hypothesis::display_text)
                .or_else(|| payload.display_text.clone()),
            lexical: best.and_then(Hypothesis::lexical_text),
            alternatives: payload
                .nbest
                .iter()
                .take(MAX_ALTERNATIVES)
                .map(|nb| Alternative {
                    display: nb.display_text(),
                    lexical: nb.lexical_text(),
                    confidence: nb.confidence,
                })
                .collect(),
            best: best_raw,
            raw: Some(raw),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScoringError> {
        let raw: Value = serde_json::from_str(json)
            .map_err(|e| ScoringError::json("parse recognition payload", e))?;
        if !raw.is_object() {
            return Err(ScoringError::invalid_input(
                "recognition payload must be a JSON object",
            ));
        }
        Ok(Self::from_payload(raw))
    }
}

fn lenient_ticks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(ticks_from_value))
}

fn ticks_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> Deserialize<'a>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|v| T::deserialize(&v).ok()))
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> Deserialize<'a>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| T::deserialize(item).ok())
        .collect())
}
