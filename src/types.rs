use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Word-level error classification reported by the recognizer or assigned by miscue alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ErrorType {
    /// Serialized as `"None"`, the recognizer's label for a correctly spoken word.
    #[default]
    #[serde(rename = "None")]
    Correct,
    Omission,
    Insertion,
    Mispronunciation,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "None",
            Self::Omission => "Omission",
            Self::Insertion => "Insertion",
            Self::Mispronunciation => "Mispronunciation",
        }
    }

    /// Maps a recognizer label onto the closed classification.
    ///
    /// Prosody break labels (`UnexpectedBreak`, `MissingBreak`, `Monotone`) and
    /// unknown labels are deviations from the reference and count as mispronunciations.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "" | "None" | "Correct" => Self::Correct,
            "Omission" => Self::Omission,
            "Insertion" => Self::Insertion,
            _ => Self::Mispronunciation,
        }
    }
}

impl From<String> for ErrorType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

/// One word emitted by the recognizer, or a synthetic omission created by alignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognizedWord {
    pub word: String,
    /// Per-word accuracy in [0, 100]; `None` when the recognizer did not score the word.
    pub accuracy_score: Option<f64>,
    pub error_type: ErrorType,
    /// Error label exactly as the recognizer reported it, e.g. `UnexpectedBreak`.
    pub error_label: Option<String>,
    pub offset_ticks: Option<u64>,
    pub duration_ticks: Option<u64>,
    /// Sub-word detail passed through untouched; its shape varies by locale.
    pub syllables: Option<Value>,
    pub phonemes: Option<Value>,
}

impl RecognizedWord {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Self::default()
        }
    }

    /// Reference word the speaker never said: no accuracy and no timing.
    pub fn omission(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            error_type: ErrorType::Omission,
            ..Self::default()
        }
    }

    pub fn with_accuracy(mut self, accuracy_score: f64) -> Self {
        self.accuracy_score = Some(accuracy_score);
        self
    }

    pub fn with_timing(mut self, offset_ticks: u64, duration_ticks: u64) -> Self {
        self.offset_ticks = Some(offset_ticks);
        self.duration_ticks = Some(duration_ticks);
        self
    }

    pub fn with_error_type(&self, error_type: ErrorType) -> Self {
        Self {
            error_type,
            ..self.clone()
        }
    }

    pub fn duration_ticks_or_zero(&self) -> u64 {
        self.duration_ticks.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alternative {
    pub display: Option<String>,
    pub lexical: Option<String>,
    pub confidence: Option<f64>,
}

/// One unit of continuous recognition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionSegment {
    pub words: Vec<RecognizedWord>,
    pub fluency_score: Option<f64>,
    pub prosody_score: Option<f64>,
    pub confidence: Option<f64>,
    pub display: Option<String>,
    pub lexical: Option<String>,
    pub alternatives: Vec<Alternative>,
    /// Best hypothesis object of the raw payload.
    pub best: Option<Value>,
    /// Full raw payload, retained for audit.
    pub raw: Option<Value>,
}

impl RecognitionSegment {
    pub fn from_words(words: Vec<RecognizedWord>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    /// Sum of word durations; words without a duration count as zero.
    pub fn duration_ticks(&self) -> u64 {
        self.words
            .iter()
            .map(RecognizedWord::duration_ticks_or_zero)
            .fold(0u64, u64::saturating_add)
    }

    /// Earliest word offset and latest word end, or `None` when no word carries timing.
    pub fn time_span_ticks(&self) -> Option<(u64, u64)> {
        let mut span: Option<(u64, u64)> = None;
        for word in &self.words {
            let Some(offset) = word.offset_ticks else {
                continue;
            };
            let end = offset.saturating_add(word.duration_ticks_or_zero());
            span = Some(match span {
                Some((start, stop)) => (start.min(offset), stop.max(end)),
                None => (offset, end),
            });
        }
        span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringInput {
    pub reference_text: String,
    /// BCP-47 style locale tag, e.g. `en-US` or `zh-CN`.
    pub locale: String,
    pub segments: Vec<RecognitionSegment>,
}

impl ScoringInput {
    pub fn new(
        reference_text: impl Into<String>,
        locale: impl Into<String>,
        segments: Vec<RecognitionSegment>,
    ) -> Self {
        Self {
            reference_text: reference_text.into(),
            locale: locale.into(),
            segments,
        }
    }
}

/// Failure reported by a recognition or synthesis collaborator in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&ErrorType::Correct).expect("serialize");
        assert_eq!(json, "\"None\"");
        let parsed: ErrorType = serde_json::from_str("\"Omission\"").expect("deserialize");
        assert_eq!(parsed, ErrorType::Omission);
    }

    #[test]
    fn prosody_break_labels_count_as_mispronunciation() {
        assert_eq!(ErrorType::from_label("UnexpectedBreak"), ErrorType::Mispronunciation);
        assert_eq!(ErrorType::from_label("Monotone"), ErrorType::Mispronunciation);
        assert_eq!(ErrorType::from_label("Correct"), ErrorType::Correct);
        assert_eq!(ErrorType::from_label(""), ErrorType::Correct);
    }

    #[test]
    fn reclassification_leaves_original_untouched() {
        let word = RecognizedWord::new("hello").with_accuracy(88.0);
        let inserted = word.with_error_type(ErrorType::Insertion);
        assert_eq!(word.error_type, ErrorType::Correct);
        assert_eq!(inserted.error_type, ErrorType::Insertion);
        assert_eq!(inserted.accuracy_score, Some(88.0));
    }

    #[test]
    fn segment_duration_and_span() {
        let segment = RecognitionSegment::from_words(vec![
            RecognizedWord::new("a").with_timing(5_000_000, 2_000_000),
            RecognizedWord::new("b"),
            RecognizedWord::new("c").with_timing(10_000_000, 3_000_000),
        ]);
        assert_eq!(segment.duration_ticks(), 5_000_000);
        assert_eq!(segment.time_span_ticks(), Some((5_000_000, 13_000_000)));
        assert_eq!(RecognitionSegment::default().time_span_ticks(), None);
    }

    #[test]
    fn failure_response_is_never_successful() {
        let failure = FailureResponse::new("recognizer unavailable");
        assert!(!failure.success);
        let json = serde_json::to_value(&failure).expect("serialize");
        assert_eq!(json["success"], false);
    }
}
