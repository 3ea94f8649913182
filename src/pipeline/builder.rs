use std::path::Path;

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::pipeline::defaults::{LcsMiscueAligner, LocaleAwareTokenizer};
use crate::pipeline::runtime::{PronunciationScorer, PronunciationScorerParts};
use crate::pipeline::traits::{MiscueAligner, ReferenceTokenizer};

pub struct PronunciationScorerBuilder {
    config: ScoringConfig,
    tokenizer: Option<Box<dyn ReferenceTokenizer>>,
    miscue_aligner: Option<Box<dyn MiscueAligner>>,
}

impl PronunciationScorerBuilder {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            miscue_aligner: None,
        }
    }

    pub fn from_config_file(path: &Path) -> Result<Self, ScoringError> {
        Ok(Self::new(ScoringConfig::load(path)?))
    }

    pub fn with_miscue(mut self, enable_miscue: bool) -> Self {
        self.config.enable_miscue = enable_miscue;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn ReferenceTokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_miscue_aligner(mut self, miscue_aligner: Box<dyn MiscueAligner>) -> Self {
        self.miscue_aligner = Some(miscue_aligner);
        self
    }

    pub fn build(self) -> Result<PronunciationScorer, ScoringError> {
        self.config.validate()?;
        Ok(PronunciationScorer::from_parts(PronunciationScorerParts {
            config: self.config,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(LocaleAwareTokenizer)),
            miscue_aligner: self
                .miscue_aligner
                .unwrap_or_else(|| Box::new(LcsMiscueAligner)),
        }))
    }
}

impl Default for PronunciationScorerBuilder {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::analytics::DelayLevel;
    use crate::types::{ErrorType, RecognitionSegment, RecognizedWord, ScoringInput};

    const SEC: u64 = 10_000_000;

    struct UppercaseTokenizer;

    impl ReferenceTokenizer for UppercaseTokenizer {
        fn tokenize(&self, reference_text: &str, _locale: &str, _recognized: &[String]) -> Vec<String> {
            reference_text
                .split_whitespace()
                .map(str::to_uppercase)
                .collect()
        }
    }

    fn word(text: &str, accuracy: f64, offset_sec: u64) -> RecognizedWord {
        RecognizedWord::new(text)
            .with_accuracy(accuracy)
            .with_timing(offset_sec * SEC, SEC / 2)
    }

    fn segment(words: Vec<RecognizedWord>, fluency: f64, prosody: Option<f64>) -> RecognitionSegment {
        RecognitionSegment {
            words,
            fluency_score: Some(fluency),
            prosody_score: prosody,
            ..RecognitionSegment::default()
        }
    }

    #[test]
    fn builder_defaults() {
        let scorer = PronunciationScorerBuilder::default().build().expect("build should succeed");
        assert!(scorer.config().enable_miscue);
    }

    #[test]
    fn builder_miscue_can_be_disabled() {
        let scorer = PronunciationScorerBuilder::default()
            .with_miscue(false)
            .build()
            .expect("build should succeed");
        assert!(!scorer.config().enable_miscue);
    }

    #[test]
    fn build_fails_on_invalid_config() {
        let mut config = ScoringConfig::default();
        config.delay_thresholds.slight = 0.9;
        let result = PronunciationScorerBuilder::new(config).build();
        assert!(matches!(result, Err(ScoringError::InvalidConfig { .. })));
    }

    #[test]
    fn build_fails_on_missing_config_file() {
        let result = PronunciationScorerBuilder::from_config_file(Path::new("/nonexistent/scoring.json"));
        assert!(result.is_err());
    }

    #[test]
    fn custom_tokenizer_is_used() {
        let scorer = PronunciationScorerBuilder::default()
            .with_tokenizer(Box::new(UppercaseTokenizer))
            .build()
            .expect("build should succeed");
        // Recognized text is lowercased for comparison, so uppercase tokens never match.
        let input = ScoringInput::new(
            "hello",
            "en-US",
            vec![segment(vec![word("hello", 90.0, 0)], 90.0, None)],
        );
        let result = scorer.score(&input);
        assert_eq!(result.analytics.counts.omissions, 1);
        assert_eq!(result.analytics.counts.insertions, 1);
    }

    #[test]
    fn empty_input_scores_structurally_complete_result() {
        let scorer = PronunciationScorerBuilder::default().build().expect("build should succeed");
        let result = scorer.score(&ScoringInput::new("", "en-US", Vec::new()));
        assert_eq!(result.accuracy_score, 0.0);
        assert_eq!(result.completeness_score, 0.0);
        assert_eq!(result.fluency_score, 0.0);
        assert_eq!(result.prosody_score, 0.0);
        assert!((1..=10).contains(&result.score));
        assert!(result.analytics.timeline.is_empty());
        assert!(result.analytics.silences.is_empty());
        assert_eq!(result.levels.len(), 4);
        assert_eq!(result.level_measured, DelayLevel::Severe);
    }

    #[test]
    fn perfect_reading_scores_high() {
        let scorer = PronunciationScorerBuilder::default().build().expect("build should succeed");
        let input = ScoringInput::new(
            "The quick brown fox.",
            "en-US",
            vec![segment(
                vec![
                    word("the", 100.0, 0),
                    word("quick", 100.0, 1),
                    word("brown", 100.0, 2),
                    word("fox", 100.0, 3),
                ],
                100.0,
                Some(100.0),
            )],
        );
        let result = scorer.score(&input);
        assert_eq!(result.accuracy_score, 100.0);
        assert_eq!(result.completeness_score, 100.0);
        assert!((result.paragraph_pronunciation_score - 100.0).abs() < 1e-9);
        assert_eq!(result.analytics.word_error_rate_percent, 0.0);
        assert_eq!(result.analytics.silences.len(), 3);
        assert!(result
            .words
            .iter()
            .all(|w| w.error_type == ErrorType::Correct));
    }

    #[test]
    fn miscues_flow_into_counts_and_wer() {
        let scorer = PronunciationScorerBuilder::default().build().expect("build should succeed");
        let input = ScoringInput::new(
            "i like green tea",
            "en-US",
            vec![
                segment(vec![word("i", 90.0, 0), word("really", 70.0, 1)], 80.0, Some(60.0)),
                segment(vec![word("like", 80.0, 2), word("tea", 100.0, 3)], 80.0, None),
            ],
        );
        let result = scorer.score(&input);
        let counts = result.analytics.counts;
        assert_eq!(counts.reference_word_count, 4);
        assert_eq!(counts.recognized_word_count, 4);
        assert_eq!(counts.correct, 3);
        assert_eq!(counts.insertions, 1);
        assert_eq!(counts.omissions, 1);
        assert!((result.analytics.word_error_rate_percent - 50.0).abs() < 1e-9);
        // (90 + 80 + 0 + 100) / 4, insertion excluded, omission scored as zero
        assert!((result.accuracy_score - 67.5).abs() < 1e-9);
        assert_eq!(result.completeness_score, 75.0);
        assert_eq!(result.prosody_score, 60.0);
        assert_eq!(result.words.len(), 5);
        assert_eq!(result.analytics.segment_summaries.len(), 2);
        assert_eq!(result.analytics.transcripts.display.len(), 2);
    }

    #[test]
    fn disabled_miscue_keeps_recognized_words() {
        let scorer = PronunciationScorerBuilder::default()
            .with_miscue(false)
            .build()
            .expect("build should succeed");
        let input = ScoringInput::new(
            "i like green tea",
            "en-US",
            vec![segment(vec![word("i", 90.0, 0), word("really", 70.0, 1)], 80.0, None)],
        );
        let result = scorer.score(&input);
        assert_eq!(result.words.len(), 2);
        assert_eq!(result.analytics.counts.omissions, 0);
        assert_eq!(result.analytics.counts.insertions, 0);
        assert_eq!(result.completeness_score, 50.0);
    }

    #[test]
    fn combining_marks_in_reference_match_recognized_word() {
        let scorer = PronunciationScorerBuilder::default().build().expect("build should succeed");
        let input = ScoringInput::new(
            "जगत्",
            "hi-IN",
            vec![segment(vec![word("जगत्", 95.0, 0)], 90.0, None)],
        );
        let result = scorer.score(&input);
        let counts = result.analytics.counts;
        assert_eq!(counts.correct, 1);
        assert_eq!(counts.insertions, 0);
        assert_eq!(counts.omissions, 0);
        assert_eq!(result.analytics.word_error_rate_percent, 0.0);
        assert_eq!(result.completeness_score, 100.0);
    }

    #[test]
    fn non_finite_scores_keep_composite_finite() {
        let scorer = PronunciationScorerBuilder::default().build().expect("build should succeed");
        let input = ScoringInput::new(
            "hello",
            "en-US",
            vec![segment(vec![word("hello", f64::NAN, 0)], f64::NAN, None)],
        );
        let result = scorer.score(&input);
        assert_eq!(result.accuracy_score, 0.0);
        assert_eq!(result.fluency_score, 0.0);
        assert!(result.paragraph_pronunciation_score.is_finite());
        assert!(result.analytics.summary.delay_index.is_finite());
    }
}
