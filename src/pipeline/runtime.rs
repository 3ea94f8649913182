use crate::config::ScoringConfig;
use crate::pipeline::traits::{MiscueAligner, ReferenceTokenizer};
use crate::scoring::aggregate::aggregate_scores;
use crate::scoring::analytics::{
    delay_index, per_word_aggregates, quality_score, silence_ratio, AccuracyDistribution,
    DelayLevel, SummaryStats, WordCounts,
};
use crate::scoring::compose::{compose_result, ResultParts, ScoreResult, Summary};
use crate::scoring::timeline::{build_timeline, detect_silences, speaking_rates};
use crate::types::{RecognizedWord, ScoringInput};

pub struct PronunciationScorer {
    config: ScoringConfig,
    tokenizer: Box<dyn ReferenceTokenizer>,
    miscue_aligner: Box<dyn MiscueAligner>,
}

pub(crate) struct PronunciationScorerParts {
    pub config: ScoringConfig,
    pub tokenizer: Box<dyn ReferenceTokenizer>,
    pub miscue_aligner: Box<dyn MiscueAligner>,
}

impl PronunciationScorer {
    pub(crate) fn from_parts(parts: PronunciationScorerParts) -> Self {
        Self {
            config: parts.config,
            tokenizer: parts.tokenizer,
            miscue_aligner: parts.miscue_aligner,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one complete utterance. Missing or malformed data degrades
    /// individual fields to zero or empty; this never fails.
    pub fn score(&self, input: &ScoringInput) -> ScoreResult {
        let recognized: Vec<RecognizedWord> = input
            .segments
            .iter()
            .flat_map(|segment| segment.words.iter().cloned())
            .collect();
        let recognized_text: Vec<String> = recognized.iter().map(|w| w.word.clone()).collect();

        let reference =
            self.tokenizer
                .tokenize(&input.reference_text, &input.locale, &recognized_text);
        let aligned =
            self.miscue_aligner
                .align(&reference, &recognized, self.config.enable_miscue);

        let scores = aggregate_scores(
            &aligned,
            &input.segments,
            reference.len(),
            &self.config.weights,
        );
        let counts = WordCounts::tally(&aligned, reference.len(), recognized.len());

        let timeline = build_timeline(&recognized);
        let rates = speaking_rates(&timeline);
        let silences = detect_silences(&timeline);

        let ratio = silence_ratio(&silences, rates.total_span_duration_sec);
        let delay = delay_index(scores.fluency, scores.completeness, ratio);
        let level = DelayLevel::from_delay_index(delay, &self.config.delay_thresholds);
        let quality = quality_score(delay, scores.accuracy, scores.fluency);

        tracing::debug!(
            locale = %input.locale,
            reference_tokens = reference.len(),
            recognized_words = recognized.len(),
            composite = scores.composite,
            delay_index = delay,
            level = level.code(),
            score = quality,
            "pronunciation scoring complete"
        );

        compose_result(ResultParts {
            segments: &input.segments,
            accuracy_distribution: AccuracyDistribution::from_timeline(&timeline),
            per_word: per_word_aggregates(&timeline),
            summary: Summary {
                stats: SummaryStats::from_timeline(
                    &timeline,
                    rates.total_span_duration_sec,
                    rates.total_articulation_time_sec,
                ),
                silence_ratio: ratio,
                delay_index: delay,
            },
            aligned,
            scores,
            counts,
            speaking_rates: rates,
            timeline,
            silences,
            level,
            quality_score: quality,
        })
    }
}
