pub mod config;
pub mod error;
pub mod locale;
pub mod pipeline;
pub mod recognition;
pub mod report;
pub mod scoring;
pub mod types;

pub use config::{DelayThresholds, ScoreWeights, ScoringConfig};
pub use error::ScoringError;
pub use pipeline::builder::PronunciationScorerBuilder;
pub use pipeline::runtime::PronunciationScorer;
pub use pipeline::traits::{MiscueAligner, ReferenceTokenizer};
pub use report::{aggregate_reports, compute_case_report, AggregateReport, CaseReport, Meta, Report};
pub use scoring::analytics::DelayLevel;
pub use scoring::compose::ScoreResult;
pub use types::{
    Alternative, ErrorType, FailureResponse, RecognitionSegment, RecognizedWord, ScoringInput,
};
