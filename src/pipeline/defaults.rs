use crate::pipeline::traits::{MiscueAligner, ReferenceTokenizer};
use crate::scoring::miscue::align_miscues;
use crate::scoring::tokenization::tokenize_reference;
use crate::types::RecognizedWord;

pub struct LocaleAwareTokenizer;

impl ReferenceTokenizer for LocaleAwareTokenizer {
    fn tokenize(&self, reference_text: &str, locale: &str, recognized: &[String]) -> Vec<String> {
        tokenize_reference(reference_text, locale, recognized)
    }
}

pub struct LcsMiscueAligner;

impl MiscueAligner for LcsMiscueAligner {
    fn align(
        &self,
        reference: &[String],
        recognized: &[RecognizedWord],
        enable_miscue: bool,
    ) -> Vec<RecognizedWord> {
        align_miscues(reference, recognized, enable_miscue)
    }
}
