use crate::types::RecognizedWord;

pub trait ReferenceTokenizer: Send + Sync {
    fn tokenize(&self, reference_text: &str, locale: &str, recognized: &[String]) -> Vec<String>;
}

pub trait MiscueAligner: Send + Sync {
    fn align(
        &self,
        reference: &[String],
        recognized: &[RecognizedWord],
        enable_miscue: bool,
    ) -> Vec<RecognizedWord>;
}
