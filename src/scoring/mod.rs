pub mod aggregate;
pub mod analytics;
pub mod compose;
pub mod miscue;
pub mod timeline;
pub mod tokenization;
