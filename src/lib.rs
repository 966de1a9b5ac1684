pub mod analyzer;
pub mod classifier;
pub mod cleanup;
pub mod config;
pub mod ocr;
pub mod preprocess;
pub mod reputation;
pub mod senders;
pub mod urls;

pub use analyzer::{AnalysisResult, Analyzer, UrlCheck, SENDER_NOT_DETECTED};
pub use classifier::{SenderClassifier, SenderToken, TokenProvenance};
pub use config::Config;
pub use ocr::{OcrProfile, TesseractRecognizer, TextRecognizer};
pub use reputation::{UrlReputation, UrlVerdict, Verdict, VirusTotalClient};
pub use senders::{JsonSenderStore, KnownSenderSource, SenderSource, StaticSenderSet};
