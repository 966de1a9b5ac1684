use crate::classifier::{SenderClassifier, SenderToken};
use crate::cleanup;
use crate::config::Config;
use crate::ocr::{self, TextRecognizer, BODY_PROFILE, SENDER_PROFILES};
use crate::preprocess;
use crate::reputation::{UrlReputation, UrlVerdict};
use crate::senders::KnownSenderSource;
use crate::urls;
use anyhow::Context;
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sentinel reported when no sender token could be extracted. A valid
/// terminal outcome, not an error.
pub const SENDER_NOT_DETECTED: &str = "Sender not detected";

pub const VERDICT_LEGITIMATE: &str = "Legitimate Message";
pub const VERDICT_SCAM: &str = "Likely a Scam";

/// One entry of the per-URL report: either a checked URL with its
/// verdict, or the placeholder emitted when the body held no URLs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UrlCheck {
    Checked { url: String, verdict: UrlVerdict },
    Placeholder { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub sender_id: String,
    pub is_known: bool,
    pub verdict: String,
    pub message: String,
    pub advice: Vec<String>,
    pub urls_checked: Vec<UrlCheck>,
}

/// Request-scoped analysis pipeline over injected collaborators: an OCR
/// capability, a URL reputation capability and a known-sender source.
pub struct Analyzer<R, V, S> {
    recognizer: R,
    reputation: V,
    senders: S,
    classifier: SenderClassifier,
    config: Config,
}

impl<R, V, S> Analyzer<R, V, S>
where
    R: TextRecognizer,
    V: UrlReputation,
    S: KnownSenderSource,
{
    pub fn new(config: Config, recognizer: R, reputation: V, senders: S) -> Self {
        let classifier = SenderClassifier::new(config.known_senders.clone());
        Self {
            recognizer,
            reputation,
            senders,
            classifier,
            config,
        }
    }

    /// Analyze a screenshot on disk. Sweeps old uploads first, then
    /// decodes the image; only a decode failure is fatal here.
    pub async fn analyze_file(&self, path: &Path) -> anyhow::Result<AnalysisResult> {
        cleanup::delete_old_uploads(
            Path::new(&self.config.upload_dir),
            self.config.retention_days,
        );

        let img = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;

        if self.config.save_preprocessed {
            let debug_path = preprocessed_copy_path(path);
            match preprocess::normalize_header(&img).save(&debug_path) {
                Ok(()) => log::debug!("Preprocessed image saved to {}", debug_path.display()),
                Err(e) => log::warn!("Could not save preprocessed copy: {e}"),
            }
        }

        Ok(self.analyze_image(&img).await)
    }

    /// Run the full pipeline over a decoded screenshot.
    pub async fn analyze_image(&self, img: &DynamicImage) -> AnalysisResult {
        let sender = self.extract_sender(img);

        let body_text = self.extract_body_text(img);
        let found_urls = urls::extract_urls(&body_text);
        log::debug!("Extracted {} URLs from message body", found_urls.len());

        let mut urls_checked = Vec::new();
        if found_urls.is_empty() {
            urls_checked.push(UrlCheck::Placeholder {
                message: "No URLs found in the message".to_string(),
            });
        } else {
            // Each URL resolves independently; a failure becomes an Error
            // verdict for that URL without blocking the rest.
            for url in found_urls {
                let verdict = self.reputation.check_url(&url).await;
                urls_checked.push(UrlCheck::Checked { url, verdict });
            }
        }

        let is_known = sender
            .as_ref()
            .is_some_and(|token| self.senders.is_known(&token.value));

        self.compose(sender, is_known, urls_checked)
    }

    fn extract_sender(&self, img: &DynamicImage) -> Option<SenderToken> {
        let header = preprocess::normalize_header(img);
        let candidates = ocr::candidate_stream(&self.recognizer, &header, &SENDER_PROFILES);
        let token = self.classifier.select_best(candidates);
        match &token {
            Some(token) => log::debug!("Final extracted sender ID: '{}'", token.value),
            None => log::debug!("No sender ID extracted"),
        }
        token
    }

    fn extract_body_text(&self, img: &DynamicImage) -> String {
        let body = preprocess::prepare_body(img);
        match self.recognizer.recognize(&body, BODY_PROFILE) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Body OCR pass failed, continuing without URLs: {e}");
                String::new()
            }
        }
    }

    fn compose(
        &self,
        sender: Option<SenderToken>,
        is_known: bool,
        urls_checked: Vec<UrlCheck>,
    ) -> AnalysisResult {
        let org = &self.config.organization;
        let sender_list = self.config.known_senders.join(", ");
        let sender_id = sender
            .map(|token| token.value)
            .unwrap_or_else(|| SENDER_NOT_DETECTED.to_string());

        let (verdict, message, advice) = if is_known {
            (
                VERDICT_LEGITIMATE.to_string(),
                format!(
                    "The sender ID \"{sender_id}\" is recognized as an official {org} \
                     communication channel. This message appears to be legitimate."
                ),
                vec![
                    format!("Always confirm messages come from official sender IDs: {sender_list}."),
                    format!(
                        "You can safely interact with official {org} messages, \
                         but stay alert for unexpected links."
                    ),
                ],
            )
        } else {
            (
                VERDICT_SCAM.to_string(),
                format!(
                    "The sender ID \"{sender_id}\" is NOT recognized by {org}. \
                     This message shows signs of a potential smishing attempt."
                ),
                vec![
                    format!("{org} sends communication through {sender_list} only."),
                    "Do not click on suspicious links.".to_string(),
                    "Block and report the sender immediately.".to_string(),
                    "Delete the message to stay safe.".to_string(),
                ],
            )
        };

        AnalysisResult {
            sender_id,
            is_known,
            verdict,
            message,
            advice,
            urls_checked,
        }
    }
}

fn preprocessed_copy_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("png");
    path.with_file_name(format!("{stem}_preprocessed.{extension}"))
}
