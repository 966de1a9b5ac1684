use anyhow::anyhow;
use image::{DynamicImage, GrayImage};
use rusty_tesseract::{Args, Image as TessImage};
use std::collections::HashMap;
use std::process::Command;

/// One OCR attempt configuration: recognition mode is always the LSTM
/// engine (`--oem 3`); the layout assumption varies per profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrProfile {
    /// Treat the image as a single text line (`--psm 7`). Best for the
    /// cropped sender header.
    SingleLine,
    /// Assume a uniform block of text (`--psm 6`).
    UniformBlock,
    /// Sparse text in no particular order (`--psm 11`).
    SparseText,
    /// Raw line, bypassing layout analysis (`--psm 13`).
    RawLine,
}

impl OcrProfile {
    pub fn psm(&self) -> i32 {
        match self {
            OcrProfile::SingleLine => 7,
            OcrProfile::UniformBlock => 6,
            OcrProfile::SparseText => 11,
            OcrProfile::RawLine => 13,
        }
    }
}

/// Profiles tried in order for sender extraction. Later entries only run
/// when earlier ones produced nothing authoritative.
pub const SENDER_PROFILES: [OcrProfile; 4] = [
    OcrProfile::SingleLine,
    OcrProfile::UniformBlock,
    OcrProfile::SparseText,
    OcrProfile::RawLine,
];

/// Single profile used for the full-image body pass.
pub const BODY_PROFILE: OcrProfile = OcrProfile::UniformBlock;

/// The OCR capability boundary: given an image and a profile, produce
/// text. A failed attempt is recoverable by the caller.
pub trait TextRecognizer {
    fn recognize(&self, image: &GrayImage, profile: OcrProfile) -> anyhow::Result<String>;
}

/// Recognizer backed by the system `tesseract` binary.
pub struct TesseractRecognizer {
    language: String,
}

impl TesseractRecognizer {
    /// Probe for the tesseract binary up front so a missing engine is a
    /// configuration error at startup, not a per-request surprise.
    pub fn new(language: &str) -> anyhow::Result<Self> {
        match Command::new("tesseract").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                log::debug!(
                    "Found tesseract: {}",
                    version.lines().next().unwrap_or("unknown version")
                );
                Ok(Self {
                    language: language.to_string(),
                })
            }
            Ok(output) => Err(anyhow!(
                "tesseract probe exited with {}; check the installation",
                output.status
            )),
            Err(e) => Err(anyhow!(
                "Tesseract OCR is not installed or not on PATH: {e}"
            )),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage, profile: OcrProfile) -> anyhow::Result<String> {
        let dynamic = DynamicImage::ImageLuma8(image.clone());
        let tess_image = TessImage::from_dynamic_image(&dynamic)
            .map_err(|e| anyhow!("failed to hand image to tesseract: {e}"))?;
        let args = Args {
            lang: self.language.clone(),
            config_variables: HashMap::new(),
            dpi: Some(150),
            psm: Some(profile.psm()),
            oem: Some(3),
        };
        rusty_tesseract::image_to_string(&tess_image, &args)
            .map_err(|e| anyhow!("tesseract run failed ({profile:?}): {e}"))
    }
}

/// Lazily run `profiles` against `image`, yielding one raw text candidate
/// per successful attempt in profile order. A failing attempt is logged
/// and skipped; it never aborts the sequence.
pub fn candidate_stream<'a, R: TextRecognizer>(
    recognizer: &'a R,
    image: &'a GrayImage,
    profiles: &'a [OcrProfile],
) -> impl Iterator<Item = String> + 'a {
    profiles
        .iter()
        .filter_map(move |profile| match recognizer.recognize(image, *profile) {
            Ok(text) => Some(text),
            Err(e) => {
                log::debug!("OCR attempt failed: {e}");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyRecognizer;

    impl TextRecognizer for FlakyRecognizer {
        fn recognize(&self, _image: &GrayImage, profile: OcrProfile) -> anyhow::Result<String> {
            match profile {
                OcrProfile::SingleLine => Ok("first".to_string()),
                OcrProfile::UniformBlock => Err(anyhow!("engine hiccup")),
                OcrProfile::SparseText => Ok("third".to_string()),
                OcrProfile::RawLine => Err(anyhow!("engine hiccup")),
            }
        }
    }

    #[test]
    fn test_profile_psm_mapping() {
        assert_eq!(OcrProfile::SingleLine.psm(), 7);
        assert_eq!(OcrProfile::UniformBlock.psm(), 6);
        assert_eq!(OcrProfile::SparseText.psm(), 11);
        assert_eq!(OcrProfile::RawLine.psm(), 13);
    }

    #[test]
    fn test_failed_attempts_are_skipped() {
        let image = GrayImage::from_pixel(4, 4, image::Luma([255]));
        let candidates: Vec<String> =
            candidate_stream(&FlakyRecognizer, &image, &SENDER_PROFILES).collect();
        assert_eq!(candidates, vec!["first", "third"]);
    }

    struct DeadRecognizer;

    impl TextRecognizer for DeadRecognizer {
        fn recognize(&self, _image: &GrayImage, _profile: OcrProfile) -> anyhow::Result<String> {
            Err(anyhow!("engine unavailable"))
        }
    }

    #[test]
    fn test_all_failures_yield_empty_sequence() {
        let image = GrayImage::from_pixel(4, 4, image::Luma([255]));
        let candidates: Vec<String> =
            candidate_stream(&DeadRecognizer, &image, &SENDER_PROFILES).collect();
        assert!(candidates.is_empty());
    }
}
