use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    // UI chrome and punctuation that OCR picks up around the sender label.
    // Spaces and dashes are deliberately kept so phone numbers survive.
    static ref NOISE_PATTERN: Regex = Regex::new(
        r#"[€<>«»→←↑↓▶◀▲▼■□●○★☆♦♣♠♥…·•@#$%^&*()_+=\[\]{}|\\:;"',.?/~`]"#
    )
    .expect("noise pattern is valid");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
    static ref PHONE_PATTERN: Regex = Regex::new(r"(0\d{9})").expect("phone pattern is valid");
    static ref SHORTCODE_PATTERN: Regex =
        Regex::new(r"\b(\d{4,5})\b").expect("short code pattern is valid");
    static ref TEXT_PATTERN: Regex =
        Regex::new(r"\b([A-Za-z]{4,})\b").expect("text pattern is valid");
    static ref ALNUM_PATTERN: Regex =
        Regex::new(r"\b([A-Za-z0-9]{3,})\b").expect("alphanumeric pattern is valid");
}

/// Which cascade rule produced a token. Rules are listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenProvenance {
    ExactKnownMatch,
    PhonePattern,
    ShortCodePattern,
    TextPattern,
    AlphanumericFallback,
    FirstWordFallback,
}

/// The extracted sender identifier and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderToken {
    pub value: String,
    pub provenance: TokenProvenance,
}

impl SenderToken {
    fn new(value: impl Into<String>, provenance: TokenProvenance) -> Self {
        Self {
            value: value.into(),
            provenance,
        }
    }

    /// Text-like tokens (non-numeric, or short numeric codes) are the shape
    /// legitimate sender ids take; ten-digit numbers are ordinary phones.
    pub fn is_text_like(&self) -> bool {
        !self.value.chars().all(|c| c.is_ascii_digit()) || self.value.len() <= 5
    }
}

/// Views of one OCR line shared by the cascade rules.
///
/// `cleaned` has UI noise replaced by spaces and whitespace collapsed;
/// `squashed` additionally drops spaces and dashes so split phone
/// numbers read as one digit run.
struct LineViews<'a> {
    raw: &'a str,
    no_spaces: String,
    cleaned: String,
    squashed: String,
}

impl<'a> LineViews<'a> {
    fn from_line(raw: &'a str) -> Self {
        let no_spaces = raw.replace(' ', "");
        let cleaned = NOISE_PATTERN.replace_all(raw, " ");
        let cleaned = WHITESPACE_RUN
            .replace_all(&cleaned, " ")
            .trim()
            .to_string();
        let squashed = cleaned.replace([' ', '-'], "");
        Self {
            raw,
            no_spaces,
            cleaned,
            squashed,
        }
    }
}

type LineRule = fn(&SenderClassifier, &LineViews<'_>) -> Option<SenderToken>;

/// Per-line rules in priority order. The first rule to produce a token
/// wins; keeping this a flat list keeps the priority auditable and each
/// rule independently testable.
const LINE_RULES: &[LineRule] = &[
    SenderClassifier::rule_exact_known,
    SenderClassifier::rule_space_collapsed_known,
    SenderClassifier::rule_phone,
    SenderClassifier::rule_short_code,
    SenderClassifier::rule_text,
    SenderClassifier::rule_alphanumeric,
];

/// Deterministic cascade that pulls a single sender identifier out of
/// noisy OCR output.
///
/// Each of the first five non-empty lines is run through the prioritized
/// rule chain; the first rule to match wins and short-circuits the rest.
/// Exact matches against the known-sender list outrank everything, since
/// those are the strings a legitimate message must carry verbatim.
pub struct SenderClassifier {
    known_senders: Vec<String>,
}

impl SenderClassifier {
    pub fn new(known_senders: Vec<String>) -> Self {
        Self { known_senders }
    }

    /// Classify one raw OCR candidate into at most one token.
    pub fn classify_candidate(&self, raw_text: &str) -> Option<SenderToken> {
        let lines: Vec<&str> = raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return None;
        }
        log::debug!("Classifying {} OCR lines", lines.len());

        for line in lines.iter().take(5) {
            let views = LineViews::from_line(line);
            log::debug!("Cleaned line: '{}'", views.cleaned);
            for rule in LINE_RULES {
                if let Some(token) = rule(self, &views) {
                    return Some(token);
                }
            }
        }

        self.first_word_fallback(lines[0])
    }

    /// A known sender appearing verbatim in the line wins outright.
    fn rule_exact_known(&self, views: &LineViews<'_>) -> Option<SenderToken> {
        for known in &self.known_senders {
            if views.raw.contains(known.as_str()) {
                log::debug!("Exact match for '{known}' in line: {}", views.raw);
                return Some(SenderToken::new(
                    known.as_str(),
                    TokenProvenance::ExactKnownMatch,
                ));
            }
        }
        None
    }

    /// OCR sometimes splits a word ("Sure Pay"); collapsing spaces
    /// recovers the original form.
    fn rule_space_collapsed_known(&self, views: &LineViews<'_>) -> Option<SenderToken> {
        for known in &self.known_senders {
            if views.no_spaces.contains(known.as_str()) {
                log::debug!("Space-collapsed match for '{known}' in line: {}", views.raw);
                return Some(SenderToken::new(
                    known.as_str(),
                    TokenProvenance::ExactKnownMatch,
                ));
            }
        }
        None
    }

    /// Ten-digit phone number starting with 0, read from the squashed
    /// view so separators do not break it up.
    fn rule_phone(&self, views: &LineViews<'_>) -> Option<SenderToken> {
        let caps = PHONE_PATTERN.captures(&views.squashed)?;
        Some(SenderToken::new(&caps[1], TokenProvenance::PhonePattern))
    }

    /// Standalone 4-5 digit short code, rejected when the squashed line
    /// continues with more digits (then it is just a fragment of a
    /// longer phone number).
    fn rule_short_code(&self, views: &LineViews<'_>) -> Option<SenderToken> {
        let caps = SHORTCODE_PATTERN.captures(&views.cleaned)?;
        let code = &caps[1];
        let embedded = views.squashed.match_indices(code).any(|(i, _)| {
            views
                .squashed
                .as_bytes()
                .get(i + code.len())
                .is_some_and(|b| b.is_ascii_digit())
        });
        if embedded {
            return None;
        }
        Some(SenderToken::new(code, TokenProvenance::ShortCodePattern))
    }

    /// A word of 4+ letters, original case preserved.
    fn rule_text(&self, views: &LineViews<'_>) -> Option<SenderToken> {
        let caps = TEXT_PATTERN.captures(&views.cleaned)?;
        Some(SenderToken::new(&caps[1], TokenProvenance::TextPattern))
    }

    /// Any alphanumeric run of 3+, unless it is a long purely-numeric
    /// string (those belong to the phone rule).
    fn rule_alphanumeric(&self, views: &LineViews<'_>) -> Option<SenderToken> {
        let caps = ALNUM_PATTERN.captures(&views.cleaned)?;
        let candidate = &caps[1];
        if candidate.chars().all(|c| c.is_ascii_digit()) && candidate.len() > 5 {
            return None;
        }
        Some(SenderToken::new(
            candidate,
            TokenProvenance::AlphanumericFallback,
        ))
    }

    /// Last resort: salvage something from the first line's first word.
    fn first_word_fallback(&self, first_line: &str) -> Option<SenderToken> {
        let words: Vec<&str> = first_line.split_whitespace().collect();
        let first_word = words.first()?;

        let joined: String = words.concat().replace('-', "");
        if let Some(caps) = PHONE_PATTERN.captures(&joined) {
            log::debug!("Fallback phone result: {}", &caps[1]);
            return Some(SenderToken::new(&caps[1], TokenProvenance::PhonePattern));
        }

        let stripped: String = first_word
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if stripped.is_empty() {
            return None;
        }
        log::debug!("Fallback result: {stripped}");
        Some(SenderToken::new(stripped, TokenProvenance::FirstWordFallback))
    }

    /// Select the single best token across an ordered sequence of OCR
    /// candidates.
    ///
    /// A token whose value sits in the known-sender list returns
    /// immediately without consuming further candidates; otherwise the
    /// first token found is kept and never overwritten by later ones.
    pub fn select_best(&self, candidates: impl Iterator<Item = String>) -> Option<SenderToken> {
        let mut best: Option<SenderToken> = None;

        for raw_text in candidates {
            let Some(token) = self.classify_candidate(&raw_text) else {
                continue;
            };

            if self.known_senders.iter().any(|k| *k == token.value) {
                log::debug!("Matched known sender: {}", token.value);
                return Some(token);
            }

            if best.is_none() {
                log::debug!(
                    "Keeping {} candidate '{}' ({:?})",
                    if token.is_text_like() {
                        "text-like"
                    } else {
                        "numeric"
                    },
                    token.value,
                    token.provenance
                );
                best = Some(token);
            }
        }

        best
    }
}
