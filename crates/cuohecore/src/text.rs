//! Inbound text normalization

/// A message in its two working forms.
///
/// `raw` is what gets logged and parsed; `clean` is what the keyword chain matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub raw: String,
    pub clean: String,
}

/// Trims the message and derives the matching form: full-width colons become `:`,
/// ASCII spaces are removed and the result is lower-cased.
pub fn normalize(input: &str) -> NormalizedText {
    let raw = input.trim().to_string();
    let clean = raw.replace('：', ":").replace(' ', "").to_lowercase();
    NormalizedText { raw, clean }
}
