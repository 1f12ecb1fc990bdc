use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Brand shown on every stream we return.
pub const BRAND: &str = "SKTonline";

const HD_LABEL: &str = "🟦 HD (720p)";
const SD_LABEL: &str = "🟨 SD (480p)";
const LD_LABEL: &str = "🟥 LD (360p)";

/// Audio/subtitle language tags recognised in video titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Cz,
    Sk,
    En,
    Hu,
    De,
    Fr,
    It,
    Es,
    Ru,
    Pl,
    Jp,
    Cn,
}

impl Language {
    /// Scan order used by [`extract_language_flags`].
    pub const ALL: [Language; 12] = [
        Language::Cz,
        Language::Sk,
        Language::En,
        Language::Hu,
        Language::De,
        Language::Fr,
        Language::It,
        Language::Es,
        Language::Ru,
        Language::Pl,
        Language::Jp,
        Language::Cn,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::Cz => "cz",
            Language::Sk => "sk",
            Language::En => "en",
            Language::Hu => "hu",
            Language::De => "de",
            Language::Fr => "fr",
            Language::It => "it",
            Language::Es => "es",
            Language::Ru => "ru",
            Language::Pl => "pl",
            Language::Jp => "jp",
            Language::Cn => "cn",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    pub fn flag(self) -> &'static str {
        match self {
            Language::Cz => "🇨🇿",
            Language::Sk => "🇸🇰",
            Language::En => "🇬🇧",
            Language::Hu => "🇭🇺",
            Language::De => "🇩🇪",
            Language::Fr => "🇫🇷",
            Language::It => "🇮🇹",
            Language::Es => "🇪🇸",
            Language::Ru => "🇷🇺",
            Language::Pl => "🇵🇱",
            Language::Jp => "🇯🇵",
            Language::Cn => "🇨🇳",
        }
    }
}

/// Strips diacritics: NFD decomposition, then every combining mark is dropped.
///
/// "Škoda" becomes "Skoda", "Pelíšky" becomes "Pelisky".
pub fn remove_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Keeps the first `word_count` whitespace-separated words, joined by single spaces.
pub fn shorten_title(title: &str, word_count: usize) -> String {
    title
        .split_whitespace()
        .take(word_count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds language tags written as standalone words ("Film CZ dabing" -> cz).
///
/// Matching is case-insensitive and word-bounded, so "CZECH" is not `cz`.
/// The result follows [`Language::ALL`] order and holds no duplicates.
pub fn extract_language_flags(title: &str) -> Vec<Language> {
    // Fronteira de palavra ASCII, como o `\b` das regex: "čSK" ainda conta como sk.
    let words: Vec<String> = title
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    Language::ALL
        .into_iter()
        .filter(|lang| words.iter().any(|w| w == lang.code()))
        .collect()
}

/// Maps the raw `label` attribute of a source tag to the stream name.
///
/// Anything unrecognised is kept as-is behind the brand prefix.
pub fn format_quality_label(label: &str) -> String {
    let lower = label.to_lowercase();
    let quality = if lower.contains("720p") || lower.contains("hd") {
        HD_LABEL
    } else if lower.contains("480p") || lower.contains("sd") {
        SD_LABEL
    } else if lower.contains("360p") || lower.contains("ld") {
        LD_LABEL
    } else {
        label
    };
    format!("{BRAND} {quality}")
}

/// Builds the multi-line stream title: page title, brand line, then flags if any.
pub fn format_display_title(title: &str, flags: &[Language]) -> String {
    let icons = flags
        .iter()
        .map(|lang| lang.flag())
        .collect::<Vec<_>>()
        .join(" ");

    let mut display = format!("{title}\n⚙️{BRAND}");
    if !icons.is_empty() {
        display.push('\n');
        display.push_str(&icons);
    }
    display
}

/// Decodes HTML entities in page titles and JSON-LD names.
///
/// Every HTML5 named reference plus numeric ones, in a single pass, so
/// "&amp;lt;" ends up as "&lt;", not "<".
pub fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
