use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Configuration accepts ISO 639-1 (2-letter) and ISO 639-2 (3-letter)
/// codes, optionally followed by a region (`ko-KR`, `pt_BR`). Remote APIs
/// are queried with the 2-letter form.

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Language part of a tag: `ko-KR` -> `ko`
pub fn primary_subtag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Resolve a 2- or 3-letter code to a language
fn resolve(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let terminology = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bibliographic, _)| *bibliographic == code)
                .map(|(_, terminology)| *terminology)
                .unwrap_or(code.as_str());
            Language::from_639_3(terminology)
        }
        _ => None,
    }
}

/// Validate an ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a code or tag to its ISO 639-1 (2-letter) form
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let language = resolve(primary_subtag(code))
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    language
        .to_639_1()
        .map(|part1| part1.to_string())
        .ok_or_else(|| anyhow!("Language {} has no 2-letter code", language.to_name()))
}

/// Check if two codes or tags name the same language, ignoring regions
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve(primary_subtag(code1)), resolve(primary_subtag(code2))) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code or tag
pub fn get_language_name(code: &str) -> Result<String> {
    let language = resolve(primary_subtag(code))
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(language.to_name().to_string())
}
