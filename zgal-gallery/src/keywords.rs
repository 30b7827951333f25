//! Keyword sanitizer
//!
//! Turns free-text record keywords into stable filter keys: trim, drop every
//! character outside `[A-Za-z0-9]`, lowercase. Many raw spellings collapse to
//! one key ("Multi-layer gardens (on forest land)" and "Multi layer gardens
//! on forest land" are the same filter).
//!
//! Non-ASCII letters are dropped as well. That loses information for labels
//! such as "Dehesa (España)" but keeps keys usable as selector class names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Official EURAF agroforestry typology labels, highlighted in the category listing
pub const TYPOLOGY_KEYWORDS: [&str; 17] = [
    "Silvopastoral",
    "Silvoarable",
    "Permanent crop",
    "Agro-silvo-pasture",
    "Landscape features",
    "Urban agroforestry",
    "Wood pasture",
    "Tree alley cropping",
    "Coppice alley cropping",
    "Multi-layer gardens (on agricultural land)",
    "Orchard intercropping",
    "Orchard grazing",
    "Alternating cropping and grazing",
    "Hedges, trees in groups, trees in lines, individual trees",
    "Forest grazing",
    "Multi-layer gardens (on forest land)",
    "Homegardens, allotments, etc",
];

/// Canonical filter key derived from a raw keyword
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizedKeyword(String);

impl SanitizedKeyword {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keys that sanitized to nothing are never indexed or used as tags
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this key belongs to the official typology list
    pub fn is_typology(&self) -> bool {
        !self.is_empty() && TYPOLOGY_KEYWORDS.iter().any(|label| sanitize(label) == *self)
    }
}

impl fmt::Display for SanitizedKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedKeyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sanitize a raw keyword into its filter key
///
/// # Examples
///
/// ```
/// use zgal_gallery::keywords::sanitize;
///
/// assert_eq!(sanitize("  Tree alley cropping ").as_str(), "treealleycropping");
/// assert_eq!(
///     sanitize("Multi-layer gardens (on forest land)"),
///     sanitize("Multi layer gardens on forest land"),
/// );
/// ```
pub fn sanitize(raw: &str) -> SanitizedKeyword {
    SanitizedKeyword(
        raw.trim()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect(),
    )
}

/// Distinct non-empty keys for a keyword list, in first-seen order
pub fn tag_set<'a, I>(keywords: I) -> Vec<SanitizedKeyword>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags: Vec<SanitizedKeyword> = Vec::new();
    for key in keywords.into_iter().map(sanitize) {
        if !key.is_empty() && !tags.contains(&key) {
            tags.push(key);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_punctuation_and_case() {
        assert_eq!(sanitize("Agro-silvo-pasture").as_str(), "agrosilvopasture");
        assert_eq!(
            sanitize("Hedges, trees in groups, trees in lines, individual trees").as_str(),
            "hedgestreesingroupstreesinlinesindividualtrees"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in ["  Silvopastoral ", "Homegardens, allotments, etc", "Año 2023!", ""] {
            let once = sanitize(raw);
            assert_eq!(sanitize(once.as_str()), once);
        }
    }

    #[test]
    fn test_sanitize_equivalent_spellings() {
        assert_eq!(
            sanitize("Multi-layer gardens (on forest land)"),
            sanitize("Multi layer gardens on forest land")
        );
        assert_eq!(sanitize("Silvopastoral"), sanitize("silvopastoral "));
    }

    #[test]
    fn test_sanitize_drops_non_ascii_letters() {
        // Lossy on purpose: accented letters disappear, they are not transliterated
        assert_eq!(sanitize("España").as_str(), "espaa");
        assert_eq!(sanitize("Ökologie").as_str(), "kologie");
        assert!(sanitize("日本").is_empty());
    }

    #[test]
    fn test_typology_membership() {
        assert!(sanitize("silvo pastoral").is_typology());
        assert!(sanitize("Multi layer gardens on forest land").is_typology());
        assert!(!sanitize("Olive trees").is_typology());
        assert!(!sanitize("").is_typology());
    }

    #[test]
    fn test_tag_set_dedupes_and_skips_empty() {
        let tags = tag_set(["Silvopastoral", "silvopastoral ", "???", "Cows"]);
        assert_eq!(
            tags,
            vec![sanitize("Silvopastoral"), sanitize("cows")]
        );
    }
}
