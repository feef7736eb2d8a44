//! Salient fragments of a quotation, used when similarity search fails.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["“]([^"“”]+)["”]"#).expect("invalid quoted pattern"));

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[\d,]+(?:\.\d{2})?").expect("invalid amount pattern"));

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b").expect("invalid date pattern")
});

const STOPWORDS: [&str; 12] = [
    "the", "a", "an", "and", "or", "of", "to", "in", "for", "shall", "will", "may",
];

/// Extract up to `limit` distinct key phrases, in priority order:
/// quoted sub-strings, currency amounts, dates, then every 3-word window
/// that is not made up only of stopwords.
pub fn extract_key_phrases(text: &str, limit: usize) -> Vec<String> {
    let quoted = QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let amounts = AMOUNT.find_iter(text).map(|m| m.as_str().to_string());
    let dates = DATE.find_iter(text).map(|m| m.as_str().to_string());

    let words: Vec<&str> = text.split_whitespace().collect();
    let windows = words
        .windows(3)
        .filter(|w| !w.iter().all(|word| is_stopword(word)))
        .map(|w| w.join(" "));

    let mut phrases: Vec<String> = Vec::new();
    for phrase in quoted.chain(amounts).chain(dates).chain(windows) {
        if phrases.len() == limit {
            break;
        }
        if !phrases.contains(&phrase) {
            phrases.push(phrase);
        }
    }
    phrases
}

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let phrases = extract_key_phrases(
            r#"Pay "Base Rent" of $1,250.00 by 01/15/2025 monthly"#,
            10,
        );
        assert_eq!(phrases[0], "Base Rent");
        assert_eq!(phrases[1], "$1,250.00");
        assert_eq!(phrases[2], "01/15/2025");
        assert_eq!(phrases[3], r#"Pay "Base Rent""#);
    }

    #[test]
    fn test_stopword_windows_skipped() {
        let phrases = extract_key_phrases("and the of roof repairs", 10);
        assert_eq!(phrases, vec!["the of roof", "of roof repairs"]);
    }

    #[test]
    fn test_curly_quotes() {
        let phrases = extract_key_phrases("the “Premises” means", 10);
        assert_eq!(phrases[0], "Premises");
    }

    #[test]
    fn test_limit_and_dedupe() {
        let text = "rent is due rent is due rent is due rent is due rent is due rent is due";
        let phrases = extract_key_phrases(text, 10);
        assert_eq!(phrases, vec!["rent is due", "is due rent", "due rent is"]);

        let long = (0..40).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        assert_eq!(extract_key_phrases(&long, 10).len(), 10);
    }

    #[test]
    fn test_short_text() {
        assert!(extract_key_phrases("two words", 10).is_empty());
        assert!(extract_key_phrases("", 10).is_empty());
    }
}
