use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref DELIMITERS: Regex = Regex::new(r"[\s\-_]+").expect("valid regex");
}

/// Lower-case a raw term. Applied to every term at index and query time.
pub fn process_term(term: &str) -> String {
    term.to_lowercase()
}

/// Tokenize text into normalized terms.
///
/// NFKC normalization, split on whitespace/hyphen/underscore runs, trim
/// surrounding punctuation, split camelCase compounds, lower-case.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>();
    let mut terms = Vec::new();
    for piece in DELIMITERS.split(&normalized) {
        let piece = piece.trim_matches(|c: char| !c.is_alphanumeric());
        if piece.is_empty() { continue; }
        for word in split_camel_case(piece) {
            terms.push(process_term(word));
        }
    }
    terms
}

/// Split at lower→upper transitions (`useState` → `use`, `State`) and at the
/// end of an acronym run (`HTMLParser` → `HTML`, `Parser`).
fn split_camel_case(piece: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = piece.char_indices().collect();
    let mut words = Vec::new();
    let mut start = 0;
    for i in 1..chars.len() {
        let (offset, cur) = chars[i];
        if !cur.is_uppercase() { continue; }
        let prev = chars[i - 1].1;
        let next_is_lower = chars.get(i + 1).map_or(false, |(_, c)| c.is_lowercase());
        let boundary = prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower);
        if boundary {
            words.push(&piece[start..offset]);
            start = offset;
        }
    }
    words.push(&piece[start..]);
    words.retain(|w| !w.is_empty());
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        assert_eq!(tokenize("useTransition Demo"), vec!["use", "transition", "demo"]);
    }

    #[test]
    fn acronym_runs_stay_together() {
        assert_eq!(tokenize("HTMLParser"), vec!["html", "parser"]);
        assert_eq!(tokenize("ES6Features"), vec!["es6", "features"]);
        assert_eq!(tokenize("CSS"), vec!["css"]);
    }

    #[test]
    fn trims_punctuation() {
        assert_eq!(tokenize("(React, Vue.)"), vec!["react", "vue"]);
        assert!(tokenize("--- ... ___").is_empty());
    }
}
