//! Text analysis pipelines
//!
//! Two explicitly separate configurations share the same front end
//! (UAX #29 word segmentation, lowercasing, ASCII folding):
//!
//! - [`TermAnalyzer`] drops stopwords and stems. Its output feeds the
//!   unigram statistics, where inflections must collapse onto one term.
//! - [`ShingleAnalyzer`] drops stopwords without stemming and emits
//!   overlapping two-word shingles, so phrases keep their surface form for
//!   the final output.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::Language;

pub mod fold;
pub mod stopwords;

pub use fold::fold_to_ascii;

/// A normalized token and the index of the word it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: usize,
}

/// Two adjacent surviving tokens joined by a single space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shingle {
    pub first: Token,
    pub second: Token,
}

impl Shingle {
    pub fn text(&self) -> String {
        format!("{} {}", self.first.text, self.second.text)
    }

    /// A phrase is valid only if every component word is.
    pub fn is_valid(&self) -> bool {
        is_valid_term(&self.first.text) && is_valid_term(&self.second.text)
    }
}

/// Rejects short noise, numbers and currency-like tokens: a term needs more
/// than two characters, at least three of them letters.
pub fn is_valid_term(token: &str) -> bool {
    if token.chars().count() <= 2 {
        return false;
    }
    token.chars().filter(|c| c.is_alphabetic()).take(3).count() == 3
}

fn algorithm(language: Language) -> Algorithm {
    match language {
        Language::En => Algorithm::English,
        Language::Pt => Algorithm::Portuguese,
    }
}

fn surface_stopwords(language: Language) -> HashSet<String> {
    stopwords::for_language(language).iter().map(|w| fold_to_ascii(w)).collect()
}

static EN_SURFACE: Lazy<HashSet<String>> = Lazy::new(|| surface_stopwords(Language::En));
static PT_SURFACE: Lazy<HashSet<String>> = Lazy::new(|| surface_stopwords(Language::Pt));

fn surface_set(language: Language) -> &'static HashSet<String> {
    match language {
        Language::En => &*EN_SURFACE,
        Language::Pt => &*PT_SURFACE,
    }
}

/// Lowercased, ASCII-folded words with their word index.
fn normalized_words(text: &str) -> impl Iterator<Item = (usize, String)> + '_ {
    text.unicode_words()
        .enumerate()
        .map(|(position, word)| (position, fold_to_ascii(&word.to_lowercase())))
        .filter(|(_, word)| !word.is_empty())
}

/// tokenize -> lowercase -> fold -> stopword filter -> stem
pub struct TermAnalyzer {
    language: Language,
    stemmer: Stemmer,
    stopwords: &'static HashSet<String>,
}

impl TermAnalyzer {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            stemmer: Stemmer::create(algorithm(language)),
            stopwords: surface_set(language),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Lazily yields normalized tokens. Calling again restarts the sequence.
    ///
    /// A token is dropped when either the folded word or its stem is on the
    /// stopword list; stems of stopwords are not themselves stopwords.
    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Token> + 'a {
        normalized_words(text).filter_map(move |(position, word)| {
            if self.stopwords.contains(&word) {
                return None;
            }
            let stem = self.stemmer.stem(&word).into_owned();
            if stem.is_empty() || self.stopwords.contains(&stem) {
                None
            } else {
                Some(Token { text: stem, position })
            }
        })
    }
}

/// tokenize -> lowercase -> fold -> stopword filter -> 2-word shingles
pub struct ShingleAnalyzer {
    language: Language,
    stopwords: &'static HashSet<String>,
}

impl ShingleAnalyzer {
    pub fn new(language: Language) -> Self {
        Self { language, stopwords: surface_set(language) }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Surface tokens (no stemming) that survive the stopword filter.
    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Token> + 'a {
        normalized_words(text).filter_map(move |(position, word)| {
            if self.stopwords.contains(&word) {
                None
            } else {
                Some(Token { text: word, position })
            }
        })
    }

    /// Overlapping windows over adjacent surviving tokens. Validity is not
    /// checked here; see [`Shingle::is_valid`].
    pub fn shingles<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Shingle> + 'a {
        let mut previous: Option<Token> = None;
        self.tokens(text).filter_map(move |token| {
            let shingle =
                previous.take().map(|first| Shingle { first, second: token.clone() });
            previous = Some(token);
            shingle
        })
    }

    /// Ordered texts of every shingle whose component words are all valid.
    pub fn valid_shingles(&self, text: &str) -> Vec<String> {
        self.shingles(text).filter(Shingle::is_valid).map(|s| s.text()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: impl Iterator<Item = Token>) -> Vec<String> {
        tokens.map(|t| t.text).collect()
    }

    #[test]
    fn valid_term_rules() {
        assert!(!is_valid_term("ab"));
        assert!(!is_valid_term("a1b"));
        assert!(is_valid_term("cat"));
        assert!(!is_valid_term("c4t99"));
        assert!(is_valid_term("c4ts9"));
        assert!(is_valid_term("beautiful"));
        assert!(!is_valid_term("1999"));
        assert!(!is_valid_term("$100.00"));
        assert!(is_valid_term("ção"));
    }

    #[test]
    fn term_analyzer_stems_and_drops_stopwords() {
        let analyzer = TermAnalyzer::new(Language::En);
        let tokens = texts(analyzer.tokens("The runners were running because of the rain"));
        assert_eq!(tokens, vec!["runner", "run", "rain"]);
    }

    #[test]
    fn words_sharing_a_stem_with_a_stopword_are_kept() {
        let analyzer = TermAnalyzer::new(Language::En);
        // "does" stems to "doe", which must not take the noun "doe" with it
        let tokens = texts(analyzer.tokens("The doe does roam"));
        assert_eq!(tokens, vec!["doe", "roam"]);
    }

    #[test]
    fn term_analyzer_keeps_positions_of_original_words() {
        let analyzer = TermAnalyzer::new(Language::En);
        let positions: Vec<usize> =
            analyzer.tokens("the quick brown fox").map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn term_analyzer_folds_and_lowercases() {
        let analyzer = TermAnalyzer::new(Language::En);
        let tokens = texts(analyzer.tokens("CAFÉ Naïve"));
        assert_eq!(tokens, vec!["cafe", "naiv"]);
    }

    #[test]
    fn term_analyzer_is_restartable() {
        let analyzer = TermAnalyzer::new(Language::En);
        let text = "Search engines index documents";
        assert_eq!(texts(analyzer.tokens(text)), texts(analyzer.tokens(text)));
    }

    #[test]
    fn term_analyzer_keeps_numbers_atomic() {
        let analyzer = TermAnalyzer::new(Language::En);
        let tokens = texts(analyzer.tokens("version 3.14 costs 1,000"));
        assert!(tokens.contains(&"3.14".to_string()));
        assert!(tokens.contains(&"1,000".to_string()));
    }

    #[test]
    fn portuguese_pipeline_uses_portuguese_stopwords() {
        let analyzer = TermAnalyzer::new(Language::Pt);
        let tokens = texts(analyzer.tokens("A informação não está disponível"));
        assert!(!tokens.iter().any(|t| t == "a" || t == "nao" || t == "esta"));
        assert!(tokens.iter().any(|t| t.starts_with("inform")));
    }

    #[test]
    fn shingles_keep_surface_forms() {
        let analyzer = ShingleAnalyzer::new(Language::En);
        let shingles: Vec<String> =
            analyzer.shingles("The runners were running quickly").map(|s| s.text()).collect();
        assert_eq!(shingles, vec!["runners running", "running quickly"]);
    }

    #[test]
    fn shingles_with_invalid_components_are_rejected() {
        let analyzer = ShingleAnalyzer::new(Language::En);
        let valid = analyzer.valid_shingles("We saw 3 cats near an ox");
        assert!(!valid.iter().any(|s| s == "3 cats" || s == "saw 3"));
        assert!(!valid.iter().any(|s| s == "near ox"));
        assert_eq!(valid, vec!["cats near".to_string()]);
    }

    #[test]
    fn single_token_text_has_no_shingles() {
        let analyzer = ShingleAnalyzer::new(Language::En);
        assert_eq!(analyzer.shingles("alone").count(), 0);
        assert_eq!(analyzer.shingles("").count(), 0);
    }
}
