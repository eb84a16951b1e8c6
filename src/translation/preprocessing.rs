/*!
 * Glossary and author profile producers.
 *
 * This module provides:
 * - `TermExtractor`: local candidate-term extraction (1-3 word n-grams
 *   scored by frequency, with a bonus for proper-noun-like terms)
 * - `GlossaryBuilder`: asks the model to select and translate candidates
 * - `AuthorProfiler`: asks the model to describe the author's style
 *
 * Model answers that cannot be parsed as JSON are logged and replaced by an
 * empty value; the run continues.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::translation::capabilities::LanguagePair;
use crate::translation::context::{AuthorProfile, Glossary};
use crate::translation::core::TranslationService;
use crate::translation::prompts::{glossary_prompt, profile_prompt};

/// Word tokens, apostrophes and inner hyphens included
static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").unwrap()
});

/// Punctuation that ends a phrase; n-grams never cross it
static PHRASE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.,;:!?()\[\]{}"“”«»…—–]+|\n"#).unwrap()
});

/// Common English words that neither start nor end a candidate term
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "down", "each", "even", "for", "from", "had", "has", "have", "he", "her", "here", "him", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "just", "like", "may", "me", "might", "more",
    "most", "much", "must", "my", "no", "not", "now", "of", "off", "on", "once", "one", "only", "or",
    "other", "our", "out", "over", "said", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "up", "upon", "us", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "yet", "you", "your",
];

/// Configuration for candidate-term extraction.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Maximum number of candidates returned
    pub max_terms: usize,

    /// Longest n-gram considered, in words
    pub max_ngram: usize,

    /// Minimum occurrences for multi-word candidates
    pub min_phrase_occurrences: usize,

    /// Words that may not start or end a candidate
    pub stop_words: HashSet<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_terms: 100,
            max_ngram: 3,
            min_phrase_occurrences: 2,
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl ExtractionConfig {
    /// Default configuration returning at most `max_terms` candidates.
    pub fn with_max_terms(max_terms: usize) -> Self {
        Self {
            max_terms,
            ..Self::default()
        }
    }
}

/// Candidate term with its score
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTerm {
    /// Surface form, as first seen in the text
    pub term: String,
    /// Number of occurrences
    pub occurrences: usize,
    /// Ranking score, higher is better
    pub score: f64,
}

/// Local extractor of glossary candidates.
#[derive(Debug, Clone, Default)]
pub struct TermExtractor {
    config: ExtractionConfig,
}

impl TermExtractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract ranked candidates from `text`.
    pub fn extract(&self, text: &str) -> Vec<CandidateTerm> {
        // Lowercased key -> (first surface form, occurrences, capitalized occurrences)
        let mut counts: HashMap<String, (String, usize, usize)> = HashMap::new();

        for phrase in PHRASE_BREAK.split(text) {
            let words: Vec<&str> = WORD_PATTERN.find_iter(phrase).map(|m| m.as_str()).collect();

            for start in 0..words.len() {
                for len in 1..=self.config.max_ngram.min(words.len() - start) {
                    let gram = &words[start..start + len];
                    if !self.is_candidate(gram) {
                        continue;
                    }

                    let surface = gram.join(" ");
                    let capitalized = gram.iter().all(|w| starts_uppercase(w));
                    let entry = counts
                        .entry(surface.to_lowercase())
                        .or_insert_with(|| (surface.clone(), 0, 0));
                    entry.1 += 1;
                    if capitalized {
                        entry.2 += 1;
                    }
                }
            }
        }

        let mut candidates: Vec<CandidateTerm> = counts
            .into_values()
            .filter(|(term, occurrences, _)| {
                !term.contains(' ') || *occurrences >= self.config.min_phrase_occurrences
            })
            .map(|(term, occurrences, capitalized)| {
                let words = term.split(' ').count() as f64;
                let proper_noun_ratio = capitalized as f64 / occurrences as f64;
                let score = occurrences as f64 * (1.0 + proper_noun_ratio) * words.sqrt();
                CandidateTerm { term, occurrences, score }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        candidates.truncate(self.config.max_terms);

        debug!("Extracted {} candidate terms", candidates.len());
        candidates
    }

    /// Whether an n-gram may be a candidate
    fn is_candidate(&self, gram: &[&str]) -> bool {
        let (Some(&first), Some(&last)) = (gram.first(), gram.last()) else {
            return false;
        };

        let is_stop = |w: &str| self.config.stop_words.contains(&w.to_lowercase());
        if is_stop(first) || is_stop(last) {
            return false;
        }

        // Single short words and bare numbers are noise
        gram.len() > 1 || (first.chars().count() > 2 && !first.chars().all(|c| c.is_numeric()))
    }
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Slice from the first `open` to the last `close`, if both exist in that order
fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a glossary from a model answer: first `{...}` object, else first `[...]` array
pub fn parse_glossary_response(response: &str) -> Option<Glossary> {
    let parse = |json: &str| serde_json::from_str::<serde_json::Value>(json).ok();

    let value = outermost(response, '{', '}')
        .and_then(parse)
        .filter(|v| v.is_object())
        .or_else(|| outermost(response, '[', ']').and_then(parse).filter(|v| v.is_array()))?;

    let as_text = |v: serde_json::Value| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };

    match value {
        serde_json::Value::Object(map) => Some(Glossary::Mapping(
            map.into_iter().map(|(k, v)| (k, as_text(v))).collect::<BTreeMap<_, _>>(),
        )),
        serde_json::Value::Array(items) => Some(Glossary::Terms(items.into_iter().map(as_text).collect())),
        _ => None,
    }
}

/// Parse an author profile from a model answer: first `{...}` object
pub fn parse_profile_response(response: &str) -> Option<AuthorProfile> {
    outermost(response, '{', '}').and_then(|json| serde_json::from_str(json).ok())
}

/// First `max_chars` characters of `text`
fn sample_of(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Builds a glossary from local candidates and a model selection pass.
#[derive(Debug, Clone)]
pub struct GlossaryBuilder {
    service: Arc<TranslationService>,
    languages: LanguagePair,
    extractor: TermExtractor,
}

impl GlossaryBuilder {
    /// Create a builder sending prompts through `service`
    pub fn new(service: Arc<TranslationService>, languages: LanguagePair, max_terms: usize) -> Self {
        Self {
            service,
            languages,
            extractor: TermExtractor::new(ExtractionConfig::with_max_terms(max_terms)),
        }
    }

    /// Produce the glossary of `text`
    ///
    /// Provider failures are returned; an unparseable answer yields an empty glossary.
    pub async fn build(&self, text: &str, profile: &AuthorProfile) -> Result<Glossary, ProviderError> {
        let candidates: Vec<String> = self.extractor.extract(text).into_iter().map(|c| c.term).collect();
        if candidates.is_empty() {
            info!("No glossary candidates found");
            return Ok(Glossary::empty());
        }

        info!("Selecting glossary terms among {} candidates", candidates.len());
        let (system, user) = glossary_prompt(&self.languages.source, &self.languages.target, &candidates, profile);
        let completion = self.service.complete(&system, &user).await?;

        match parse_glossary_response(&completion.text) {
            Some(glossary) => {
                info!("Glossary created: {} entries", glossary.len());
                Ok(glossary)
            }
            None => {
                warn!("Glossary response is not valid JSON, continuing without glossary. Raw response:\n{}", completion.text);
                Ok(Glossary::empty())
            }
        }
    }
}

/// Describes the author's style from a text sample.
#[derive(Debug, Clone)]
pub struct AuthorProfiler {
    service: Arc<TranslationService>,
    sample_chars: usize,
}

impl AuthorProfiler {
    /// Create a profiler sending the first `sample_chars` characters of the text
    pub fn new(service: Arc<TranslationService>, sample_chars: usize) -> Self {
        Self { service, sample_chars }
    }

    /// Produce the profile of `author` from `text`
    ///
    /// An unparseable answer yields a profile carrying only the author name.
    pub async fn profile(&self, author: Option<&str>, text: &str) -> Result<AuthorProfile, ProviderError> {
        let fallback = || author.map(AuthorProfile::for_author).unwrap_or_default();

        let sample = sample_of(text, self.sample_chars);
        if sample.trim().is_empty() {
            return Ok(fallback());
        }

        info!("Generating author profile for {}", author.unwrap_or("unknown author"));
        let (system, user) = profile_prompt(author, sample);
        let completion = self.service.complete(&system, &user).await?;

        match parse_profile_response(&completion.text) {
            Some(mut profile) => {
                if profile.author.is_none() {
                    profile.author = author.map(str::to_string);
                }
                Ok(profile)
            }
            None => {
                warn!("Profile response is not valid JSON, continuing without style analysis. Raw response:\n{}", completion.text);
                Ok(fallback())
            }
        }
    }
}
