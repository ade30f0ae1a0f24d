//! Fixed token vocabulary
use crate::domain::Domain;
use crate::state::StateFields;
use regex::Regex;
use std::collections::HashMap;

/// Id of the padding marker.
pub const PAD_ID: i64 = 0;
/// Id of the unknown-token marker.
///
/// Reserved for id stability only: unknown tokens are dropped during
/// encoding, never mapped to this id.
pub const UNK_ID: i64 = 1;

const PAD_TOKEN: &str = "<pad>";
const UNK_TOKEN: &str = "<unk>";

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Regular-expression tokenizer.
///
/// Splits on word sequences of length >= 2 or single non-word characters and
/// drops stray quote tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\b\w\w+\b|\S").expect("tokenizer pattern is valid"),
        }
    }

    pub fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|&t| t != "\"")
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed string-to-id mapping built once at construction.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    stoi: HashMap<String, i64>,
    itos: Vec<String>,
}

impl Vocabulary {
    /// Build the vocabulary for a domain.
    ///
    /// Covers every domain vocabulary string, the digits 0-9 (numeric state
    /// fields serialize to digit tokens), and the structural tokens of the
    /// canonical serialization of a default state. First occurrence wins;
    /// ids 0 and 1 are reserved for the padding and unknown markers.
    #[must_use]
    pub fn build(domain: &Domain, tokenizer: &Tokenizer) -> Self {
        let empty_state = StateFields::default().canonical_string();
        let state_tokens = tokenizer.tokenize(&empty_state);

        let mut vocabulary = Self {
            stoi: HashMap::new(),
            itos: Vec::new(),
        };
        vocabulary.insert(PAD_TOKEN);
        vocabulary.insert(UNK_TOKEN);
        for token in domain
            .vocabulary_strings()
            .chain(DIGITS)
            .chain(state_tokens)
        {
            vocabulary.insert(token);
        }
        vocabulary
    }

    fn insert(&mut self, token: &str) {
        if !self.stoi.contains_key(token) {
            #[allow(clippy::cast_possible_truncation)]
            let id = self.itos.len() as i64;
            self.stoi.insert(token.into(), id);
            self.itos.push(token.into());
        }
    }

    /// Number of entries, reserved markers included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.itos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    /// Id of a token, `None` if out of vocabulary.
    #[must_use]
    pub fn id(&self, token: &str) -> Option<i64> {
        self.stoi.get(token).copied()
    }

    /// Token for an id, `None` if out of range.
    #[must_use]
    pub fn token(&self, id: i64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.itos.get(i))
            .map(String::as_str)
    }
}
