//! Dialogue state to token-id sequences
use super::vocab::{Tokenizer, Vocabulary};
use crate::domain::Domain;
use crate::state::CanonicalState;

/// Encodes dialogue states as bounded-length token-id sequences.
///
/// The vocabulary is fixed at construction; tokens outside it are silently
/// dropped rather than mapped to an unknown marker. Dropping is contractual:
/// downstream training depends on out-of-vocabulary material vanishing from
/// the sequence.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    vocabulary: Vocabulary,
    tokenizer: Tokenizer,
    max_len: usize,
}

impl StateEncoder {
    #[must_use]
    pub fn new(domain: &Domain, max_len: usize) -> Self {
        let tokenizer = Tokenizer::new();
        let vocabulary = Vocabulary::build(domain, &tokenizer);
        Self {
            vocabulary,
            tokenizer,
            max_len,
        }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Upper bound on encoded sequence length.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Encode a state. The result has length `<= max_len` and may be empty.
    pub fn encode<S: CanonicalState + ?Sized>(&self, state: &S) -> Vec<i64> {
        self.encode_canonical(&state.fields().canonical_string())
    }

    /// Encode an already-canonicalized state string.
    #[must_use]
    pub fn encode_canonical(&self, text: &str) -> Vec<i64> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter_map(|token| self.vocabulary.id(token))
            .take(self.max_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acts::{DialogueAct, DialogueActItem, Operator};
    use crate::domain::testing::TestOntology;
    use crate::state::StateFields;

    /// A state type with volatile extras that never reach the canonical view.
    struct NoisyState {
        fields: StateFields,
        #[allow(dead_code)]
        uuid: u128,
        #[allow(dead_code)]
        db_result: Vec<String>,
    }

    impl CanonicalState for NoisyState {
        fn fields(&self) -> StateFields {
            self.fields.clone()
        }
    }

    fn encoder() -> StateEncoder {
        StateEncoder::new(&Domain::from_ontology(&TestOntology), 80)
    }

    fn sample_fields() -> StateFields {
        StateFields {
            filled_slots: vec!["area".into(), "food".into()],
            requested_slot: "phone".into(),
            user_acts: vec![DialogueAct::new(
                "request",
                vec![DialogueActItem::new("phone", Operator::Eq, None)],
            )],
            last_sys_acts: Some(vec![DialogueAct::without_params("welcomemsg")]),
            turn: 4,
            db_matches_ratio: 0.25,
            ..StateFields::default()
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = encoder();
        let fields = sample_fields();
        assert_eq!(encoder.encode(&fields), encoder.encode(&fields));
        assert!(!encoder.encode(&fields).is_empty());
    }

    #[test]
    fn excluded_fields_do_not_affect_encoding() {
        let encoder = encoder();
        let a = NoisyState {
            fields: sample_fields(),
            uuid: 7,
            db_result: vec!["kings arms".into()],
        };
        let b = NoisyState {
            fields: sample_fields(),
            uuid: 12345,
            db_result: Vec::new(),
        };
        assert_eq!(encoder.encode(&a), encoder.encode(&b));
    }

    #[test]
    fn unknown_tokens_are_dropped_not_mapped() {
        let encoder = encoder();
        let known = encoder.encode_canonical("area");
        let with_noise = encoder.encode_canonical("area zanzibar");
        assert_eq!(known, with_noise);
        assert!(!with_noise.contains(&super::super::vocab::UNK_ID));
    }

    #[test]
    fn output_is_bounded() {
        let encoder = StateEncoder::new(&Domain::from_ontology(&TestOntology), 3);
        let ids = encoder.encode(&sample_fields());
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn fully_unknown_input_encodes_empty() {
        let encoder = encoder();
        assert!(encoder.encode_canonical("zanzibar xylophone").is_empty());
    }
}
