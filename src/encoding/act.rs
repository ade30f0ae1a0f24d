//! Dialogue act to numeric action codec
use crate::acts::{DialogueAct, DialogueActItem, Operator};
use crate::domain::Domain;
use ndarray::Array1;

/// A dialogue act in numeric form: a categorical intent id and a multi-hot
/// slot-presence vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAct {
    pub intent: i64,
    pub slots: Array1<f32>,
}

/// Bidirectional mapping between dialogue acts and [`EncodedAct`]s.
///
/// Both directions are fit once, over the domain's full vocabulary rather
/// than observed data, so the mapping is stable for the whole training run.
/// Classes are sorted lexicographically before id assignment.
#[derive(Debug, Clone)]
pub struct ActCodec {
    intents: Vec<String>,
    slots: Vec<String>,
    parametrized_intents: Vec<String>,
}

impl ActCodec {
    #[must_use]
    pub fn new(domain: &Domain) -> Self {
        let mut intents: Vec<String> = domain
            .parametrized_intents()
            .iter()
            .chain(domain.system_intents())
            .cloned()
            .collect();
        intents.sort_unstable();
        intents.dedup();

        let mut slots: Vec<String> = domain
            .requestable_slots()
            .iter()
            .chain(domain.system_requestable_slots())
            .cloned()
            .collect();
        slots.sort_unstable();
        slots.dedup();

        Self {
            intents,
            slots,
            parametrized_intents: domain.parametrized_intents().to_vec(),
        }
    }

    #[must_use]
    pub fn num_intents(&self) -> usize {
        self.intents.len()
    }

    #[must_use]
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Encode an intent and its slot names.
    ///
    /// Slot names outside the domain vocabulary are ignored.
    #[must_use]
    pub fn encode(&self, intent: &str, slots: &[String]) -> EncodedAct {
        let intent_id = self
            .intents
            .binary_search_by(|i| i.as_str().cmp(intent))
            .expect("intent not in the domain vocabulary");
        let mut multi_hot = Array1::zeros(self.slots.len());
        for slot in slots {
            if let Ok(i) = self.slots.binary_search(slot) {
                multi_hot[i] = 1.0;
            }
        }
        #[allow(clippy::cast_possible_truncation)]
        let intent = intent_id as i64;
        EncodedAct {
            intent,
            slots: multi_hot,
        }
    }

    /// Encode the act taken at a dialogue turn.
    ///
    /// Caller contract: the turn must hold a single act. A dialogue manager
    /// may bundle an offer with several informs; such bundles are truncated
    /// to their first act by design, and the truncated material is lost.
    /// Any other multi-act input is a contract violation.
    ///
    /// # Panics
    /// If more than one act remains after offer truncation.
    #[must_use]
    pub fn encode_acts(&self, acts: &[DialogueAct]) -> EncodedAct {
        let acts = if acts.iter().any(|a| a.intent == "offer") {
            &acts[..1]
        } else {
            acts
        };
        assert_eq!(acts.len(), 1, "action batches must hold exactly one act");
        let act = &acts[0];
        self.encode(&act.intent, &act.slot_names())
    }

    /// Decode a numeric action back into dialogue acts.
    ///
    /// Inverts [`encode`](Self::encode) for any vector it produced on valid
    /// domain values. Behavior on arbitrary vectors is implementation
    /// defined: slots decode only for parametrized intents and a slot is
    /// considered present above 0.5.
    #[must_use]
    pub fn decode(&self, action: &EncodedAct) -> Vec<DialogueAct> {
        let intent = self.intents[usize::try_from(action.intent).expect("negative intent id")]
            .clone();
        let params = if self.parametrized_intents.contains(&intent) {
            action
                .slots
                .iter()
                .zip(&self.slots)
                .filter(|&(&presence, _)| presence > 0.5)
                .map(|(_, slot)| DialogueActItem::new(slot.clone(), Operator::Eq, None))
                .collect()
        } else {
            Vec::new()
        };
        vec![DialogueAct::new(intent, params)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::TestOntology;

    fn codec() -> ActCodec {
        ActCodec::new(&Domain::from_ontology(&TestOntology))
    }

    /// Every subset of the domain slots, up to pairs plus the full set.
    fn slot_subsets(codec: &ActCodec) -> Vec<Vec<String>> {
        let slots = &codec.slots;
        let mut subsets = vec![Vec::new(), slots.clone()];
        for (i, a) in slots.iter().enumerate() {
            subsets.push(vec![a.clone()]);
            for b in &slots[i + 1..] {
                subsets.push(vec![a.clone(), b.clone()]);
            }
        }
        subsets
    }

    #[test]
    fn round_trip_all_valid_pairs() {
        let codec = codec();
        for intent in codec.intents.clone() {
            let subsets = if codec.parametrized_intents.contains(&intent) {
                slot_subsets(&codec)
            } else {
                vec![Vec::new()]
            };
            for slots in subsets {
                let encoded = codec.encode(&intent, &slots);
                let decoded = codec.decode(&encoded);
                assert_eq!(decoded.len(), 1);
                assert_eq!(decoded[0].intent, intent);
                let mut decoded_slots = decoded[0].slot_names();
                decoded_slots.sort_unstable();
                let mut expected = slots;
                expected.sort_unstable();
                assert_eq!(decoded_slots, expected);
            }
        }
    }

    #[test]
    fn encoding_is_stable_across_construction() {
        let a = codec();
        let b = codec();
        let slots = vec!["area".into(), "phone".into()];
        assert_eq!(a.encode("inform", &slots), b.encode("inform", &slots));
    }

    #[test]
    fn offer_bundles_truncate_to_the_first_act() {
        let codec = codec();
        let bundle = vec![
            DialogueAct::without_params("offer"),
            DialogueAct::new(
                "inform",
                vec![DialogueActItem::new("area", Operator::Eq, None)],
            ),
            DialogueAct::new(
                "inform",
                vec![DialogueActItem::new("food", Operator::Eq, None)],
            ),
        ];
        let encoded = codec.encode_acts(&bundle);
        assert_eq!(encoded, codec.encode("offer", &[]));
    }

    #[test]
    #[should_panic(expected = "exactly one act")]
    fn multiple_non_offer_acts_are_a_contract_violation() {
        let codec = codec();
        let acts = vec![
            DialogueAct::without_params("bye"),
            DialogueAct::without_params("ack"),
        ];
        let _ = codec.encode_acts(&acts);
    }

    #[test]
    fn unknown_slots_are_ignored() {
        let codec = codec();
        let encoded = codec.encode("request", &["starsign".into()]);
        assert!(encoded.slots.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn multi_hot_width_covers_the_slot_union() {
        let codec = codec();
        // addr, area, food, phone, postcode
        assert_eq!(codec.num_slots(), 5);
        assert_eq!(codec.num_intents(), 2 + 13);
    }
}
