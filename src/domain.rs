//! Domain schema derived from an ontology
use crate::acts::{DialogueAct, DialogueActItem, Operator};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Intents that carry slot parameters. Inform and request are modelled
/// together with their arguments; all other intents are parameterless.
pub const PARAMETRIZED_INTENTS: [&str; 2] = ["inform", "request"];

/// Parameterless system-side intents (DSTC2 inventory).
pub const SYSTEM_INTENTS: [&str; 13] = [
    "offer",
    "canthelp",
    "affirm",
    "deny",
    "ack",
    "bye",
    "reqmore",
    "welcomemsg",
    "expl-conf",
    "select",
    "repeat",
    "confirm-domain",
    "confirm",
];

/// Parameterless user-side intents (DSTC2 inventory).
pub const USER_INTENTS: [&str; 13] = [
    "affirm",
    "negate",
    "deny",
    "ack",
    "thankyou",
    "bye",
    "reqmore",
    "hello",
    "expl-conf",
    "repeat",
    "reqalts",
    "restart",
    "confirm",
];

/// Source of the domain's slot inventories.
///
/// Consumed exactly once, by [`Domain::from_ontology`].
pub trait Ontology {
    /// Slots the user may constrain with a value.
    fn informable_slots(&self) -> Vec<String>;
    /// Slots the user may ask the system about.
    fn requestable_slots(&self) -> Vec<String>;
    /// Slots the system may ask the user about.
    fn system_requestable_slots(&self) -> Vec<String>;
}

/// Immutable record of the domain-specific vocabularies.
///
/// Created once at policy construction and read-only thereafter; the encoders
/// derived from it are fit exactly once and never refit mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    parametrized_intents: Vec<String>,
    system_intents: Vec<String>,
    user_intents: Vec<String>,
    system_requestable_slots: Vec<String>,
    requestable_slots: Vec<String>,
    num_actions: usize,
}

impl Domain {
    /// Build the schema from an ontology.
    ///
    /// The derived action-space size counts the parameterless system intents
    /// plus one request action per system-requestable slot plus one inform
    /// action per requestable slot.
    pub fn from_ontology(ontology: &dyn Ontology) -> Self {
        let requestable_slots = ontology.requestable_slots();
        let system_requestable_slots = ontology.system_requestable_slots();

        let num_actions =
            SYSTEM_INTENTS.len() + system_requestable_slots.len() + requestable_slots.len();

        Self {
            parametrized_intents: PARAMETRIZED_INTENTS.iter().map(|&s| s.into()).collect(),
            system_intents: SYSTEM_INTENTS.iter().map(|&s| s.into()).collect(),
            user_intents: USER_INTENTS.iter().map(|&s| s.into()).collect(),
            system_requestable_slots,
            requestable_slots,
            num_actions,
        }
    }

    #[must_use]
    pub fn parametrized_intents(&self) -> &[String] {
        &self.parametrized_intents
    }

    #[must_use]
    pub fn system_intents(&self) -> &[String] {
        &self.system_intents
    }

    #[must_use]
    pub fn user_intents(&self) -> &[String] {
        &self.user_intents
    }

    #[must_use]
    pub fn system_requestable_slots(&self) -> &[String] {
        &self.system_requestable_slots
    }

    #[must_use]
    pub fn requestable_slots(&self) -> &[String] {
        &self.requestable_slots
    }

    /// Total size of the derived action space.
    #[must_use]
    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Whether acts of this intent carry slot parameters.
    #[must_use]
    pub fn is_parametrized(&self, intent: &str) -> bool {
        self.parametrized_intents.iter().any(|i| i == intent)
    }

    /// Every string in the domain vocabularies, in schema declaration order.
    pub(crate) fn vocabulary_strings(&self) -> impl Iterator<Item = &str> {
        self.parametrized_intents
            .iter()
            .chain(&self.system_intents)
            .chain(&self.user_intents)
            .chain(&self.system_requestable_slots)
            .chain(&self.requestable_slots)
            .map(String::as_str)
    }
}

/// Sample a uniformly random parametrized system act.
///
/// Informs draw their slot from the requestable slots, requests from the
/// system-requestable slots.
pub fn random_system_act<R: Rng + ?Sized>(domain: &Domain, rng: &mut R) -> Vec<DialogueAct> {
    let intent = domain
        .parametrized_intents()
        .choose(rng)
        .expect("domain has no parametrized intents")
        .clone();
    let slot_pool = match intent.as_str() {
        "inform" => domain.requestable_slots(),
        "request" => domain.system_requestable_slots(),
        other => panic!("intent {:?} is not parametrized", other),
    };
    let params = slot_pool
        .choose(rng)
        .map(|slot| DialogueActItem::new(slot.clone(), Operator::Eq, None))
        .into_iter()
        .collect();
    vec![DialogueAct::new(intent, params)]
}
