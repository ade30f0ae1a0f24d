//! Dialogue act data model
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator attached to a dialogue act parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// A single (slot, operator, value) parameter of a dialogue act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueActItem {
    pub slot: String,
    pub op: Operator,
    /// Slot value; `None` for requests and for decoded acts.
    pub value: Option<String>,
}

impl DialogueActItem {
    #[must_use]
    pub fn new<S: Into<String>>(slot: S, op: Operator, value: Option<String>) -> Self {
        Self {
            slot: slot.into(),
            op,
            value,
        }
    }
}

/// A dialogue act: an intent plus an ordered list of parameters.
///
/// Acts whose intent is outside the domain's parametrized set carry an empty
/// parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueAct {
    pub intent: String,
    pub params: Vec<DialogueActItem>,
}

impl DialogueAct {
    #[must_use]
    pub fn new<S: Into<String>>(intent: S, params: Vec<DialogueActItem>) -> Self {
        Self {
            intent: intent.into(),
            params,
        }
    }

    /// An act with no parameters.
    #[must_use]
    pub fn without_params<S: Into<String>>(intent: S) -> Self {
        Self::new(intent, Vec::new())
    }

    /// Names of the slots referenced by this act's parameters.
    #[must_use]
    pub fn slot_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.slot.clone()).collect()
    }
}
