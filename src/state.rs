//! Canonical view of a dialogue state
//!
//! The state encoder does not read dialogue-state objects directly. State
//! types implement [`CanonicalState`] by mapping themselves to the explicit
//! field list in [`StateFields`]; everything volatile (raw context, per-turn
//! entropy caches, database-result objects, UUIDs, user goals, raw slot maps,
//! the item in focus) is excluded by construction rather than filtered at
//! runtime. Two states that differ only in excluded fields therefore encode
//! identically.
use crate::acts::DialogueAct;
use serde::Serialize;
use serde_json::{json, Value};

/// A dialogue state that can produce its canonical view.
pub trait CanonicalState {
    fn fields(&self) -> StateFields;
}

/// The versioned canonical-field list read from a dialogue state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateFields {
    /// Names of the slots currently holding a value. Values are dropped.
    pub filled_slots: Vec<String>,
    /// Slot most recently requested by the user, empty if none.
    pub requested_slot: String,
    /// Acts of the most recent user turn.
    pub user_acts: Vec<DialogueAct>,
    /// Acts of the most recent system turn, `None` before the first one.
    pub last_sys_acts: Option<Vec<DialogueAct>>,
    pub is_terminal: bool,
    pub system_made_offer: bool,
    pub turn: i64,
    pub num_dontcare: i64,
    /// Fraction of database items matching the current constraints, in [0, 1].
    pub db_matches_ratio: f64,
}

impl StateFields {
    /// Serialize to the canonical string consumed by the state encoder.
    ///
    /// The database-match ratio is rendered as an integer percentage and act
    /// lists as their compact string form, so that semantically equal states
    /// serialize byte-identically.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        #[allow(clippy::cast_possible_truncation)]
        let db_matches_percent = (self.db_matches_ratio * 100.0).round() as i64;
        let value = json!({
            "slots_filled": self.filled_slots,
            "requested_slot": self.requested_slot,
            "user_acts": action_string(&self.user_acts, false),
            "last_sys_acts": self
                .last_sys_acts
                .as_deref()
                .map(|acts| action_string(acts, true)),
            "is_terminal_state": self.is_terminal,
            "system_made_offer": self.system_made_offer,
            "turn": self.turn,
            "num_dontcare": self.num_dontcare,
            "db_matches_ratio": db_matches_percent,
        });
        value.to_string()
    }
}

impl CanonicalState for StateFields {
    fn fields(&self) -> StateFields {
        self.clone()
    }
}

/// Compact string form of an act list: a `sys`/`usr` marker followed by
/// `;`-joined `(intent, slot-names)` pairs.
#[must_use]
pub fn action_string(acts: &[DialogueAct], system: bool) -> String {
    let side = if system { "sys" } else { "usr" };
    let rendered: Vec<String> = acts
        .iter()
        .map(|act| {
            Value::from(vec![
                Value::from(act.intent.as_str()),
                Value::from(act.slot_names()),
            ])
            .to_string()
        })
        .collect();
    format!("{}{}", side, rendered.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acts::{DialogueActItem, Operator};

    fn inform_area() -> DialogueAct {
        DialogueAct::new(
            "inform",
            vec![DialogueActItem::new("area", Operator::Eq, Some("north".into()))],
        )
    }

    #[test]
    fn action_string_marks_side_and_slots() {
        assert_eq!(
            action_string(&[inform_area()], true),
            r#"sys["inform",["area"]]"#
        );
        assert_eq!(action_string(&[], false), "usr");
    }

    #[test]
    fn canonical_string_is_deterministic() {
        let fields = StateFields {
            filled_slots: vec!["area".into()],
            requested_slot: "phone".into(),
            user_acts: vec![inform_area()],
            last_sys_acts: Some(vec![DialogueAct::without_params("welcomemsg")]),
            turn: 3,
            db_matches_ratio: 0.42,
            ..StateFields::default()
        };
        assert_eq!(fields.canonical_string(), fields.canonical_string());
    }

    #[test]
    fn db_ratio_is_an_integer_percentage() {
        let fields = StateFields {
            db_matches_ratio: 0.336,
            ..StateFields::default()
        };
        assert!(fields.canonical_string().contains("\"db_matches_ratio\":34"));
    }

    #[test]
    fn slot_values_do_not_appear() {
        let fields = StateFields {
            user_acts: vec![inform_area()],
            ..StateFields::default()
        };
        assert!(!fields.canonical_string().contains("north"));
    }
}
