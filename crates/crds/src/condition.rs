//! Status conditions shared by CloudRange CRDs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition types reported on CloudRange resources
pub const CONDITION_TYPE_READY: &str = "Ready";
/// Error condition type
pub const CONDITION_TYPE_ERROR: &str = "Error";

/// A single observed condition on a resource status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type ("Ready", "Error")
    #[serde(rename = "type")]
    pub type_: String,

    /// "True", "False" or "Unknown"
    pub status: String,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    pub message: String,

    /// When the condition last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl Condition {
    /// Builds a condition with status "True" and the current timestamp.
    pub fn new_true(type_: &str, reason: &str, message: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: "True".to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: Some(chrono::Utc::now()),
        }
    }
}

/// Replaces the condition of the same type, preserving the transition time
/// when nothing but the timestamp would change.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        let unchanged = existing.status == condition.status
            && existing.reason == condition.reason
            && existing.message == condition.message;
        if !unchanged {
            *existing = condition;
        }
        return;
    }
    conditions.push(condition);
}

/// Removes the condition of the given type, if present.
pub fn remove_condition(conditions: &mut Vec<Condition>, type_: &str) {
    conditions.retain(|c| c.type_ != type_);
}

/// Finds a condition by type.
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_condition_replaces_same_type() {
        let mut conditions = vec![];
        set_condition(
            &mut conditions,
            Condition::new_true(CONDITION_TYPE_ERROR, "CidrOverlap", "overlap"),
        );
        set_condition(
            &mut conditions,
            Condition::new_true(CONDITION_TYPE_ERROR, "VpcNotFound", "gone"),
        );
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].reason, "VpcNotFound");
    }

    #[test]
    fn set_condition_keeps_transition_time_when_unchanged() {
        let mut conditions = vec![Condition {
            type_: CONDITION_TYPE_READY.to_string(),
            status: "True".to_string(),
            reason: "Ready".to_string(),
            message: "provisioned".to_string(),
            last_transition_time: None,
        }];
        set_condition(
            &mut conditions,
            Condition::new_true(CONDITION_TYPE_READY, "Ready", "provisioned"),
        );
        assert_eq!(conditions[0].last_transition_time, None);
    }

    #[test]
    fn remove_condition_by_type() {
        let mut conditions = vec![
            Condition::new_true(CONDITION_TYPE_READY, "Ready", "ok"),
            Condition::new_true(CONDITION_TYPE_ERROR, "CidrOverlap", "bad"),
        ];
        remove_condition(&mut conditions, CONDITION_TYPE_ERROR);
        assert_eq!(conditions.len(), 1);
        assert!(find_condition(&conditions, CONDITION_TYPE_ERROR).is_none());
    }
}
