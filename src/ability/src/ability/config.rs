//! Ability configuration

use serde::{Deserialize, Serialize};

/// Action name matching every action
pub const GLOBAL_ACTION: &str = "manage";

/// Subject name matching every subject
pub const GLOBAL_SUBJECT: &str = "all";

/// Ability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Granted action that covers any requested action
    pub global_action: String,

    /// Granted subject that covers any requested subject
    pub global_subject: String,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            global_action: GLOBAL_ACTION.to_string(),
            global_subject: GLOBAL_SUBJECT.to_string(),
        }
    }
}
