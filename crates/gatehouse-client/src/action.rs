//! User action state machine
//!
//! Checkout and the billing portal share one state: `Idle`, then `Loading`
//! while the action runs, then `Navigated` or `Failed`. A failure stays
//! visible until the next action starts.

use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Which action is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Redirect to hosted checkout
    Checkout,
    /// Redirect to the billing portal
    Portal,
}

impl ActionKind {
    /// Get the action name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::Portal => "portal",
        }
    }
}

/// State of the current user action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ActionState {
    /// Nothing running
    #[default]
    Idle,
    /// An action is in flight
    Loading(ActionKind),
    /// The user was sent to this URL
    Navigated(String),
    /// The last action failed with this message
    Failed(String),
}

impl ActionState {
    /// Whether an action is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    /// Move to `Loading`, rejecting the move while another action runs
    pub fn begin(&mut self, kind: ActionKind) -> Result<(), ClientError> {
        if self.is_loading() {
            return Err(ClientError::ActionInProgress);
        }
        *self = Self::Loading(kind);
        Ok(())
    }

    /// Settle a running action with its outcome
    pub fn finish(&mut self, outcome: Result<String, String>) {
        *self = match outcome {
            Ok(url) => Self::Navigated(url),
            Err(message) => Self::Failed(message),
        };
    }
}
