//! Follow confirmation prompt
//!
//! Holds the state of the "Follow researcher?" dialog. A failed request keeps
//! the prompt open with the error message so the user can retry or cancel.
//! A successful one closes it; reloading the following view is left to the
//! caller.

use serde::Serialize;

use super::FollowingReconciler;
use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowPrompt {
    pub target_id: String,
    pub target_name: String,
    pub open: bool,
    pub error: Option<String>,
}

impl FollowPrompt {
    pub fn open(target_id: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            target_name: target_name.into(),
            open: true,
            error: None,
        }
    }

    /// Send the follow request
    ///
    /// On success the prompt closes. On failure it stays open, shows the
    /// message and the error is also returned to the caller.
    pub async fn submit(
        &mut self,
        reconciler: &FollowingReconciler,
        my_id: Option<&str>,
    ) -> Result<(), DashboardError> {
        self.error = None;

        match reconciler.follow(my_id, &self.target_id).await {
            Ok(()) => {
                self.open = false;
                Ok(())
            }
            Err(e) => {
                self.error = Some(failure_message(&e));
                Err(e)
            }
        }
    }

    /// Close without following
    pub fn cancel(&mut self) {
        self.error = None;
        self.open = false;
    }
}

fn failure_message(err: &DashboardError) -> String {
    let message = err.to_string();
    if message.is_empty() {
        "Failed to follow researcher".to_string()
    } else {
        message
    }
}
