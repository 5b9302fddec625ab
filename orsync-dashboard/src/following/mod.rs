//! Following view: reconciliation, mutations and the follow prompt

mod merge;
pub mod prompt;
pub mod reconciler;

pub use merge::reconcile;
pub use prompt::FollowPrompt;
pub use reconciler::{FollowingReconciler, FollowingView, LoadState};
