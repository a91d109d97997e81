use thiserror::Error;

use crate::traits::data_objects::{PushMessage, PushTarget};

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Real-time notifier is unreachable: {0}")]
    Unreachable(String),
}

/// Real-time delivery of messages to connected clients.
///
/// Pushes are best-effort. Callers log failures and carry on; a failed push never undoes the change it describes.
#[allow(async_fn_in_trait)]
pub trait NotificationSink: Clone {
    async fn push_to_user(&self, user_id: i64, message: &str) -> Result<(), NotifierError>;

    async fn push_to_group(&self, group_key: &str, message: &str) -> Result<(), NotifierError>;

    async fn push(&self, push: &PushMessage) -> Result<(), NotifierError> {
        match &push.target {
            PushTarget::User(id) => self.push_to_user(*id, &push.message).await,
            PushTarget::Group(key) => self.push_to_group(key, &push.message).await,
        }
    }
}
