use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
    Mutex,
};

use crate::traits::{NotificationSink, NotifierError, PushMessage, PushTarget};

/// A push sink that remembers every message it was asked to deliver. It can be switched to fail every push.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pushes: Arc<Mutex<Vec<PushMessage>>>,
    attempts: Arc<Mutex<usize>>,
    unreachable: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Successfully delivered pushes, in order.
    pub fn pushes(&self) -> Vec<PushMessage> {
        self.pushes.lock().expect("sink lock poisoned").clone()
    }

    pub fn pushes_to(&self, target: &PushTarget) -> Vec<String> {
        self.pushes().into_iter().filter(|p| &p.target == target).map(|p| p.message).collect()
    }

    /// Every push attempt, including failed ones.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("sink lock poisoned")
    }

    fn record(&self, push: PushMessage) -> Result<(), NotifierError> {
        *self.attempts.lock().expect("sink lock poisoned") += 1;
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(NotifierError::Unreachable("recording sink is switched off".into()));
        }
        self.pushes.lock().expect("sink lock poisoned").push(push);
        Ok(())
    }
}

impl NotificationSink for RecordingSink {
    async fn push_to_user(&self, user_id: i64, message: &str) -> Result<(), NotifierError> {
        self.record(PushMessage::to_user(user_id, message))
    }

    async fn push_to_group(&self, group_key: &str, message: &str) -> Result<(), NotifierError> {
        self.record(PushMessage::to_group(PushTarget::Group(group_key.to_string()), message))
    }
}
