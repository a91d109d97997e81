//! Stateless pub-sub channel for engine events
//!
//! Components subscribe to an [`EventHandler`] through cheap [`EventProducer`] handles. Each published event is handed
//! to the handler's async hook on its own task, so a slow push transport never holds up a lifecycle pass. Hooks only
//! see the event itself, never engine state.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinSet};

#[derive(Debug, Clone, Error)]
pub enum EventError {
    #[error("The event handler has shut down")]
    HandlerClosed,
}

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    /// `buffer_size` bounds the number of queued events. Producers wait when the queue is full.
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size.max(1));
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Dispatches events until every producer has been dropped, then waits for the in-flight hooks to finish.
    /// Returns the number of events handled.
    pub async fn start_handler(self) -> usize {
        let Self { mut listener, sender, handler } = self;
        // Only producers may keep the channel open
        drop(sender);
        debug!("📬️ Event handler started");
        let mut jobs = JoinSet::new();
        let mut handled = 0;
        while let Some(ev) = listener.recv().await {
            let hook = Arc::clone(&handler);
            jobs.spawn(async move { (hook)(ev).await });
            handled += 1;
            // Reap finished hooks so the set doesn't grow without bound on a long-running server
            while let Some(result) = jobs.try_join_next() {
                log_hook_result(result);
            }
        }
        debug!("📬️ All producers are gone. Waiting for {} hooks to finish", jobs.len());
        while let Some(result) = jobs.join_next().await {
            log_hook_result(result);
        }
        debug!("📬️ Event handler has shut down after {handled} events");
        handled
    }
}

fn log_hook_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!("📬️ An event hook failed: {e}");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub async fn publish_event(&self, event: E) -> Result<(), EventError> {
        self.sender.send(event).await.map_err(|_| {
            error!("📬️ Could not publish event. The handler has shut down.");
            EventError::HandlerClosed
        })
    }
}
