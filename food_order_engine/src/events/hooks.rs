use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::{
    events::{EventError, EventHandler, EventProducer, Handler, OrderTransitionedEvent, RealtimePushEvent},
    traits::{NotificationSink, NotifierError, PushTarget},
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub push_producer: Vec<EventProducer<RealtimePushEvent>>,
    pub order_transitioned_producer: Vec<EventProducer<OrderTransitionedEvent>>,
}

impl EventProducers {
    pub async fn publish_transition(&self, event: OrderTransitionedEvent) {
        for producer in &self.order_transitioned_producer {
            if let Err(e) = producer.publish_event(event.clone()).await {
                warn!("📬️ Could not publish transition event for order #{}. {e}", event.new_order.id);
            }
        }
    }

    async fn publish_push(&self, event: RealtimePushEvent) -> Result<(), EventError> {
        if self.push_producer.is_empty() {
            trace!("📬️ No push subscribers. Dropping message for {}", event.target);
            return Ok(());
        }
        for producer in &self.push_producer {
            producer.publish_event(event.clone()).await?;
        }
        Ok(())
    }
}

/// Pushes are published as [`RealtimePushEvent`]s to whatever transport has subscribed through the `on_push` hook.
impl NotificationSink for EventProducers {
    async fn push_to_user(&self, user_id: i64, message: &str) -> Result<(), NotifierError> {
        let event = RealtimePushEvent::new(PushTarget::User(user_id), message);
        self.publish_push(event).await.map_err(|e| NotifierError::Unreachable(e.to_string()))
    }

    async fn push_to_group(&self, group_key: &str, message: &str) -> Result<(), NotifierError> {
        let event = RealtimePushEvent::new(PushTarget::Group(group_key.to_string()), message);
        self.publish_push(event).await.map_err(|e| NotifierError::Unreachable(e.to_string()))
    }
}

pub struct EventHandlers {
    pub on_push: Option<EventHandler<RealtimePushEvent>>,
    pub on_order_transitioned: Option<EventHandler<OrderTransitionedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_push = hooks.on_push.map(|f| EventHandler::new(buffer_size, f));
        let on_order_transitioned = hooks.on_order_transitioned.map(|f| EventHandler::new(buffer_size, f));
        Self { on_push, on_order_transitioned }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_push {
            result.push_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_transitioned {
            result.order_transitioned_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_push {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_transitioned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_push: Option<Handler<RealtimePushEvent>>,
    pub on_order_transitioned: Option<Handler<OrderTransitionedEvent>>,
}

impl EventHooks {
    pub fn on_push<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RealtimePushEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_push = Some(Arc::new(f));
        self
    }

    pub fn on_order_transitioned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderTransitionedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_transitioned = Some(Arc::new(f));
        self
    }
}
