//! In-process event bus with typed, prioritized handlers.
//!
//! Handlers subscribe to one concrete event type. On dispatch they run in
//! descending priority; equal priorities keep subscription order. An event
//! that reports stopped propagation is not handed to any further handler.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::events::{
    CategoryIndexerEvent, EntityWrittenContainerEvent, LandingPageIndexerEvent,
    ProductIndexerEvent, SystemConfigChangedEvent,
};
use crate::util::lock::{rw_read, rw_write};

use super::error::AppError;

const SOURCE: &str = "application::events";

pub trait Event: Send + Sync + 'static {
    fn is_propagation_stopped(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    async fn handle(&self, event: &mut E) -> Result<(), AppError>;
}

struct Registration {
    priority: i32,
    sequence: u64,
    /// `Arc<dyn EventHandler<E>>` for the event type it is filed under.
    handler: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<TypeId, Vec<Registration>>>,
    sequence: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E: Event>(&self, priority: i32, handler: Arc<dyn EventHandler<E>>) {
        let registration = Registration {
            priority,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            handler: Arc::new(handler),
        };

        let mut handlers = rw_write(&self.handlers, SOURCE, "subscribe");
        let entries = handlers.entry(TypeId::of::<E>()).or_default();
        entries.push(registration);
        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
    }

    /// Subscribe a synchronous transform, used for hook events.
    pub fn listen<E, F>(&self, priority: i32, listener: F)
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(
            priority,
            Arc::new(FnHandler {
                listener,
                _event: PhantomData,
            }),
        );
    }

    pub fn handler_count<E: Event>(&self) -> usize {
        rw_read(&self.handlers, SOURCE, "handler_count")
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Run every handler of `E` in priority order.
    ///
    /// The first handler error aborts the dispatch and is returned.
    pub async fn dispatch<E: Event>(&self, event: &mut E) -> Result<(), AppError> {
        let handlers = self.handlers_for::<E>();
        debug!(
            event = type_name::<E>(),
            handlers = handlers.len(),
            "Dispatching event"
        );

        for handler in handlers {
            if event.is_propagation_stopped() {
                debug!(event = type_name::<E>(), "Event propagation stopped");
                break;
            }
            handler.handle(event).await?;
        }
        Ok(())
    }

    fn handlers_for<E: Event>(&self) -> Vec<Arc<dyn EventHandler<E>>> {
        rw_read(&self.handlers, SOURCE, "dispatch")
            .get(&TypeId::of::<E>())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        entry
                            .handler
                            .downcast_ref::<Arc<dyn EventHandler<E>>>()
                            .cloned()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

struct FnHandler<E, F> {
    listener: F,
    _event: PhantomData<fn(&mut E)>,
}

#[async_trait]
impl<E, F> EventHandler<E> for FnHandler<E, F>
where
    E: Event,
    F: Fn(&mut E) + Send + Sync + 'static,
{
    async fn handle(&self, event: &mut E) -> Result<(), AppError> {
        (self.listener)(event);
        Ok(())
    }
}

impl Event for SystemConfigChangedEvent {}
impl Event for EntityWrittenContainerEvent {}
impl Event for ProductIndexerEvent {}
impl Event for CategoryIndexerEvent {}
impl Event for LandingPageIndexerEvent {}
