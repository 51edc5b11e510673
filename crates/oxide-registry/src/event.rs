//! Event hooks around controller operations.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

/// Data passed to and returned by an event.
pub type Payload = Map<String, Value>;

pub const ON_BEFORE_READ: &str = "onBeforeRead";
pub const ON_AFTER_READ: &str = "onAfterRead";
pub const ON_BEFORE_CREATE: &str = "onBeforeCreate";
pub const ON_AFTER_CREATE: &str = "onAfterCreate";
pub const ON_BEFORE_UPDATE: &str = "onBeforeUpdate";
pub const ON_AFTER_UPDATE: &str = "onAfterUpdate";
pub const ON_BEFORE_DELETE: &str = "onBeforeDelete";
pub const ON_AFTER_DELETE: &str = "onAfterDelete";

/// Trait for event schedulers.
///
/// A scheduler receives the payload of an event and returns it, possibly
/// modified. Returning an error aborts the surrounding operation.
pub trait EventScheduler: Send + Sync {
    fn schedule(&self, event: &str, payload: Payload) -> Result<Payload>;
}

/// A scheduler that returns every payload unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl EventScheduler for NoopScheduler {
    fn schedule(&self, event: &str, payload: Payload) -> Result<Payload> {
        debug!(event, "No handlers scheduled");
        Ok(payload)
    }
}
