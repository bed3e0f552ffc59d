//! Ordered, buffered delivery of OMF messages to a relay.
//!
//! This crate provides:
//! - `DeliveryAttempt`: one send, classified as delivered, rejected or unreachable
//! - `PublishPlan` / `OrderedPublisher`: definition messages sent strictly in
//!   Type → Container → Data order, stopping at the first failure
//! - `RetryScheduler`: 30 second cooldown between recovery attempts
//! - `TelemetryPublisher`: buffers samples while the relay is unreachable and
//!   replays them after the definitions were resent, setting aside any the
//!   relay refuses
//!
//! ```ignore
//! let delivery = DeliveryAttempt::new(Arc::new(HttpsTransport::new(params)?));
//! let publisher = OrderedPublisher::new(delivery, Arc::new(FleetPayloads::new(fleet)));
//! let mut telemetry = TelemetryPublisher::new(publisher, BufferStore::open(&path)?)?;
//!
//! telemetry.establish_with_retry().await?;
//! telemetry.publish(sample).await?;
//! telemetry.tick(Utc::now()).await?;
//! ```

mod delivery;
mod error;
mod plan;
mod publisher;
mod scheduler;
mod telemetry;

#[cfg(test)]
mod testing;

pub use delivery::{classify, DeliveryAttempt};
pub use error::{PlanError, PublishError, PublishResult};
pub use plan::{PlanStep, PublishPlan};
pub use publisher::{AbortCause, CycleReport, OrderedPublisher, PlanAborted};
pub use scheduler::{RetryScheduler, RETRY_COOLDOWN};
pub use telemetry::{PublishReceipt, RecoveryStatus, TelemetryPublisher};
