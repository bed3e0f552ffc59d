//! Buffered publishing with periodic recovery.

use crate::{
    CycleReport, OrderedPublisher, PlanAborted, PublishError, PublishPlan, PublishResult,
    RetryScheduler,
};
use chrono::{DateTime, Utc};
use durable_message_buffer::{BufferResult, BufferStore, DrainReport, HaltedOn};
use omf_protocol_types::{DeliveryOutcome, Message};
use std::time::Duration;
use tracing::{error, info, warn};

/// What happened to a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishReceipt {
    /// Accepted by the relay.
    Delivered { status_code: u16 },
    /// Persisted locally for a later drain.
    Buffered { seq: i64 },
}

/// Result of a recovery tick.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStatus {
    /// Nothing is buffered.
    Idle,
    /// Messages are buffered but the last attempt was too recent.
    CoolingDown(Duration),
    /// The definitions could not be resent; the buffer is untouched.
    CycleAborted(PlanAborted),
    /// Definitions were resent and the buffer was drained as far as possible.
    Drained(DrainReport),
    /// Like `Drained`, but the relay refused some buffered messages. They
    /// were moved to `rejected_messages` and will not be sent again.
    Rejected {
        report: DrainReport,
        rejected: Vec<HaltedOn>,
    },
}

/// Publishes samples, falling back to the durable buffer while the relay
/// is unreachable.
///
/// Every recovery attempt resends the whole definition plan before any
/// buffered message, since a relay that restarted may have lost them.
pub struct TelemetryPublisher {
    publisher: OrderedPublisher,
    buffer: BufferStore,
    plan: PublishPlan,
    scheduler: RetryScheduler,
}

impl TelemetryPublisher {
    pub fn new(publisher: OrderedPublisher, buffer: BufferStore) -> PublishResult<Self> {
        Ok(Self {
            publisher,
            buffer,
            plan: PublishPlan::core_definitions()?,
            scheduler: RetryScheduler::new(),
        })
    }

    pub fn buffer(&self) -> &BufferStore {
        &self.buffer
    }

    pub fn scheduler(&self) -> &RetryScheduler {
        &self.scheduler
    }

    pub fn plan(&self) -> &PublishPlan {
        &self.plan
    }

    pub fn pending(&self) -> BufferResult<usize> {
        self.buffer.len()
    }

    /// Run one definition cycle and start the cooldown clock.
    ///
    /// Messages left in the buffer by an earlier run are replayed right
    /// after the cycle completes instead of waiting out the cooldown.
    pub async fn establish(&mut self, now: DateTime<Utc>) -> PublishResult<CycleReport> {
        self.scheduler.record_attempt(now);
        let report = self.publisher.run_cycle(&self.plan).await?;

        let pending = self.buffer.len()?;
        if pending > 0 {
            info!(pending, "Replaying buffered messages");
            self.drain_backlog().await?;
        }
        Ok(report)
    }

    /// Run definition cycles until one completes, waiting out the cooldown
    /// between attempts.
    ///
    /// Never gives up on its own; callers race it against shutdown.
    pub async fn establish_with_retry(&mut self) -> PublishResult<CycleReport> {
        loop {
            match self.establish(Utc::now()).await {
                Ok(report) => return Ok(report),
                Err(PublishError::PlanAborted(aborted)) => {
                    let wait = self.scheduler.remaining(Utc::now());
                    if aborted.is_retryable() {
                        warn!(step = aborted.step, label = %aborted.label, "Relay not ready");
                    } else {
                        error!(
                            step = aborted.step,
                            label = %aborted.label,
                            cause = %aborted.cause,
                            "Relay refused a definition"
                        );
                    }
                    info!(wait_secs = wait.as_secs(), "Waiting before retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Deliver or buffer one message.
    ///
    /// While anything is buffered, new messages go straight to the tail of
    /// the buffer so the relay sees them in order. A message the relay
    /// refuses is dropped and reported as an error.
    pub async fn publish(&self, message: Message) -> PublishResult<PublishReceipt> {
        if !self.buffer.is_empty()? {
            let record = self.buffer.enqueue(&message)?;
            info!(
                label = message.label(),
                seq = record.seq,
                reason = "buffer not empty",
                "Message buffered locally"
            );
            return Ok(PublishReceipt::Buffered { seq: record.seq });
        }

        let outcome = self.publisher.delivery().attempt(&message).await;
        match outcome {
            DeliveryOutcome::Delivered { status_code } => {
                Ok(PublishReceipt::Delivered { status_code })
            }
            DeliveryOutcome::Unreachable { ref cause } => {
                let record = self.buffer.enqueue(&message)?;
                info!(
                    label = message.label(),
                    seq = record.seq,
                    reason = %cause,
                    "Message buffered locally"
                );
                Ok(PublishReceipt::Buffered { seq: record.seq })
            }
            DeliveryOutcome::Rejected { status_code } => Err(PublishError::EndpointRejected {
                label: message.label().to_string(),
                status: status_code,
            }),
        }
    }

    /// Try to recover if anything is buffered and the cooldown has elapsed.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> PublishResult<RecoveryStatus> {
        let pending = self.buffer.len()?;
        if pending == 0 {
            return Ok(RecoveryStatus::Idle);
        }

        if !self.scheduler.should_attempt(now) {
            return Ok(RecoveryStatus::CoolingDown(self.scheduler.remaining(now)));
        }

        self.scheduler.record_attempt(now);
        info!(pending, "Attempting relay recovery");

        if let Err(aborted) = self.publisher.run_cycle(&self.plan).await {
            warn!(step = aborted.step, label = %aborted.label, pending, "Recovery cycle aborted");
            return Ok(RecoveryStatus::CycleAborted(aborted));
        }

        self.drain_backlog().await
    }

    /// Drain the buffer after a completed cycle.
    ///
    /// A record the relay refuses is moved to `rejected_messages` and the
    /// drain carries on behind it. Only an unreachable relay stops it.
    async fn drain_backlog(&self) -> PublishResult<RecoveryStatus> {
        let delivery = self.publisher.delivery();
        let mut delivered = 0;
        let mut rejected = Vec::new();

        loop {
            let mut report = self
                .buffer
                .drain_once(move |message| async move { delivery.attempt(&message).await })
                .await?;
            delivered += report.delivered;

            match report.halted_on.take() {
                Some(halted) if halted.outcome.is_rejected() => {
                    self.buffer.reject(halted.seq, &halted.outcome)?;
                    error!(
                        seq = halted.seq,
                        label = %halted.label,
                        outcome = %halted.outcome,
                        "Buffered message rejected by relay and lost, moved to rejected_messages"
                    );
                    rejected.push(halted);
                }
                halted_on => {
                    report.halted_on = halted_on;
                    report.delivered = delivered;
                    return Ok(if rejected.is_empty() {
                        RecoveryStatus::Drained(report)
                    } else {
                        RecoveryStatus::Rejected { report, rejected }
                    });
                }
            }
        }
    }
}
