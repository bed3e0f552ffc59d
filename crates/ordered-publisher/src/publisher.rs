//! Runs a publish plan step by step, stopping at the first failure.

use crate::{DeliveryAttempt, PublishPlan};
use omf_protocol_types::{DeliveryOutcome, Message, PayloadBuilder};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a cycle stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortCause {
    /// The step's message was not delivered.
    Delivery(DeliveryOutcome),
    /// The step's payload could not be built.
    Payload(String),
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery(outcome) => write!(f, "{}", outcome),
            Self::Payload(detail) => write!(f, "payload build failed: {}", detail),
        }
    }
}

/// A cycle stopped at `step` (zero-based); no later step was attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cycle aborted at step {step} ({label}): {cause}")]
pub struct PlanAborted {
    pub step: usize,
    pub label: String,
    pub cause: AbortCause,
}

impl PlanAborted {
    /// True when the relay could not be reached, as opposed to refusing data.
    pub fn is_retryable(&self) -> bool {
        matches!(&self.cause, AbortCause::Delivery(outcome) if outcome.is_unreachable())
    }
}

/// Outcome of a completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub steps_delivered: usize,
}

/// Sends plan steps in order through a [`DeliveryAttempt`].
pub struct OrderedPublisher {
    delivery: DeliveryAttempt,
    payloads: Arc<dyn PayloadBuilder>,
}

impl OrderedPublisher {
    pub fn new(delivery: DeliveryAttempt, payloads: Arc<dyn PayloadBuilder>) -> Self {
        Self { delivery, payloads }
    }

    pub fn delivery(&self) -> &DeliveryAttempt {
        &self.delivery
    }

    pub fn payloads(&self) -> &Arc<dyn PayloadBuilder> {
        &self.payloads
    }

    /// Run every step of `plan`.
    ///
    /// Each step's payload is built fresh and wrapped in a new message. The
    /// first step that is not delivered ends the cycle; a relay that already
    /// holds earlier definitions accepts them again on the next cycle.
    pub async fn run_cycle(&self, plan: &PublishPlan) -> Result<CycleReport, PlanAborted> {
        debug!(steps = plan.len(), "Starting publish cycle");

        for (step, plan_step) in plan.steps().iter().enumerate() {
            let payload = match self.payloads.build(plan_step.selector) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(step, label = %plan_step.label, error = %e, "Payload build failed");
                    return Err(PlanAborted {
                        step,
                        label: plan_step.label.clone(),
                        cause: AbortCause::Payload(e.to_string()),
                    });
                }
            };

            let message = Message::new(
                plan_step.category,
                plan_step.action,
                plan_step.label.clone(),
                payload,
            );

            let outcome = self.delivery.attempt(&message).await;
            if !outcome.is_delivered() {
                warn!(step, label = %plan_step.label, outcome = %outcome, "Publish cycle aborted");
                return Err(PlanAborted {
                    step,
                    label: plan_step.label.clone(),
                    cause: AbortCause::Delivery(outcome),
                });
            }
        }

        info!(steps = plan.len(), "Publish cycle complete");
        Ok(CycleReport {
            steps_delivered: plan.len(),
        })
    }
}
