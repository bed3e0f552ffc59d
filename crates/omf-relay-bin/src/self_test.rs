//! Built-in checks run by `omf-relay <HOST> <PORT> tests`.
//!
//! Nothing here touches the network or the on-disk buffer.

use anyhow::{bail, ensure, Context};
use chrono::{Duration, Utc};
use durable_message_buffer::BufferStore;
use fleet_simulator::{Fleet, FleetPayloads, FLEET_SIZE};
use ingress_transport::TransportError;
use omf_protocol_types::{
    DeliveryOutcome, Measurement, Message, PayloadBuilder, UnreachableCause,
};
use ordered_publisher::{classify, PublishPlan, RetryScheduler};
use serde_json::Value;
use tracing::{error, info};

type Check = fn() -> anyhow::Result<()>;

const SYNC_CHECKS: &[(&str, Check)] = &[
    ("definition payloads", definition_payloads),
    ("sample payloads", sample_payloads),
    ("delivery classification", delivery_classification),
    ("retry cooldown", retry_cooldown),
];

/// Run every check and log the result of each. True when all passed.
pub async fn run() -> bool {
    let mut failures = 0usize;

    for (name, check) in SYNC_CHECKS {
        failures += usize::from(!report(name, check()));
    }
    failures += usize::from(!report("buffer order and drain", buffer_drain().await));

    if failures > 0 {
        error!(failures, "Self-tests failed");
    }
    failures == 0
}

fn report(name: &str, result: anyhow::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!(check = name, "PASS");
            true
        }
        Err(e) => {
            error!(check = name, error = %format!("{:#}", e), "FAIL");
            false
        }
    }
}

fn non_empty_array(label: &str, body: &str) -> anyhow::Result<usize> {
    let value: Value =
        serde_json::from_str(body).with_context(|| format!("{} is not valid JSON", label))?;
    match value.as_array() {
        Some(items) if !items.is_empty() => Ok(items.len()),
        Some(_) => bail!("{} is an empty array", label),
        None => bail!("{} is not a JSON array", label),
    }
}

fn definition_payloads() -> anyhow::Result<()> {
    let payloads = FleetPayloads::new(Fleet::new());
    let plan = PublishPlan::core_definitions()?;
    for step in plan.steps() {
        let body = payloads
            .build(step.selector)
            .with_context(|| format!("building {}", step.label))?;
        non_empty_array(&step.label, &body)?;
    }
    Ok(())
}

fn sample_payloads() -> anyhow::Result<()> {
    let payloads = FleetPayloads::new(Fleet::new());

    let mut samples: Vec<Message> = vec![
        payloads.single_value(Measurement::EngineRpm, 0)?,
        payloads.single_value(Measurement::EngineCoolantTemp, 1)?,
    ];
    for position in 0..FLEET_SIZE {
        for measurement in [
            Measurement::VehicleStatus,
            Measurement::VehicleFloat,
            Measurement::VehicleInt,
        ] {
            samples.push(payloads.single_value(measurement, position)?);
        }
    }

    payloads.advance();
    samples.push(payloads.batch(Measurement::EngineRpm)?);
    samples.push(payloads.batch(Measurement::EngineCoolantTemp)?);
    samples.push(payloads.vehicle_batch()?);
    samples.push(payloads.transmission_serial_update(1, "T_updated_SN")?);

    for sample in &samples {
        non_empty_array(sample.label(), sample.payload())?;
    }
    Ok(())
}

fn delivery_classification() -> anyhow::Result<()> {
    for status in [200u16, 202, 204] {
        ensure!(
            classify(&Ok(status)) == DeliveryOutcome::Delivered { status_code: status },
            "{} should be delivered",
            status
        );
    }
    for status in [201u16, 400, 401, 404, 409, 500] {
        ensure!(
            classify(&Ok(status)) == DeliveryOutcome::Rejected { status_code: status },
            "{} should be rejected",
            status
        );
    }
    ensure!(
        classify(&Ok(503))
            == DeliveryOutcome::Unreachable {
                cause: UnreachableCause::ServiceUnavailable
            },
        "503 should be unreachable"
    );
    ensure!(
        classify(&Err(TransportError::Connection("refused".to_string()))).is_unreachable(),
        "a transport error should be unreachable"
    );
    Ok(())
}

fn retry_cooldown() -> anyhow::Result<()> {
    let mut scheduler = RetryScheduler::new();
    let now = Utc::now();
    ensure!(scheduler.should_attempt(now), "first attempt must be allowed");

    scheduler.record_attempt(now);
    ensure!(
        !scheduler.should_attempt(now + Duration::seconds(29)),
        "attempt allowed inside the cooldown"
    );
    ensure!(
        scheduler.should_attempt(now + Duration::seconds(30)),
        "attempt refused once the cooldown elapsed"
    );
    Ok(())
}

async fn buffer_drain() -> anyhow::Result<()> {
    let buffer = BufferStore::open_in_memory()?;
    for n in 1..=3 {
        buffer.enqueue(&Message::data(format!("sample {}", n), "[{}]"))?;
    }

    let mut replies = vec![
        DeliveryOutcome::Delivered { status_code: 204 },
        DeliveryOutcome::Unreachable {
            cause: UnreachableCause::ServiceUnavailable,
        },
    ]
    .into_iter();
    let mut seen = Vec::new();
    let report = buffer
        .drain_once(|message| {
            seen.push(message.label().to_string());
            let outcome = replies
                .next()
                .unwrap_or(DeliveryOutcome::Delivered { status_code: 204 });
            async move { outcome }
        })
        .await?;
    ensure!(
        report.delivered == 1 && report.remaining == 2,
        "first drain: {:?}",
        report
    );
    ensure!(seen == ["sample 1", "sample 2"], "drain order: {:?}", seen);

    let report = buffer
        .drain_once(|_| async { DeliveryOutcome::Delivered { status_code: 204 } })
        .await?;
    ensure!(
        report.is_complete() && buffer.is_empty()?,
        "second drain: {:?}",
        report
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_array_checks_shape() {
        assert_eq!(non_empty_array("ok", "[1, 2]").unwrap(), 2);
        assert!(non_empty_array("empty", "[]").is_err());
        assert!(non_empty_array("object", "{}").is_err());
        assert!(non_empty_array("broken", "[").is_err());
    }

    #[tokio::test]
    async fn suite_passes() {
        assert!(run().await);
    }
}
