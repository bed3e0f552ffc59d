//! Relay publisher wiring: transport, buffer, fleet and the sampling loop.

use chrono::{DateTime, Utc};
use durable_message_buffer::{BufferError, BufferStore, DrainReport};
use fleet_simulator::{Fleet, FleetPayloads, FLEET_SIZE};
use ingress_transport::{HttpsTransport, Transport, TransportError};
use omf_protocol_types::{Measurement, Message, PayloadError};
use ordered_publisher::{
    DeliveryAttempt, OrderedPublisher, PublishError, PublishReceipt, PublishResult,
    RecoveryStatus, TelemetryPublisher,
};
use relay_config_and_utils::{CoreError, EndpointConfig, Paths, Settings};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Second transmission's new serial number, sent as an Update at shutdown.
const UPDATED_SERIAL_NUMBER: &str = "T_updated_SN";

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("Cannot start communications: {0}")]
    Transport(#[from] TransportError),

    #[error("Cannot set up data buffering: {0}")]
    Buffer(#[from] BufferError),

    #[error("Cannot set up publishing: {0}")]
    Publish(#[from] PublishError),
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub run_duration: Duration,
    pub sample_interval: Duration,
}

/// A running publisher and the fleet it reports on.
pub struct Relay {
    telemetry: TelemetryPublisher,
    payloads: Arc<FleetPayloads>,
}

impl Relay {
    /// Build the HTTPS transport and open the on-disk buffer.
    pub fn init(
        endpoint: &EndpointConfig,
        settings: &Settings,
        paths: &Paths,
    ) -> Result<Self, StartupError> {
        let token = settings.require_producer_token()?;
        let transport = HttpsTransport::new(endpoint.server_params(token, settings))?;
        info!(
            endpoint = %transport.endpoint(),
            verify_certificates = endpoint.verify_certificates(),
            "Communications initialized"
        );

        paths.ensure_dirs()?;
        let buffer = BufferStore::open(&paths.buffer_file())?;
        info!(
            path = %paths.buffer_file().display(),
            pending = buffer.len()?,
            "Data buffering initialized"
        );

        let relay = Self::new(
            Arc::new(transport),
            buffer,
            FleetPayloads::new(Fleet::new()),
        )?;
        Ok(relay)
    }

    pub fn new(
        transport: Arc<dyn Transport>,
        buffer: BufferStore,
        payloads: FleetPayloads,
    ) -> PublishResult<Self> {
        let payloads = Arc::new(payloads);
        let publisher = OrderedPublisher::new(DeliveryAttempt::new(transport), payloads.clone());
        Ok(Self {
            telemetry: TelemetryPublisher::new(publisher, buffer)?,
            payloads,
        })
    }

    pub fn pending(&self) -> Result<usize, BufferError> {
        self.telemetry.pending()
    }

    /// Startup cycle, initial samples, the sampling loop, then the
    /// transmission update.
    pub async fn run(&mut self, options: RunOptions) -> PublishResult<()> {
        info!(
            steps = self.telemetry.plan().len(),
            "Sending core definitions"
        );
        let report = self.telemetry.establish_with_retry().await?;
        info!(
            steps_delivered = report.steps_delivered,
            "Core definitions delivered"
        );

        self.send_initial_samples(Utc::now()).await?;

        let deadline = Instant::now() + options.run_duration;
        let mut ticker = tokio::time::interval_at(
            Instant::now() + options.sample_interval,
            options.sample_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            minutes = options.run_duration.as_secs() / 60,
            interval_secs = options.sample_interval.as_secs(),
            "Collecting data"
        );
        loop {
            let at = ticker.tick().await;
            if at > deadline {
                break;
            }
            debug!("Time to collect data");
            self.payloads.advance();
            self.send_batches(Utc::now()).await?;
        }
        info!("Finished collecting data");

        self.send_transmission_update(Utc::now()).await
    }

    /// One engine RPM value, one coolant value, then each vehicle's
    /// status, float and int values.
    pub async fn send_initial_samples(&mut self, now: DateTime<Utc>) -> PublishResult<()> {
        let rpm = self.payloads.single_value(Measurement::EngineRpm, 0);
        self.send(rpm, now).await?;
        let coolant = self.payloads.single_value(Measurement::EngineCoolantTemp, 1);
        self.send(coolant, now).await?;

        for position in 0..FLEET_SIZE {
            for measurement in [
                Measurement::VehicleStatus,
                Measurement::VehicleFloat,
                Measurement::VehicleInt,
            ] {
                let sample = self.payloads.single_value(measurement, position);
                self.send(sample, now).await?;
            }
        }
        Ok(())
    }

    /// RPM, coolant and vehicle batches for the current fleet state.
    pub async fn send_batches(&mut self, now: DateTime<Utc>) -> PublishResult<()> {
        let rpm = self.payloads.batch(Measurement::EngineRpm);
        self.send(rpm, now).await?;
        let coolant = self.payloads.batch(Measurement::EngineCoolantTemp);
        self.send(coolant, now).await?;
        let vehicles = self.payloads.vehicle_batch();
        self.send(vehicles, now).await
    }

    pub async fn send_transmission_update(&mut self, now: DateTime<Utc>) -> PublishResult<()> {
        let update = self
            .payloads
            .transmission_serial_update(1, UPDATED_SERIAL_NUMBER);
        self.send(update, now).await
    }

    /// Publish one sample, then give buffered messages a chance to drain.
    ///
    /// Payload and rejection failures cost only this sample. Buffer
    /// failures are returned.
    async fn send(
        &mut self,
        message: Result<Message, PayloadError>,
        now: DateTime<Utc>,
    ) -> PublishResult<()> {
        let published = match message {
            Ok(message) => self.telemetry.publish(message).await,
            Err(e) => Err(PublishError::from(e)),
        };

        match published {
            Ok(PublishReceipt::Delivered { status_code }) => {
                debug!(status_code, "Sample delivered");
            }
            Ok(PublishReceipt::Buffered { seq }) => {
                debug!(seq, "Sample buffered");
            }
            Err(e) if e.is_message_local() => {
                error!(error = %e, "Sample dropped");
            }
            Err(e) => return Err(e),
        }

        self.recover(now).await
    }

    async fn recover(&mut self, now: DateTime<Utc>) -> PublishResult<()> {
        match self.telemetry.tick(now).await? {
            RecoveryStatus::Idle => {}
            RecoveryStatus::CoolingDown(wait) => {
                debug!(wait_secs = wait.as_secs(), "Recovery cooling down");
            }
            RecoveryStatus::CycleAborted(aborted) => {
                debug!(step = aborted.step, cause = %aborted.cause, "Relay still unavailable");
            }
            RecoveryStatus::Drained(report) => log_drain(&report),
            RecoveryStatus::Rejected { report, rejected } => {
                log_drain(&report);
                for halted in &rejected {
                    error!(
                        seq = halted.seq,
                        label = %halted.label,
                        outcome = %halted.outcome,
                        "Buffered sample rejected and lost"
                    );
                }
            }
        }
        Ok(())
    }
}

fn log_drain(report: &DrainReport) {
    info!(
        delivered = report.delivered,
        remaining = report.remaining,
        "Buffer drained"
    );
    if let Some(halted) = &report.halted_on {
        warn!(
            seq = halted.seq,
            label = %halted.label,
            outcome = %halted.outcome,
            "Relay unavailable again, samples stay queued"
        );
    }
}
