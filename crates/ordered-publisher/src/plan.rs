//! Ordered list of definition messages sent before any data.

use crate::PlanError;
use omf_protocol_types::{
    AssetLink, Measurement, MessageAction, MessageCategory, PayloadSelector,
};

/// One message of a publish plan. The payload is built when the step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub label: String,
    pub category: MessageCategory,
    pub action: MessageAction,
    pub selector: PayloadSelector,
}

impl PlanStep {
    pub fn create(
        label: impl Into<String>,
        category: MessageCategory,
        selector: PayloadSelector,
    ) -> Self {
        Self {
            label: label.into(),
            category,
            action: MessageAction::Create,
            selector,
        }
    }
}

/// Steps whose categories never go backwards: types, then containers, then data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    steps: Vec<PlanStep>,
}

impl PublishPlan {
    /// Validate and wrap `steps`.
    pub fn new(steps: Vec<PlanStep>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::Empty);
        }

        for (index, pair) in steps.windows(2).enumerate() {
            let (previous, step) = (&pair[0], &pair[1]);
            if step.category < previous.category {
                return Err(PlanError::OutOfOrder {
                    index: index + 1,
                    label: step.label.clone(),
                    previous: previous.category,
                    found: step.category,
                });
            }
        }

        Ok(Self { steps })
    }

    /// The definitions a relay needs before it accepts any sample.
    ///
    /// Asset links to `_ROOT` go last so the hierarchy only appears once
    /// everything under it exists.
    pub fn core_definitions() -> Result<Self, PlanError> {
        let mut steps = vec![PlanStep::create(
            "Types",
            MessageCategory::Type,
            PayloadSelector::Types,
        )];

        for measurement in Measurement::ALL {
            steps.push(PlanStep::create(
                format!("Container ({})", measurement),
                MessageCategory::Container,
                PayloadSelector::Containers(measurement),
            ));
        }

        steps.extend([
            PlanStep::create(
                "Assets (vehicles)",
                MessageCategory::Data,
                PayloadSelector::VehicleAssets,
            ),
            PlanStep::create(
                "Assets (engines)",
                MessageCategory::Data,
                PayloadSelector::EngineAssets,
            ),
            PlanStep::create(
                "Assets (transmissions)",
                MessageCategory::Data,
                PayloadSelector::TransmissionAssets,
            ),
            PlanStep::create(
                "Asset links (vehicle to engine)",
                MessageCategory::Data,
                PayloadSelector::AssetLinks(AssetLink::VehicleEngine),
            ),
            PlanStep::create(
                "Asset links (vehicle to transmission)",
                MessageCategory::Data,
                PayloadSelector::AssetLinks(AssetLink::VehicleTransmission),
            ),
        ]);

        for measurement in Measurement::ALL {
            steps.push(PlanStep::create(
                format!("Value links ({})", measurement),
                MessageCategory::Data,
                PayloadSelector::ValueLinks(measurement),
            ));
        }

        steps.push(PlanStep::create(
            "Asset links (root to vehicles)",
            MessageCategory::Data,
            PayloadSelector::AssetLinks(AssetLink::RootVehicle),
        ));

        Self::new(steps)
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
