use ambisense_api::{RealtimeStore, Readings, RemotePath, SensorKind, StoreError, Timestamp};
use log::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Written(f32),
    /// The sensor had no value this cycle
    Skipped,
    Failed(StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub timestamp: Timestamp,
    /// One entry per field, in publication order
    pub outcomes: [(SensorKind, PublishOutcome); 3],
}

impl PublishReport {
    pub fn outcome(&self, kind: SensorKind) -> Option<&PublishOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PublishOutcome::Written(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PublishOutcome::Failed(_)))
            .count()
    }
}

/// Writes lux, temperature and humidity under one shared timestamp.
///
/// Every field is attempted regardless of how the previous one went.
pub fn publish_readings<S>(store: &mut S, timestamp: &Timestamp, readings: &Readings) -> PublishReport
where
    S: RealtimeStore,
{
    let outcomes = readings
        .fields()
        .map(|(kind, value)| (kind, publish_field(store, kind, timestamp, value)));

    PublishReport {
        timestamp: timestamp.clone(),
        outcomes,
    }
}

fn publish_field<S>(
    store: &mut S,
    kind: SensorKind,
    timestamp: &Timestamp,
    value: Option<f32>,
) -> PublishOutcome
where
    S: RealtimeStore,
{
    let Some(value) = value else {
        warn!("{} reading not available, skipping", kind.label());
        return PublishOutcome::Skipped;
    };

    let path = RemotePath::reading(kind, timestamp);
    match store.set_float(&path, value) {
        Ok(()) => {
            info!("{} value written to Firebase: {}", kind.label(), value);
            PublishOutcome::Written(value)
        }
        Err(err) => {
            error!("Failed to write {} value to {}: {}", kind.label(), path, err);
            PublishOutcome::Failed(err)
        }
    }
}
