use ambisense_api::{RealtimeStore, RemotePath, StoreError};
use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorOutcome {
    Applied(bool),
    /// The remote value could not be read; the pin was left alone
    ReadFailed(StoreError),
    /// The remote value was read but driving the pin failed
    PinFailed(bool),
}

/// Mirrors a remote boolean onto a digital output.
pub struct ActuatorSync<P>
where
    P: OutputPin,
{
    pin: P,
    path: RemotePath,
    level: Option<bool>,
}

impl<P> ActuatorSync<P>
where
    P: OutputPin,
{
    pub fn new(pin: P) -> Self {
        Self::with_path(pin, RemotePath::actuator())
    }

    pub fn with_path(pin: P, path: RemotePath) -> Self {
        Self {
            pin,
            path,
            level: None,
        }
    }

    /// Level last driven onto the pin, `None` before the first successful sync.
    pub fn level(&self) -> Option<bool> {
        self.level
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn sync<S>(&mut self, store: &mut S) -> ActuatorOutcome
    where
        S: RealtimeStore,
    {
        let state = match store.get_bool(&self.path) {
            Ok(state) => state,
            Err(err) => {
                warn!("Failed to read LED value from Firebase: {}", err);
                return ActuatorOutcome::ReadFailed(err);
            }
        };

        let driven = if state {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };

        match driven {
            Ok(()) => {
                self.level = Some(state);
                info!("LED value read from Firebase: {}", state);
                ActuatorOutcome::Applied(state)
            }
            Err(e) => {
                error!("Failed to drive LED pin: {:?}", e);
                ActuatorOutcome::PinFailed(state)
            }
        }
    }
}
