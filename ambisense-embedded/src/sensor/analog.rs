use core::fmt;

use log::error;

use super::AnalogInput;

/// ADC channel whose conversions can fail.
pub trait AdcChannel {
    type Error: fmt::Debug;

    fn try_read(&mut self) -> Result<u16, Self::Error>;
}

/// Reuses the last good conversion when the channel fails.
pub struct HoldLastSample<C>
where
    C: AdcChannel,
{
    channel: C,
    last: u16,
    failures: u32,
}

impl<C> HoldLastSample<C>
where
    C: AdcChannel,
{
    /// Takes one conversion up front so a later failure always has a real value to fall back on.
    pub fn new(mut channel: C) -> Result<Self, C::Error> {
        let last = channel.try_read()?;

        Ok(Self {
            channel,
            last,
            failures: 0,
        })
    }

    /// Conversions that failed since the last good one.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C> AnalogInput for HoldLastSample<C>
where
    C: AdcChannel,
{
    fn read_raw(&mut self) -> u16 {
        match self.channel.try_read() {
            Ok(raw) => {
                self.last = raw;
                self.failures = 0;
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                error!(
                    "ADC read failed ({} in a row), repeating last sample {}: {:?}",
                    self.failures, self.last, e
                );
            }
        }

        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdc;

    #[test]
    fn test_failed_conversion_repeats_last_sample() {
        let conversions = [Ok(2048), Err(()), Ok(1500), Err(()), Err(())];
        let mut input = HoldLastSample::new(MockAdc::new(conversions)).unwrap();

        assert_eq!(input.read_raw(), 2048, "failure after the initial read");
        assert_eq!(input.failures(), 1);
        assert_eq!(input.read_raw(), 1500);
        assert_eq!(input.failures(), 0);
        assert_eq!(input.read_raw(), 1500);
        assert_eq!(input.read_raw(), 1500);
        assert_eq!(input.failures(), 2);
    }

    #[test]
    fn test_failed_conversion_is_never_saturated_light() {
        let mut input = HoldLastSample::new(MockAdc::new([Ok(3000), Err(())])).unwrap();

        let raw = input.read_raw();
        assert_ne!(raw, 0);
        assert!(crate::sensor::estimate_lux(raw) < 10000.0);
    }

    #[test]
    fn test_initial_failure_is_reported() {
        assert!(HoldLastSample::new(MockAdc::new([Err(())])).is_err());
    }
}
