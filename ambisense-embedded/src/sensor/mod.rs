mod analog;
mod climate_sensor;
mod light_sensor;

pub use analog::{AdcChannel, HoldLastSample};
pub use climate_sensor::ClimateSensor;
pub use light_sensor::{LightSensor, LightSensorCalibration, estimate_lux};

use core::fmt;

use ambisense_api::{RawSample, Readings};
use log::info;

/// 12-bit single-shot ADC channel.
pub trait AnalogInput {
    fn read_raw(&mut self) -> u16;
}

/// Combined temperature and relative humidity sensor.
pub trait Hygrometer {
    type Error: fmt::Debug;

    /// Degrees Celsius
    fn read_temperature(&mut self) -> Result<f32, Self::Error>;

    /// Percent relative humidity
    fn read_humidity(&mut self) -> Result<f32, Self::Error>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read_raw(&mut self) -> u16 {
        (**self).read_raw()
    }
}

impl<T: Hygrometer + ?Sized> Hygrometer for &mut T {
    type Error = T::Error;

    fn read_temperature(&mut self) -> Result<f32, Self::Error> {
        (**self).read_temperature()
    }

    fn read_humidity(&mut self) -> Result<f32, Self::Error> {
        (**self).read_humidity()
    }
}

pub struct SensorReader<A, H>
where
    A: AnalogInput,
    H: Hygrometer,
{
    light: LightSensor<A>,
    climate: ClimateSensor<H>,
}

impl<A, H> SensorReader<A, H>
where
    A: AnalogInput,
    H: Hygrometer,
{
    pub fn new(light_input: A, hygrometer: H) -> Self {
        Self {
            light: LightSensor::new(light_input),
            climate: ClimateSensor::new(hygrometer),
        }
    }

    pub fn with_calibration(
        light_input: A,
        hygrometer: H,
        calibration: LightSensorCalibration,
    ) -> Self {
        Self {
            light: LightSensor::with_calibration(light_input, calibration),
            climate: ClimateSensor::new(hygrometer),
        }
    }

    /// One raw sample: light first, then humidity, then temperature.
    pub fn read(&mut self) -> RawSample {
        let analog_light = self.light.read_raw();
        let relative_humidity = self.climate.read_humidity();
        let temperature_c = self.climate.read_temperature();

        RawSample {
            analog_light,
            temperature_c,
            relative_humidity,
        }
    }

    pub fn readings(&self, sample: &RawSample) -> Readings {
        let lux = self.light.raw_to_lux(sample.analog_light);
        info!("LDR Value: {} (Lux: {})", sample.analog_light, lux);

        Readings::new(lux, sample)
    }
}
