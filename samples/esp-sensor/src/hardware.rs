use std::time::{Duration, Instant};

use ambisense_embedded::{AdcChannel, Hygrometer};
use dht_sensor::dht11;
use esp_idf_svc::hal::adc::attenuation::DB_11;
use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_svc::hal::adc::ADC1;
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, Gpio34, InputOutput, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use crate::error::{AmbisenseError, Result};

/// DHT11 needs this long between two conversions.
const DHT11_MIN_INTERVAL: Duration = Duration::from_secs(2);

/// LDR divider on ADC1, full 0-3.3 V range. Wrap in `HoldLastSample` to feed the sensor reader.
pub struct Ldr {
    channel: AdcChannelDriver<'static, Gpio34, AdcDriver<'static, ADC1>>,
}

impl Ldr {
    pub fn new(adc: AdcDriver<'static, ADC1>, pin: Gpio34) -> Result<Self> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };

        Ok(Self {
            channel: AdcChannelDriver::new(adc, pin, &config)?,
        })
    }
}

impl AdcChannel for Ldr {
    type Error = EspError;

    fn try_read(&mut self) -> core::result::Result<u16, Self::Error> {
        self.channel.read_raw()
    }
}

/// DHT11 on an open-drain line. One conversion serves both quantities.
pub struct Dht11 {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    delay: Ets,
    last: Option<(Instant, f32, f32)>,
}

impl Dht11 {
    pub fn new(pin: AnyIOPin) -> Result<Self> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_high()?;

        Ok(Self {
            pin,
            delay: Ets,
            last: None,
        })
    }

    fn sample(&mut self) -> Result<(f32, f32)> {
        if let Some((at, temperature, humidity)) = self.last {
            if at.elapsed() < DHT11_MIN_INTERVAL {
                return Ok((temperature, humidity));
            }
        }

        self.pin.set_high()?;
        let reading = dht11::blocking::read(&mut self.delay, &mut self.pin)
            .map_err(|e| AmbisenseError::Sensor(format!("{e:?}")))?;

        let values = (
            reading.temperature as f32,
            reading.relative_humidity as f32,
        );
        self.last = Some((Instant::now(), values.0, values.1));

        Ok(values)
    }
}

impl Hygrometer for Dht11 {
    type Error = AmbisenseError;

    fn read_temperature(&mut self) -> Result<f32> {
        self.sample().map(|(temperature, _)| temperature)
    }

    fn read_humidity(&mut self) -> Result<f32> {
        self.sample().map(|(_, humidity)| humidity)
    }
}
