use std::convert::Infallible;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Instant;

use ambisense_embedded::{AnalogInput, Hygrometer, LightSensorCalibration, NetworkLink};
use embedded_hal::digital::{ErrorType, OutputPin};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::settings::Simulation;

pub fn simulation_lux(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * std::f64::consts::PI;

    const MAX_SUNLIGHT_LUX: f64 = 500.0;
    const MAX_MOONLIGHT_LUX: f64 = 5.0;

    const SUNRISE_START: f64 = 0.23;
    const SUNRISE_END: f64 = 0.25;
    const SUNSET_START: f64 = 0.73;
    const SUNSET_END: f64 = 0.75;

    if (SUNRISE_START..=SUNSET_END).contains(&day_fraction) {
        if day_fraction <= SUNRISE_END {
            let sunrise = (day_fraction - SUNRISE_START) / (SUNRISE_END - SUNRISE_START);
            (sunrise * std::f64::consts::FRAC_PI_2).sin() * MAX_SUNLIGHT_LUX
        } else if day_fraction >= SUNSET_START {
            let sunset = (day_fraction - SUNSET_START) / (SUNSET_END - SUNSET_START);
            (sunset * std::f64::consts::FRAC_PI_2).cos() * MAX_SUNLIGHT_LUX
        } else {
            MAX_SUNLIGHT_LUX
        }
    } else {
        // Moonlight peaks at midnight
        (radians + std::f64::consts::PI).cos().max(0.0) * (MAX_MOONLIGHT_LUX - 0.01) + 0.01
    }
}

pub fn simulated_humidity(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * std::f64::consts::PI;

    if (0.3..=0.7).contains(&day_fraction) {
        ((radians.sin().max(0.0) * 25.0) + 65.0).round()
    } else {
        ((radians.cos().max(0.0) * 30.0) + 60.0).round()
    }
}

/// Warmest in the early afternoon, 24 to 34 degrees.
pub fn simulated_temperature(day_fraction: f64) -> f64 {
    let radians = (day_fraction - 0.35) * 2.0 * std::f64::consts::PI;
    29.0 + radians.sin() * 5.0
}

/// ADC code the divider would produce at `lux`, inverting the calibration's power law.
pub fn lux_to_raw(lux: f64, calibration: &LightSensorCalibration) -> u16 {
    let max = calibration.adc_max_value as f64;
    if lux <= 0.0 {
        return 0;
    }

    let resistance = 1000.0 * (lux / calibration.lux_scale as f64).powf(1.0 / calibration.gamma as f64);
    let known = calibration.known_resistor as f64;
    let voltage = calibration.reference_voltage as f64 * known / (resistance + known);
    let raw = voltage * max / calibration.reference_voltage as f64;

    raw.round().clamp(0.0, max) as u16
}

/// Maps wall time onto a compressed simulated day.
#[derive(Debug, Clone, Copy)]
pub struct DayClock {
    started: Instant,
    day_length_secs: f64,
}

impl DayClock {
    pub fn new(day_length_secs: u64) -> Self {
        Self {
            started: Instant::now(),
            day_length_secs: day_length_secs.max(1) as f64,
        }
    }

    pub fn day_fraction(&self) -> f64 {
        (self.started.elapsed().as_secs_f64() / self.day_length_secs).fract()
    }
}

pub struct SimulatedLdr {
    clock: DayClock,
    calibration: LightSensorCalibration,
    noise: Option<Normal<f64>>,
}

impl SimulatedLdr {
    pub fn new(clock: DayClock, calibration: LightSensorCalibration, relative_noise: f64) -> Self {
        Self {
            clock,
            calibration,
            noise: Normal::new(1.0, relative_noise).ok().filter(|_| relative_noise > 0.0),
        }
    }
}

impl AnalogInput for SimulatedLdr {
    fn read_raw(&mut self) -> u16 {
        let mut lux = simulation_lux(self.clock.day_fraction());
        if let Some(noise) = &self.noise {
            lux *= noise.sample(&mut rand::rng()).max(0.0);
        }

        lux_to_raw(lux, &self.calibration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedFault;

impl fmt::Display for SimulatedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated DHT checksum error")
    }
}

pub struct SimulatedDht {
    clock: DayClock,
    temperature_noise: Option<Normal<f64>>,
    failure_rate: f64,
}

impl SimulatedDht {
    pub fn new(clock: DayClock, simulation: &Simulation) -> Self {
        Self {
            clock,
            temperature_noise: Normal::new(0.0, simulation.temperature_noise)
                .ok()
                .filter(|_| simulation.temperature_noise > 0.0),
            failure_rate: simulation.dht_failure_rate.clamp(0.0, 1.0),
        }
    }

    fn fault(&self) -> Result<(), SimulatedFault> {
        if rand::rng().random_bool(self.failure_rate) {
            Err(SimulatedFault)
        } else {
            Ok(())
        }
    }
}

impl Hygrometer for SimulatedDht {
    type Error = SimulatedFault;

    fn read_temperature(&mut self) -> Result<f32, Self::Error> {
        self.fault()?;

        let mut temperature = simulated_temperature(self.clock.day_fraction());
        if let Some(noise) = &self.temperature_noise {
            temperature += noise.sample(&mut rand::rng());
        }

        // DHT11 resolution is one degree
        Ok(temperature.round() as f32)
    }

    fn read_humidity(&mut self) -> Result<f32, Self::Error> {
        self.fault()?;

        Ok(simulated_humidity(self.clock.day_fraction()) as f32)
    }
}

/// LED that reports every level change to the log.
#[derive(Debug, Default)]
pub struct LoggingLed {
    pub pin: u8,
    pub high: bool,
}

impl LoggingLed {
    pub fn new(pin: u8) -> Self {
        Self { pin, high: false }
    }

    fn drive(&mut self, high: bool) {
        if self.high != high {
            tracing::info!("LED on GPIO{} -> {}", self.pin, if high { "ON" } else { "OFF" });
        }
        self.high = high;
    }
}

impl ErrorType for LoggingLed {
    type Error = Infallible;
}

impl OutputPin for LoggingLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// Wi-Fi link that associates after a fixed number of status polls.
#[derive(Debug, Default)]
pub struct SimulatedLink {
    polls_until_connected: u32,
    polls: u32,
    started: bool,
}

impl SimulatedLink {
    pub fn new(polls_until_connected: u32) -> Self {
        Self {
            polls_until_connected,
            ..Self::default()
        }
    }

    fn connected(&self) -> bool {
        self.started && self.polls >= self.polls_until_connected
    }
}

impl NetworkLink for SimulatedLink {
    type Error = Infallible;

    fn begin(&mut self, ssid: &str, _password: &str) -> Result<(), Self::Error> {
        tracing::debug!("Simulated join of {}", ssid);
        self.started = true;
        self.polls = 0;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        if !self.connected() && self.started {
            self.polls += 1;
            return false;
        }
        self.connected()
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.connected().then_some(Ipv4Addr::LOCALHOST)
    }
}
