use serde::{Deserialize, Serialize};

use super::AnalogInput;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSensorCalibration {
    /// ADC full-scale reference voltage (volts)
    pub reference_voltage: f32,
    /// Highest ADC code, 4095 for the 12-bit ADC
    pub adc_max_value: u16,
    /// Fixed divider resistor (ohms)
    pub known_resistor: f32,
    /// Below this divider voltage the LDR is treated as saturated (volts)
    pub dark_voltage: f32,
    /// Lux reported for a saturated reading
    pub saturated_lux: f32,
    /// Lux at 1 kOhm
    pub lux_scale: f32,
    /// Power law exponent
    pub gamma: f32,
    /// Upper bound of any estimate, reached near full scale
    pub max_lux: f32,
}

impl Default for LightSensorCalibration {
    fn default() -> Self {
        Self {
            reference_voltage: 3.3,
            adc_max_value: 4095,
            known_resistor: 10000.0, // 10K ohm divider
            dark_voltage: 0.01,
            saturated_lux: 10000.0,
            lux_scale: 500.0,
            gamma: -1.4,
            max_lux: 100000.0,
        }
    }
}

impl LightSensorCalibration {
    pub fn raw_to_lux(&self, raw_value: u16) -> f32 {
        let voltage =
            raw_value as f32 * (self.reference_voltage / self.adc_max_value as f32);

        if voltage < self.dark_voltage {
            return self.saturated_lux;
        }

        // Voltage divider: R_ldr = (Vref - V) * R_known / V
        let ldr_resistance =
            (self.reference_voltage - voltage) * self.known_resistor / voltage;

        // Full scale, the LDR reads as a short and the power law diverges
        if ldr_resistance <= 0.0 {
            return self.max_lux;
        }

        let lux = self.lux_scale * libm::powf(ldr_resistance / 1000.0, self.gamma);

        lux.max(0.0).min(self.max_lux)
    }
}

/// Lux estimate for a raw 12-bit sample with the stock calibration.
pub fn estimate_lux(raw_value: u16) -> f32 {
    LightSensorCalibration::default().raw_to_lux(raw_value)
}

pub struct LightSensor<A>
where
    A: AnalogInput,
{
    input: A,
    calibration: LightSensorCalibration,
}

impl<A> LightSensor<A>
where
    A: AnalogInput,
{
    pub fn new(input: A) -> Self {
        Self::with_calibration(input, LightSensorCalibration::default())
    }

    pub fn with_calibration(input: A, calibration: LightSensorCalibration) -> Self {
        Self { input, calibration }
    }

    pub fn read_raw(&mut self) -> u16 {
        self.input.read_raw()
    }

    pub fn raw_to_lux(&self, raw_value: u16) -> f32 {
        self.calibration.raw_to_lux(raw_value)
    }

    pub fn set_calibration(&mut self, calibration: LightSensorCalibration) {
        self.calibration = calibration;
    }

    pub fn get_calibration(&self) -> LightSensorCalibration {
        self.calibration
    }
}
