use num_enum::{IntoPrimitive, TryFromPrimitive};

// Error type.

/// Error type for the crate, which can represent either an error from this driver or an inner error
/// that comes from the I2C type.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<InnerError> {
    /// An input channel outside of 0-3 was requested.
    ///
    /// The TLA2024 has four analog inputs, AIN0 through AIN3. Nothing is written to the device when
    /// this is returned.
    InvalidChannel(u8),
    /// A field of the config register held a code that has no meaning for that field.
    ///
    /// For example, range codes 6 and 7 and data rate code 7 are not defined by the datasheet.
    UnknownFieldValue(ConfigField, u8),
    /// A one-shot conversion was triggered but the device did not report completion within the
    /// configured poll limit (see [`TLA2024::set_poll_limit`](crate::TLA2024::set_poll_limit)).
    AcquisitionTimeout,
    /// The device is in one-shot mode but no one-shot conversion has been taken by this driver, so
    /// there is no result to return.
    ///
    /// Set the mode to [`Mode::OneShot`] or use [`TLA2024::read`](crate::TLA2024::read) to take one.
    NoConversion,
    /// Error representing an error that came from the inner I2C driver.
    I2CError(InnerError),
}

impl<InnerError> From<InnerError> for Error<InnerError> {
    fn from(inner: InnerError) -> Self {
        Error::I2CError(inner)
    }
}

// Addressing.

/// I2C address of the device, selected by what the ADDR pin is tied to.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// ADDR tied to GND: `0x48`.
    #[default]
    Gnd,
    /// ADDR tied to VDD: `0x49`.
    Vdd,
    /// ADDR tied to SDA: `0x4A`.
    Sda,
    /// ADDR tied to SCL: `0x4B`.
    Scl,
}

impl Address {
    /// The right-aligned 7-bit address.
    pub const fn addr(self) -> u8 {
        match self {
            Address::Gnd => 0x48,
            Address::Vdd => 0x49,
            Address::Sda => 0x4A,
            Address::Scl => 0x4B,
        }
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address.addr()
    }
}

// Enums for configuration.

/// The bit fields of the config register.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    /// Bit 15. Writing 1 starts a one-shot conversion; it reads 1 until the conversion is done.
    OperationalStatus,
    /// Bits 14:12, see [`Mux`].
    Mux,
    /// Bits 11:9, see [`Range`].
    Range,
    /// Bit 8, see [`Mode`].
    Mode,
    /// Bits 7:5, see [`DataRate`].
    DataRate,
}

/// Acquisition mode.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Measurements are taken continuously and reading the voltage returns the latest one.
    Continuous = 0,
    /// A single measurement is taken on demand, after which the device powers down.
    OneShot = 1,
}

impl Mode {
    /// Returns true if `code` is a valid mode code.
    pub fn is_valid(code: u8) -> bool {
        Self::try_from(code).is_ok()
    }

    /// Human readable name.
    pub const fn label(self) -> &'static str {
        match self {
            Mode::Continuous => "Continuous",
            Mode::OneShot => "One Shot",
        }
    }
}

/// Measurement range, set by the gain of the internal amplifier.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Range {
    /// ±6.144V. Inputs are still limited to VDD + 0.3V.
    Within6_144V = 0,
    /// ±4.096V.
    Within4_096V = 1,
    /// ±2.048V.
    Within2_048V = 2,
    /// ±1.024V.
    Within1_024V = 3,
    /// ±0.512V.
    Within0_512V = 4,
    /// ±0.256V.
    Within0_256V = 5,
}

impl Range {
    /// Returns true if `code` is a valid range code.
    pub fn is_valid(code: u8) -> bool {
        Self::try_from(code).is_ok()
    }

    /// Human readable name.
    pub const fn label(self) -> &'static str {
        match self {
            Range::Within6_144V => "±6.144 V",
            Range::Within4_096V => "±4.096 V",
            Range::Within2_048V => "±2.048 V",
            Range::Within1_024V => "±1.024 V",
            Range::Within0_512V => "±0.512 V",
            Range::Within0_256V => "±0.256 V",
        }
    }

    /// Size of one LSB in millivolts.
    pub fn lsb_millivolts(self) -> f32 {
        match self {
            Range::Within6_144V => 3.0,
            Range::Within4_096V => 2.0,
            Range::Within2_048V => 1.0,
            Range::Within1_024V => 0.5,
            Range::Within0_512V => 0.25,
            Range::Within0_256V => 0.125,
        }
    }

    /// Shift applied to 8192mV to get the full scale of this range.
    ///
    /// The top range has none: 8192 >> 0 would give 8192mV, but the device tops out at ±6.144V.
    pub const fn shift(self) -> Option<u8> {
        match self {
            Range::Within6_144V => None,
            _ => Some(self as u8),
        }
    }

    /// Full scale of this range in millivolts.
    pub const fn full_scale_millivolts(self) -> u16 {
        match self.shift() {
            None => 6144,
            Some(shift) => 8192 >> shift,
        }
    }

    /// Converts a sign-extended 12-bit sample into volts for this range.
    ///
    /// `2047` maps to +full scale and `-2048` maps to -full scale; anything past full scale is
    /// clamped.
    pub fn to_volts(self, sample: i16) -> f32 {
        let full_scale = self.full_scale_millivolts() as f32;
        let millivolts = (sample as f32 / 2047.0) * full_scale;
        (millivolts / 1000.0).clamp(-full_scale / 1000.0, full_scale / 1000.0)
    }
}

/// Rate at which samples are taken. Does not affect the conversion from samples to volts.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    Sps128 = 0,
    Sps250 = 1,
    Sps490 = 2,
    Sps920 = 3,
    Sps1600 = 4,
    Sps2400 = 5,
    Sps3300 = 6,
}

impl DataRate {
    /// Returns true if `code` is a valid data rate code.
    pub fn is_valid(code: u8) -> bool {
        Self::try_from(code).is_ok()
    }

    /// Nominal number of samples per second.
    pub const fn samples_per_second(self) -> u16 {
        match self {
            DataRate::Sps128 => 128,
            DataRate::Sps250 => 250,
            DataRate::Sps490 => 490,
            DataRate::Sps920 => 920,
            DataRate::Sps1600 => 1600,
            DataRate::Sps2400 => 2400,
            DataRate::Sps3300 => 3300,
        }
    }
}

/// The pair of inputs that the voltage is measured across.
///
/// The first four are differential pairs, the last four measure a single input against GND.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mux {
    Ain0Ain1 = 0,
    Ain0Ain3 = 1,
    Ain1Ain3 = 2,
    Ain2Ain3 = 3,
    Ain0Gnd = 4,
    Ain1Gnd = 5,
    Ain2Gnd = 6,
    Ain3Gnd = 7,
}

impl Mux {
    /// Returns true if `code` is a valid mux code.
    pub fn is_valid(code: u8) -> bool {
        Self::try_from(code).is_ok()
    }

    /// Human readable name.
    pub const fn label(self) -> &'static str {
        match self {
            Mux::Ain0Ain1 => "AIN 0 to AIN 1",
            Mux::Ain0Ain3 => "AIN 0 to AIN 3",
            Mux::Ain1Ain3 => "AIN 1 to AIN 3",
            Mux::Ain2Ain3 => "AIN 2 to AIN 3",
            Mux::Ain0Gnd => "AIN 0 to GND",
            Mux::Ain1Gnd => "AIN 1 to GND",
            Mux::Ain2Gnd => "AIN 2 to GND",
            Mux::Ain3Gnd => "AIN 3 to GND",
        }
    }

    /// The selection measuring `channel` against GND, or `None` if there is no such input.
    pub const fn single_ended(channel: u8) -> Option<Mux> {
        match channel {
            0 => Some(Mux::Ain0Gnd),
            1 => Some(Mux::Ain1Gnd),
            2 => Some(Mux::Ain2Gnd),
            3 => Some(Mux::Ain3Gnd),
            _ => None,
        }
    }

    /// The input measured against GND, or `None` for a differential pair.
    pub const fn input_channel(self) -> Option<u8> {
        match self {
            Mux::Ain0Gnd => Some(0),
            Mux::Ain1Gnd => Some(1),
            Mux::Ain2Gnd => Some(2),
            Mux::Ain3Gnd => Some(3),
            _ => None,
        }
    }
}

// Container structs.

/// Representation of the writable fields of the config register.
///
/// The default is the configuration the driver sets up on construction: continuous mode, AIN0
/// against GND, 3300 samples per second and a ±2.048V range.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// The inputs to measure across.
    pub mux: Mux,
    /// The measurement range.
    pub range: Range,
    /// The acquisition mode.
    pub mode: Mode,
    /// The sample rate.
    pub data_rate: DataRate,
}

impl Config {
    /// Creates a Config with the power-up defaults used by the driver.
    pub fn new() -> Config {
        Config {
            mux: Mux::Ain0Gnd,
            range: Range::Within2_048V,
            mode: Mode::Continuous,
            data_rate: DataRate::Sps3300,
        }
    }

    /// Convenience builder method to set the mux.
    pub fn mux(mut self, new_val: Mux) -> Config {
        self.mux = new_val;
        self
    }

    /// Convenience builder method to set the range.
    pub fn range(mut self, new_val: Range) -> Config {
        self.range = new_val;
        self
    }

    /// Convenience builder method to set the mode.
    pub fn mode(mut self, new_val: Mode) -> Config {
        self.mode = new_val;
        self
    }

    /// Convenience builder method to set the data rate.
    pub fn data_rate(mut self, new_val: DataRate) -> Config {
        self.data_rate = new_val;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
