//! # Rust driver for TLA2024 4-channel 12-bit I2C ADC
//!
//! This is a platform agnostic rust driver for the TI TLA2024 ADC using the [embedded-hal](https://github.com/rust-embedded/embedded-hal) traits.
//!
//! The driver does not keep a copy of the config register: every getter reads the field from the
//! device and every setter does a read-modify-write of the field.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(target_os = "linux")] {
//! use linux_embedded_hal::I2cdev;
//! use tla202x::{Address, Range, TLA2024};
//!
//! let i2c = I2cdev::new("/dev/i2c-1").unwrap();
//! let mut adc = TLA2024::new(i2c, Address::Gnd).unwrap();
//! adc.set_range(Range::Within4_096V).unwrap();
//! let volts = adc.read(2).unwrap();
//! # }
//! ```
#![cfg_attr(not(test), no_std)]

mod fmt;

#[cfg(feature = "async")]
mod async_impl;
mod internal_types;
mod types;

pub use crate::types::*;

#[cfg(feature = "sync")]
use crate::internal_types::*;

#[cfg(feature = "sync")]
use embedded_hal::i2c;

/// Number of status reads a one-shot conversion is given before
/// [`Error::AcquisitionTimeout`] is returned.
pub const DEFAULT_POLL_LIMIT: u32 = 1000;

/// TLA2024 4-channel 12-bit I2C ADC.
pub struct TLA2024<I2C> {
    i2c: I2C,
    address: u8,
    last_one_shot: Option<f32>,
    poll_limit: u32,
}

impl<I2C> TLA2024<I2C> {
    /// The 7-bit I2C address of the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Number of times the status bit is read while waiting for a one-shot conversion.
    pub fn poll_limit(&self) -> u32 {
        self.poll_limit
    }

    /// Sets the number of times the status bit is read while waiting for a one-shot conversion
    /// before giving up with [`Error::AcquisitionTimeout`]. The status bit is always read at
    /// least once.
    pub fn set_poll_limit(&mut self, poll_limit: u32) {
        self.poll_limit = poll_limit.max(1);
    }

    /// The voltage measured by the last one-shot conversion, if there has been one.
    ///
    /// This does not access the device.
    pub fn last_one_shot(&self) -> Option<f32> {
        self.last_one_shot
    }
}

/// Implementation of all commands given a generic I2C interface.
///
/// # Errors
///
/// Any errors encountered within the I2C device will be wrapped in [`Error::I2CError`].
#[cfg(feature = "sync")]
impl<I, E> TLA2024<I>
where
    I: i2c::I2c<Error = E>,
{
    /// Creates a new [`TLA2024`] from an I2C device that implements the
    /// [`embedded_hal::i2c::I2c`] trait, and sets up the default configuration (see
    /// [`Config::new`]).
    ///
    /// The bus can be passed by `&mut` reference to keep ownership of it.
    pub fn new(i2c: I, address: Address) -> Result<Self, Error<E>> {
        let mut adc = TLA2024 {
            i2c,
            address: address.addr(),
            last_one_shot: None,
            poll_limit: DEFAULT_POLL_LIMIT,
        };
        adc.set_config(Config::new())?;
        Ok(adc)
    }

    /// Destroy this instance and return the inner I2C bus.
    pub fn release(self) -> I {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u16, Error<E>> {
        let mut bytes = [0; 2];
        self.i2c.write_read(self.address, &[register], &mut bytes)?;
        Ok(u16::from_be_bytes(bytes))
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), Error<E>> {
        let [msb, lsb] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[register, msb, lsb])
            .map_err(Error::I2CError)
    }

    fn read_field(&mut self, field: ConfigField) -> Result<u8, Error<E>> {
        Ok(field.extract(self.read_register(REGISTER_CONFIG)?))
    }

    fn write_field(&mut self, field: ConfigField, value: u8) -> Result<(), Error<E>> {
        let register = self.read_register(REGISTER_CONFIG)?;
        self.write_register(REGISTER_CONFIG, write_back(register, field, value))
    }

    fn read_enum<T>(&mut self, field: ConfigField) -> Result<T, Error<E>>
    where
        T: num_enum::TryFromPrimitive<Primitive = u8>,
    {
        let register = self.read_register(REGISTER_CONFIG)?;
        decode_field(register, field).map_err(|e| {
            warn!("unknown config field value in {=u16:#x}", register);
            e
        })
    }

    /// Reads the measurement mode.
    pub fn mode(&mut self) -> Result<Mode, Error<E>> {
        self.read_enum(ConfigField::Mode)
    }

    /// Sets the measurement mode.
    ///
    /// Setting [`Mode::Continuous`] only writes the mode bit. Setting [`Mode::OneShot`] also
    /// starts a conversion and blocks until the device reports it done, then stores the result so
    /// that [`TLA2024::voltage`] returns it.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::AcquisitionTimeout`] if the
    /// conversion does not finish within [`TLA2024::poll_limit`] status reads.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<E>> {
        match mode {
            Mode::Continuous => self.write_field(ConfigField::Mode, mode.into()),
            Mode::OneShot => {
                let register = self.read_register(REGISTER_CONFIG)?;
                self.write_register(REGISTER_CONFIG, start_one_shot(register))?;
                self.finish_one_shot()
            }
        }
    }

    // Polls the status bit until the conversion is done, then reads and caches the result.
    fn finish_one_shot(&mut self) -> Result<(), Error<E>> {
        trace!("one-shot conversion started");
        let mut polls = 0;
        loop {
            polls += 1;
            if self.read_field(ConfigField::OperationalStatus)? == 0 {
                break;
            }
            if polls >= self.poll_limit {
                warn!("one-shot conversion still busy after {=u32} polls", polls);
                return Err(Error::AcquisitionTimeout);
            }
        }
        let volts = self.read_volts()?;
        debug!("one-shot conversion done after {=u32} polls: {=f32}V", polls, volts);
        self.last_one_shot = Some(volts);
        Ok(())
    }

    /// Reads the input measured against GND, or `None` if the mux is set to a differential pair.
    pub fn input_channel(&mut self) -> Result<Option<u8>, Error<E>> {
        Ok(self.mux()?.input_channel())
    }

    /// Selects an input (0-3) to be measured against GND.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::InvalidChannel`] if the
    /// channel is greater than 3. Nothing is written to the device in that case.
    pub fn set_input_channel(&mut self, channel: u8) -> Result<(), Error<E>> {
        let mux = Mux::single_ended(channel).ok_or(Error::InvalidChannel(channel))?;
        self.set_mux(mux)
    }

    /// Reads the inputs that the voltage is measured across.
    pub fn mux(&mut self) -> Result<Mux, Error<E>> {
        self.read_enum(ConfigField::Mux)
    }

    /// Sets the inputs that the voltage is measured across.
    pub fn set_mux(&mut self, mux: Mux) -> Result<(), Error<E>> {
        self.write_field(ConfigField::Mux, mux.into())
    }

    /// Reads the sample rate.
    pub fn data_rate(&mut self) -> Result<DataRate, Error<E>> {
        self.read_enum(ConfigField::DataRate)
    }

    /// Sets the sample rate.
    pub fn set_data_rate(&mut self, data_rate: DataRate) -> Result<(), Error<E>> {
        self.write_field(ConfigField::DataRate, data_rate.into())
    }

    /// Reads the measurement range.
    pub fn range(&mut self) -> Result<Range, Error<E>> {
        self.read_enum(ConfigField::Range)
    }

    /// Sets the measurement range.
    pub fn set_range(&mut self, range: Range) -> Result<(), Error<E>> {
        self.write_field(ConfigField::Range, range.into())
    }

    /// Reads all configuration fields in a single register read.
    pub fn config(&mut self) -> Result<Config, Error<E>> {
        let register = self.read_register(REGISTER_CONFIG)?;
        decode_config(register)
    }

    /// Writes all configuration fields in a single read-modify-write.
    ///
    /// If `config` selects [`Mode::OneShot`], the conversion is started by the same write and this
    /// blocks until it is done, as with [`TLA2024::set_mode`].
    pub fn set_config(&mut self, config: Config) -> Result<(), Error<E>> {
        let register = self.read_register(REGISTER_CONFIG)?;
        self.write_register(REGISTER_CONFIG, encode_config(register, &config))?;
        match config.mode {
            Mode::OneShot => self.finish_one_shot(),
            Mode::Continuous => Ok(()),
        }
    }

    /// The voltage across the selected inputs.
    ///
    /// In [`Mode::Continuous`] this reads the latest sample from the device. In [`Mode::OneShot`]
    /// it returns the result of the last one-shot conversion without starting a new one; set the
    /// mode to [`Mode::OneShot`] again or use [`TLA2024::read`] to take a fresh measurement.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this returns [`Error::NoConversion`] if the device
    /// is in one-shot mode but this driver has not taken a conversion yet. Nothing is written to
    /// the device in that case.
    pub fn voltage(&mut self) -> Result<f32, Error<E>> {
        match self.mode()? {
            Mode::Continuous => self.read_volts(),
            Mode::OneShot => match self.last_one_shot {
                Some(volts) => Ok(volts),
                None => Err(Error::NoConversion),
            },
        }
    }

    /// Switches to `channel` (measured against GND) and takes a single measurement in one-shot
    /// mode.
    ///
    /// This leaves the device in one-shot mode.
    pub fn read(&mut self, channel: u8) -> Result<f32, Error<E>> {
        self.set_input_channel(channel)?;
        self.set_mode(Mode::OneShot)?;
        self.voltage()
    }

    /// Reads the latest conversion result as a sign-extended 12-bit value, from -2048 to 2047.
    pub fn raw_sample(&mut self) -> Result<i16, Error<E>> {
        Ok(decode_sample(self.read_register(REGISTER_DATA)?))
    }

    fn read_volts(&mut self) -> Result<f32, Error<E>> {
        let sample = self.raw_sample()?;
        let range = self.range()?;
        Ok(range.to_volts(sample))
    }
}
