use crate::internal_types::*;
use crate::types::*;
use crate::{DEFAULT_POLL_LIMIT, TLA2024};

use embedded_hal_async::i2c;

/// Implementation of all commands given a generic async I2C interface.
///
/// Each method behaves like its blocking counterpart without the `_async` suffix.
///
/// # Errors
///
/// Any errors encountered within the I2C device will be wrapped in [`Error::I2CError`].
impl<I, E> TLA2024<I>
where
    I: i2c::I2c<Error = E>,
{
    /// Creates a new [`TLA2024`] from an I2C device that implements the
    /// [`embedded_hal_async::i2c::I2c`] trait, and sets up the default configuration (see
    /// [`Config::new`]).
    pub async fn new_async(i2c: I, address: Address) -> Result<Self, Error<E>> {
        let mut adc = TLA2024 {
            i2c,
            address: address.addr(),
            last_one_shot: None,
            poll_limit: DEFAULT_POLL_LIMIT,
        };
        adc.set_config_async(Config::new()).await?;
        Ok(adc)
    }

    /// Destroy this instance and return the inner I2C bus.
    pub async fn release_async(self) -> I {
        self.i2c
    }

    async fn read_register_async(&mut self, register: u8) -> Result<u16, Error<E>> {
        let mut bytes = [0; 2];
        self.i2c
            .write_read(self.address, &[register], &mut bytes)
            .await?;
        Ok(u16::from_be_bytes(bytes))
    }

    async fn write_register_async(&mut self, register: u8, value: u16) -> Result<(), Error<E>> {
        let [msb, lsb] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[register, msb, lsb])
            .await
            .map_err(Error::I2CError)
    }

    async fn write_field_async(&mut self, field: ConfigField, value: u8) -> Result<(), Error<E>> {
        let register = self.read_register_async(REGISTER_CONFIG).await?;
        self.write_register_async(REGISTER_CONFIG, write_back(register, field, value))
            .await
    }

    async fn read_enum_async<T>(&mut self, field: ConfigField) -> Result<T, Error<E>>
    where
        T: num_enum::TryFromPrimitive<Primitive = u8>,
    {
        let register = self.read_register_async(REGISTER_CONFIG).await?;
        decode_field(register, field).map_err(|e| {
            warn!("unknown config field value in {=u16:#x}", register);
            e
        })
    }

    /// Reads the measurement mode.
    pub async fn mode_async(&mut self) -> Result<Mode, Error<E>> {
        self.read_enum_async(ConfigField::Mode).await
    }

    /// Sets the measurement mode. [`Mode::OneShot`] takes a measurement and waits for it.
    pub async fn set_mode_async(&mut self, mode: Mode) -> Result<(), Error<E>> {
        match mode {
            Mode::Continuous => self.write_field_async(ConfigField::Mode, mode.into()).await,
            Mode::OneShot => {
                let register = self.read_register_async(REGISTER_CONFIG).await?;
                self.write_register_async(REGISTER_CONFIG, start_one_shot(register))
                    .await?;
                self.finish_one_shot_async().await
            }
        }
    }

    async fn finish_one_shot_async(&mut self) -> Result<(), Error<E>> {
        trace!("one-shot conversion started");
        let mut polls = 0;
        loop {
            polls += 1;
            let register = self.read_register_async(REGISTER_CONFIG).await?;
            if ConfigField::OperationalStatus.extract(register) == 0 {
                break;
            }
            if polls >= self.poll_limit {
                warn!("one-shot conversion still busy after {=u32} polls", polls);
                return Err(Error::AcquisitionTimeout);
            }
        }
        let volts = self.read_volts_async().await?;
        debug!("one-shot conversion done after {=u32} polls: {=f32}V", polls, volts);
        self.last_one_shot = Some(volts);
        Ok(())
    }

    /// Reads the input measured against GND, or `None` for a differential pair.
    pub async fn input_channel_async(&mut self) -> Result<Option<u8>, Error<E>> {
        Ok(self.mux_async().await?.input_channel())
    }

    /// Selects an input (0-3) to be measured against GND.
    pub async fn set_input_channel_async(&mut self, channel: u8) -> Result<(), Error<E>> {
        let mux = Mux::single_ended(channel).ok_or(Error::InvalidChannel(channel))?;
        self.set_mux_async(mux).await
    }

    /// Reads the inputs that the voltage is measured across.
    pub async fn mux_async(&mut self) -> Result<Mux, Error<E>> {
        self.read_enum_async(ConfigField::Mux).await
    }

    /// Sets the inputs that the voltage is measured across.
    pub async fn set_mux_async(&mut self, mux: Mux) -> Result<(), Error<E>> {
        self.write_field_async(ConfigField::Mux, mux.into()).await
    }

    /// Reads the sample rate.
    pub async fn data_rate_async(&mut self) -> Result<DataRate, Error<E>> {
        self.read_enum_async(ConfigField::DataRate).await
    }

    /// Sets the sample rate.
    pub async fn set_data_rate_async(&mut self, data_rate: DataRate) -> Result<(), Error<E>> {
        self.write_field_async(ConfigField::DataRate, data_rate.into())
            .await
    }

    /// Reads the measurement range.
    pub async fn range_async(&mut self) -> Result<Range, Error<E>> {
        self.read_enum_async(ConfigField::Range).await
    }

    /// Sets the measurement range.
    pub async fn set_range_async(&mut self, range: Range) -> Result<(), Error<E>> {
        self.write_field_async(ConfigField::Range, range.into()).await
    }

    /// Reads all configuration fields in a single register read.
    pub async fn config_async(&mut self) -> Result<Config, Error<E>> {
        let register = self.read_register_async(REGISTER_CONFIG).await?;
        decode_config(register)
    }

    /// Writes all configuration fields in a single read-modify-write, taking a measurement if
    /// `config` selects [`Mode::OneShot`].
    pub async fn set_config_async(&mut self, config: Config) -> Result<(), Error<E>> {
        let register = self.read_register_async(REGISTER_CONFIG).await?;
        self.write_register_async(REGISTER_CONFIG, encode_config(register, &config))
            .await?;
        match config.mode {
            Mode::OneShot => self.finish_one_shot_async().await,
            Mode::Continuous => Ok(()),
        }
    }

    /// The voltage across the selected inputs. See [`TLA2024::voltage`].
    pub async fn voltage_async(&mut self) -> Result<f32, Error<E>> {
        match self.mode_async().await? {
            Mode::Continuous => self.read_volts_async().await,
            Mode::OneShot => match self.last_one_shot {
                Some(volts) => Ok(volts),
                None => Err(Error::NoConversion),
            },
        }
    }

    /// Switches to `channel` and takes a single measurement in one-shot mode.
    pub async fn read_async(&mut self, channel: u8) -> Result<f32, Error<E>> {
        self.set_input_channel_async(channel).await?;
        self.set_mode_async(Mode::OneShot).await?;
        self.voltage_async().await
    }

    /// Reads the latest conversion result as a sign-extended 12-bit value.
    pub async fn raw_sample_async(&mut self) -> Result<i16, Error<E>> {
        Ok(decode_sample(self.read_register_async(REGISTER_DATA).await?))
    }

    async fn read_volts_async(&mut self) -> Result<f32, Error<E>> {
        let sample = self.raw_sample_async().await?;
        let range = self.range_async().await?;
        Ok(range.to_volts(sample))
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    use crate::*;

    const ADDRESS: u8 = 0x48;

    fn init_transactions() -> Vec<Transaction> {
        vec![
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x85, 0x83]),
            Transaction::write(ADDRESS, vec![0x01, 0x44, 0xc3]),
        ]
    }

    #[tokio::test]
    async fn new_async_writes_default_config() {
        let i2c = Mock::new(&init_transactions());
        let adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        adc.release_async().await.done();
    }

    #[tokio::test]
    async fn read_async() {
        let mut transactions = init_transactions();
        transactions.extend([
            // Channel 1: mux 0b101.
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x44, 0xc3]),
            Transaction::write(ADDRESS, vec![0x01, 0x54, 0xc3]),
            // Start a one-shot conversion.
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x54, 0xc3]),
            Transaction::write(ADDRESS, vec![0x01, 0xd5, 0xc3]),
            // Busy once, then done.
            Transaction::write_read(ADDRESS, vec![0x01], vec![0xd5, 0xc3]),
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x55, 0xc3]),
            Transaction::write_read(ADDRESS, vec![0x00], vec![0x80, 0x00]),
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x55, 0xc3]),
            // Mode is read back to return the cached value.
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x55, 0xc3]),
        ]);
        let i2c = Mock::new(&transactions);
        let mut adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        assert_eq!(adc.read_async(1).await, Ok(-2.048));
        assert_eq!(adc.last_one_shot(), Some(-2.048));
        adc.release_async().await.done();
    }

    #[tokio::test]
    async fn set_input_channel_async_out_of_range() {
        let i2c = Mock::new(&init_transactions());
        let mut adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        assert_eq!(
            adc.set_input_channel_async(4).await,
            Err(Error::InvalidChannel(4))
        );
        adc.release_async().await.done();
    }

    #[tokio::test]
    async fn one_shot_async_timeout() {
        let mut transactions = init_transactions();
        transactions.extend([
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x44, 0xc3]),
            Transaction::write(ADDRESS, vec![0x01, 0xc5, 0xc3]),
            Transaction::write_read(ADDRESS, vec![0x01], vec![0xc5, 0xc3]),
            Transaction::write_read(ADDRESS, vec![0x01], vec![0xc5, 0xc3]),
        ]);
        let i2c = Mock::new(&transactions);
        let mut adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        adc.set_poll_limit(2);
        assert_eq!(
            adc.set_mode_async(Mode::OneShot).await,
            Err(Error::AcquisitionTimeout)
        );
        assert_eq!(adc.last_one_shot(), None);
        adc.release_async().await.done();
    }

    #[tokio::test]
    async fn continuous_voltage_async() {
        let mut transactions = init_transactions();
        transactions.extend([
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x44, 0xc3]),
            Transaction::write_read(ADDRESS, vec![0x00], vec![0x7f, 0xf0]),
            Transaction::write_read(ADDRESS, vec![0x01], vec![0x44, 0xc3]),
        ]);
        let i2c = Mock::new(&transactions);
        let mut adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        let volts = adc.voltage_async().await.unwrap();
        assert!((volts - 2.048).abs() < 1e-4);
        adc.release_async().await.done();
    }

    #[tokio::test]
    async fn one_shot_voltage_async_without_conversion() {
        let mut transactions = init_transactions();
        transactions.push(Transaction::write_read(
            ADDRESS,
            vec![0x01],
            vec![0x45, 0xc3],
        ));
        let i2c = Mock::new(&transactions);
        let mut adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        assert_eq!(adc.voltage_async().await, Err(Error::NoConversion));
        adc.release_async().await.done();
    }

    #[tokio::test]
    async fn range_async_unknown_code() {
        let mut transactions = init_transactions();
        transactions.push(Transaction::write_read(
            ADDRESS,
            vec![0x01],
            vec![0x4c, 0xc3],
        ));
        let i2c = Mock::new(&transactions);
        let mut adc = TLA2024::new_async(i2c, Address::Gnd).await.unwrap();
        assert_eq!(
            adc.range_async().await,
            Err(Error::UnknownFieldValue(ConfigField::Range, 6))
        );
        adc.release_async().await.done();
    }
}
