use num_enum::TryFromPrimitive;

use crate::types::*;

pub(crate) const REGISTER_DATA: u8 = 0x00;
pub(crate) const REGISTER_CONFIG: u8 = 0x01;

// Config register layout, MSB first:
// || OS | MUX MUX MUX | PGA PGA PGA | MODE || DR DR DR | R R R R R ||
impl ConfigField {
    const fn offset(self) -> u8 {
        match self {
            ConfigField::OperationalStatus => 15,
            ConfigField::Mux => 12,
            ConfigField::Range => 9,
            ConfigField::Mode => 8,
            ConfigField::DataRate => 5,
        }
    }

    const fn width(self) -> u8 {
        match self {
            ConfigField::OperationalStatus | ConfigField::Mode => 1,
            ConfigField::Mux | ConfigField::Range | ConfigField::DataRate => 3,
        }
    }

    const fn mask(self) -> u16 {
        ((1u16 << self.width()) - 1) << self.offset()
    }

    /// Reads this field out of a config register image.
    pub(crate) const fn extract(self, register: u16) -> u8 {
        ((register & self.mask()) >> self.offset()) as u8
    }

    /// Replaces this field in a config register image. Bits of `value` wider than the field are
    /// dropped.
    pub(crate) const fn insert(self, register: u16, value: u8) -> u16 {
        (register & !self.mask()) | (((value as u16) << self.offset()) & self.mask())
    }
}

/// Decodes a single field of a config register image into its enum.
pub(crate) fn decode_field<T, E>(register: u16, field: ConfigField) -> Result<T, Error<E>>
where
    T: TryFromPrimitive<Primitive = u8>,
{
    let code = field.extract(register);
    T::try_from_primitive(code).map_err(|_| Error::UnknownFieldValue(field, code))
}

pub(crate) fn decode_config<E>(register: u16) -> Result<Config, Error<E>> {
    Ok(Config {
        mux: decode_field::<_, E>(register, ConfigField::Mux)?,
        range: decode_field::<_, E>(register, ConfigField::Range)?,
        mode: decode_field::<_, E>(register, ConfigField::Mode)?,
        data_rate: decode_field::<_, E>(register, ConfigField::DataRate)?,
    })
}

/// Image to write back after changing `field` in `register`.
///
/// OS is cleared unless it is the field being written: the device reads OS as 1 while busy, and
/// writing that back would start another conversion.
pub(crate) const fn write_back(register: u16, field: ConfigField, value: u8) -> u16 {
    let register = field.insert(register, value);
    match field {
        ConfigField::OperationalStatus => register,
        _ => ConfigField::OperationalStatus.insert(register, 0),
    }
}

/// Image to write back to apply all of `config`, setting OS if it selects one-shot mode.
pub(crate) fn encode_config(register: u16, config: &Config) -> u16 {
    let mut register = register;
    register = ConfigField::Mux.insert(register, config.mux.into());
    register = ConfigField::Range.insert(register, config.range.into());
    register = ConfigField::Mode.insert(register, config.mode.into());
    register = ConfigField::DataRate.insert(register, config.data_rate.into());
    let start = match config.mode {
        Mode::OneShot => 1,
        Mode::Continuous => 0,
    };
    ConfigField::OperationalStatus.insert(register, start)
}

/// Image to write back to switch to one-shot mode and start a conversion in the same write.
pub(crate) const fn start_one_shot(register: u16) -> u16 {
    let register = ConfigField::Mode.insert(register, Mode::OneShot as u8);
    ConfigField::OperationalStatus.insert(register, 1)
}

/// Decodes the data register into a sign-extended 12-bit sample.
///
/// The conversion result is left-justified in the top 12 bits; the low 4 bits carry no data.
pub(crate) const fn decode_sample(raw: u16) -> i16 {
    let mut value = ((raw as i16) >> 4) as u16;
    if value & (1 << 11) != 0 {
        value |= 0xF000;
    } else {
        value &= !0xF000;
    }
    value as i16
}
