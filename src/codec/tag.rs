//! Type tag definitions
//!
//! One byte in front of every payload says how to read it.

use crate::error::PrefError;
use crate::value::Value;

/// Type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    False = 0x00,
    True = 0x01,
    String = 0x02,
    Int = 0x03,
    Long = 0x04,
    Float = 0x05,
    StringSet = 0x06,
}

impl TypeTag {
    /// Get the tag a value is written with
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(false) => TypeTag::False,
            Value::Bool(true) => TypeTag::True,
            Value::String(_) => TypeTag::String,
            Value::Int(_) => TypeTag::Int,
            Value::Long(_) => TypeTag::Long,
            Value::Float(_) => TypeTag::Float,
            Value::StringSet(_) => TypeTag::StringSet,
        }
    }
}

impl TryFrom<u8> for TypeTag {
    type Error = PrefError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(TypeTag::False),
            0x01 => Ok(TypeTag::True),
            0x02 => Ok(TypeTag::String),
            0x03 => Ok(TypeTag::Int),
            0x04 => Ok(TypeTag::Long),
            0x05 => Ok(TypeTag::Float),
            0x06 => Ok(TypeTag::StringSet),
            _ => Err(PrefError::Decode(format!("Unknown type tag: 0x{:02x}", byte))),
        }
    }
}
