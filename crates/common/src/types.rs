use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte EVM account or contract address.
///
/// Displayed and serialized as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address must be a 0x-prefixed hex string")]
    MissingPrefix,
    #[error("address must contain exactly {ADDRESS_LENGTH} bytes")]
    InvalidLength,
    #[error("address contains non-hex characters")]
    InvalidHex,
}

impl Address {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressParseError> {
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| AddressParseError::InvalidLength)?;
        Ok(Address(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").ok_or(AddressParseError::MissingPrefix)?;
        if hex_part.len() != ADDRESS_LENGTH * 2 {
            return Err(AddressParseError::InvalidLength);
        }
        let bytes = hex::decode(hex_part).map_err(|_| AddressParseError::InvalidHex)?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
