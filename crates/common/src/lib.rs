//! Shared primitives for the faucet service: EVM address newtype and
//! decimal-to-base-unit amount conversion.

pub mod types;
pub mod units;

pub use types::{Address, AddressParseError, ADDRESS_LENGTH};
pub use units::{to_base_units, UnitError};
