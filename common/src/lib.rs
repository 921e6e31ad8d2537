//! Currency Converter Common Types
//!
//! Shared types used by the conversion engine and the rate refresh job:
//! currencies and the supported-currency catalog, exchange rates and rate
//! snapshots, and amount text handling.

pub mod amount;
pub mod catalog;
pub mod currency;
pub mod error;
pub mod rate;

pub use amount::*;
pub use catalog::*;
pub use currency::*;
pub use error::*;
pub use rate::*;
