pub mod error;
pub mod lfsr;
pub mod preamble;
pub mod rate;
pub mod vector;

pub use error::WlanError;
pub use lfsr::Lfsr7;
pub use rate::{CodeRate, Modulation, Rate, RateEntry, RATE_TABLE};
pub use vector::{RxVector, TxVector};
