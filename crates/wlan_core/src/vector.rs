use crate::error::WlanError;
use crate::rate::Rate;

/// Transmit parameters supplied to `assemble`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxVector {
    pub length: usize,
    pub datarate: Rate,
    pub service: u16,
    pub txpwr_level: u8,
}

impl TxVector {
    pub fn new(length: usize, datarate: Rate, service: u16, txpwr_level: u8) -> Result<Self, WlanError> {
        if !(1..=4095).contains(&length) {
            return Err(WlanError::InvalidLength(length));
        }
        if !(1..=8).contains(&txpwr_level) {
            return Err(WlanError::InvalidTxPower(txpwr_level));
        }
        Ok(Self { length, datarate, service, txpwr_level })
    }
}

/// Receive descriptor delivered to the synchronizer's frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxVector {
    pub length: usize,
    pub rssi: i32,
    pub datarate: Rate,
    pub service: u16,
}
