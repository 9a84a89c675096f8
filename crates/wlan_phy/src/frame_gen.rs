use crate::{fft::Fft64, interleaver, modem, puncture, repack, scrambler, signal::{DataFieldParams, Signal}, viterbi};
use num::complex::Complex32;
use std::collections::VecDeque;
use wlan_core::preamble::{data_bins_by_frequency, long_training_freq, short_training_freq};
use wlan_core::{Lfsr7, TxVector, WlanError};

const PILOT_BASE_SIGN: [f32; 4] = [1.0, 1.0, 1.0, -1.0];
const PILOT_BINS: [usize; 4] = [43, 57, 7, 21];

/// Knobs left open for symmetry with `FrameSyncSettings`; none are
/// currently exposed beyond the fixed standard waveform shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameGenSettings {
    pub _reserved: (),
}

/// Mirror of [`crate::FrameSync`]: assembles a complete PLCP frame and
/// emits it as a sequence of 80-sample OFDM symbol buffers.
pub struct FrameGen {
    fft: Fft64,
    buffers: VecDeque<[Complex32; 80]>,
}

impl FrameGen {
    pub fn new() -> Self {
        Self::with_settings(FrameGenSettings::default())
    }

    pub fn with_settings(_settings: FrameGenSettings) -> Self {
        Self { fft: Fft64::new(), buffers: VecDeque::new() }
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
    }

    /// Builds the full sample sequence for `payload` under `tx_vector`,
    /// ready to be drained one 80-sample symbol at a time via
    /// [`Self::write_symbol`].
    pub fn assemble(&mut self, payload: &[u8], tx_vector: TxVector) -> Result<(), WlanError> {
        if payload.len() != tx_vector.length {
            return Err(WlanError::InvalidLength(payload.len()));
        }
        self.reset();

        let preamble = self.build_preamble();
        for buf in preamble {
            self.buffers.push_back(buf);
        }

        let mut pilot = Lfsr7::new(0x7f);
        let params = DataFieldParams::derive(tx_vector.datarate, tx_vector.length as u16);

        let signal_buf = self.build_signal(tx_vector, &mut pilot);
        self.buffers.push_back(signal_buf);

        let data_buffers = self.build_data(payload, tx_vector, &params, &mut pilot);
        for buf in data_buffers {
            self.buffers.push_back(buf);
        }
        Ok(())
    }

    /// Pops the next 80-sample symbol buffer, returning `(buffer, true)`
    /// when it was the last one in the assembled frame.
    pub fn write_symbol(&mut self) -> Option<([Complex32; 80], bool)> {
        let buf = self.buffers.pop_front()?;
        let done = self.buffers.is_empty();
        Some((buf, done))
    }

    pub fn is_complete(&self) -> bool {
        self.buffers.is_empty()
    }

    fn build_preamble(&mut self) -> Vec<[Complex32; 80]> {
        let mut s0_time = short_training_freq();
        self.fft.inverse(&mut s0_time);
        let mut short_rep = [Complex32::new(0.0, 0.0); 16];
        short_rep.copy_from_slice(&s0_time[0..16]);

        let mut s0_buf0 = [Complex32::new(0.0, 0.0); 80];
        let mut s0_buf1 = [Complex32::new(0.0, 0.0); 80];
        for rep in 0..5 {
            s0_buf0[rep * 16..rep * 16 + 16].copy_from_slice(&short_rep);
        }
        for rep in 0..5 {
            s0_buf1[rep * 16..rep * 16 + 16].copy_from_slice(&short_rep);
        }

        let mut s1_time = long_training_freq();
        self.fft.inverse(&mut s1_time);

        let mut s1_buf0 = [Complex32::new(0.0, 0.0); 80];
        s1_buf0[0..32].copy_from_slice(&s1_time[32..64]);
        s1_buf0[32..80].copy_from_slice(&s1_time[0..48]);
        let mut s1_buf1 = [Complex32::new(0.0, 0.0); 80];
        s1_buf1[0..16].copy_from_slice(&s1_time[48..64]);
        s1_buf1[16..80].copy_from_slice(&s1_time[0..64]);

        vec![s0_buf0, s0_buf1, s1_buf0, s1_buf1]
    }

    fn build_signal(&mut self, tx_vector: TxVector, pilot: &mut Lfsr7) -> [Complex32; 80] {
        let signal = Signal { rate: tx_vector.datarate, reserved: false, length: tx_vector.length as u16 };
        let bytes = signal.pack();
        let raw_bits = repack::repack_bits(&bytes, 8, 1);
        let encoded = viterbi::encode(&raw_bits);
        let mut interleaved = vec![0u8; 48];
        interleaver::interleave(&encoded, &mut interleaved, 1);
        self.modulate_symbol(&interleaved, 1, wlan_core::Modulation::Bpsk, pilot)
    }

    fn build_data(
        &mut self,
        payload: &[u8],
        tx_vector: TxVector,
        params: &DataFieldParams,
        pilot: &mut Lfsr7,
    ) -> Vec<[Complex32; 80]> {
        let entry = tx_vector.datarate.entry();
        let nbits = 16 + 8 * tx_vector.length as u32 + 6;

        let mut raw = vec![0u8; params.ndata as usize];
        let payload_bits = repack::repack_bits(payload, 8, 1);
        raw[16..16 + payload_bits.len()].copy_from_slice(&payload_bits);

        let seed = if tx_vector.service & 0x7f != 0 { (tx_vector.service & 0x7f) as u8 } else { 0x5d };
        scrambler::scramble_frame(seed, &mut raw);
        raw[nbits as usize - 6..nbits as usize].fill(0);

        let encoded = viterbi::encode(&raw);
        let punctured = puncture::puncture(&encoded, entry.code_rate);

        let ncbps = entry.ncbps as usize;
        let mut buffers = Vec::with_capacity(params.nsym as usize);
        for symbol in punctured.chunks(ncbps) {
            let mut interleaved = vec![0u8; ncbps];
            interleaver::interleave(symbol, &mut interleaved, entry.nbpsc as usize);
            buffers.push(self.modulate_symbol(&interleaved, entry.nbpsc as usize, entry.modulation, pilot));
        }
        buffers
    }

    /// Places `nbpsc`-bit interleaved coded bits onto the 48 data
    /// subcarriers (in the same ascending-frequency order the receiver
    /// reads them back in) and pilot BPSK symbols onto the 4 pilot
    /// subcarriers, then IFFTs and prepends the 16-sample cyclic prefix.
    fn modulate_symbol(
        &mut self,
        interleaved: &[u8],
        nbpsc: usize,
        modulation: wlan_core::Modulation,
        pilot: &mut Lfsr7,
    ) -> [Complex32; 80] {
        let symbols = repack::repack_bits(interleaved, 1, nbpsc as u32);

        let mut freq = [Complex32::new(0.0, 0.0); 64];
        for (bin, &symbol) in data_bins_by_frequency().zip(symbols.iter()) {
            freq[bin] = modem::modulate(modulation, symbol);
        }

        let pilot_phase = pilot.advance();
        for (&bin, &sign) in PILOT_BINS.iter().zip(PILOT_BASE_SIGN.iter()) {
            let s = if pilot_phase == 1 { -sign } else { sign };
            freq[bin] = Complex32::new(s, 0.0);
        }

        self.fft.inverse(&mut freq);

        let mut out = [Complex32::new(0.0, 0.0); 80];
        out[0..16].copy_from_slice(&freq[48..64]);
        out[16..80].copy_from_slice(&freq[0..64]);
        out
    }
}

impl Default for FrameGen {
    fn default() -> Self {
        Self::new()
    }
}
