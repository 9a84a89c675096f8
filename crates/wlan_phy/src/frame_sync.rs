use crate::{channel_estimate, fft::Fft64, interleaver, nco::Nco, polyfit, puncture, repack, ring::SampleWindow, scrambler, signal::{DataFieldParams, Signal}, viterbi};
use num::complex::Complex32;
use std::f32::consts::PI;
use wlan_core::preamble::data_bins_by_frequency;
use wlan_core::{Lfsr7, Rate, RxVector};

const S0A_ABS_THRESH: f32 = 0.4;
const S1A_ABS_THRESH: f32 = 0.5;
const S1A_ARG_THRESH: f32 = 0.2;
const S1B_ABS_THRESH: f32 = 0.5;
const S1B_ARG_THRESH: f32 = 0.2;
/// Phase rotation applied to the S1 detection statistic to compensate
/// for the 2-sample timing backoff used when reading S1 from the
/// window (`2 * 2*pi/64`).
const S1_BACKOFF_PHASE: f32 = 0.19635;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    SeekPlcp,
    RxShort0,
    RxShort1,
    RxLong0,
    RxLong1,
    RxSignal,
    RxData,
}

/// Tunable knobs left open by spec.md's acquisition thresholds being
/// fixed constants -- present for API symmetry with `FrameGenSettings`
/// and room for future acquisition tuning.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSyncSettings {
    pub _reserved: (),
}

/// Counts of synchronization outcomes, for observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSyncStats {
    pub frames_synced: u64,
    pub frames_rejected: u64,
}

/// Read-only snapshot of the synchronizer's current internal estimates.
#[derive(Debug, Clone, Copy)]
pub struct FrameSyncDiagnostics {
    pub g0: f32,
    pub rssi: f32,
    pub cfo: f32,
    pub phi_prime: f32,
}

type FrameCallback = Box<dyn FnMut(&[u8], RxVector)>;

/// Sample-at-a-time 802.11a/g OFDM frame synchronizer.
pub struct FrameSync {
    callback: FrameCallback,

    state: SyncState,
    timer: i32,
    num_symbols: u32,

    window: SampleWindow,
    nco: Nco,
    pilot: Lfsr7,
    fft: Fft64,

    g0: f32,
    g0a: [Complex32; 64],
    g0b: [Complex32; 64],
    g1a: [Complex32; 64],
    g1b: [Complex32; 64],
    r: [Complex32; 64],
    phi_prime: f32,

    rate: Rate,
    length: u16,
    params: DataFieldParams,
    msg_enc_bits: Vec<u8>,

    stats: FrameSyncStats,
}

impl FrameSync {
    pub fn new(callback: impl FnMut(&[u8], RxVector) + 'static) -> Self {
        Self::with_settings(callback, FrameSyncSettings::default())
    }

    pub fn with_settings(callback: impl FnMut(&[u8], RxVector) + 'static, _settings: FrameSyncSettings) -> Self {
        let rate = Rate::R6;
        let params = DataFieldParams::derive(rate, 1);
        Self {
            callback: Box::new(callback),
            state: SyncState::SeekPlcp,
            timer: 0,
            num_symbols: 0,
            window: SampleWindow::new(),
            nco: Nco::new(),
            pilot: Lfsr7::new(0x7f),
            fft: Fft64::new(),
            g0: 1.0,
            g0a: [Complex32::new(0.0, 0.0); 64],
            g0b: [Complex32::new(0.0, 0.0); 64],
            g1a: [Complex32::new(0.0, 0.0); 64],
            g1b: [Complex32::new(0.0, 0.0); 64],
            r: [Complex32::new(0.0, 0.0); 64],
            phi_prime: 0.0,
            rate,
            length: 1,
            params,
            msg_enc_bits: Vec::new(),
            stats: FrameSyncStats::default(),
        }
    }

    pub fn reset(&mut self) {
        self.window.reset();
        self.nco.reset();
        self.state = SyncState::SeekPlcp;
        self.timer = 0;
        self.num_symbols = 0;
        self.phi_prime = 0.0;
        self.pilot = Lfsr7::new(0x7f);
    }

    pub fn rssi(&self) -> f32 {
        200.0 + (10.0 * self.g0.log10()).floor()
    }

    pub fn cfo(&self) -> f32 {
        self.nco.frequency()
    }

    pub fn stats(&self) -> FrameSyncStats {
        self.stats
    }

    pub fn diagnostics(&self) -> FrameSyncDiagnostics {
        FrameSyncDiagnostics { g0: self.g0, rssi: self.rssi(), cfo: self.cfo(), phi_prime: self.phi_prime }
    }

    /// Processes `samples` one at a time, advancing the state machine
    /// and invoking the frame callback synchronously whenever a frame
    /// completes.
    pub fn execute(&mut self, samples: &[Complex32]) {
        for &sample in samples {
            let x = if self.state == SyncState::SeekPlcp {
                sample
            } else {
                let mixed = self.nco.mix_down(sample);
                self.nco.step();
                mixed
            };
            self.window.push(x);

            match self.state {
                SyncState::SeekPlcp => self.execute_seek_plcp(),
                SyncState::RxShort0 => self.execute_rx_short0(),
                SyncState::RxShort1 => self.execute_rx_short1(),
                SyncState::RxLong0 => self.execute_rx_long0(),
                SyncState::RxLong1 => self.execute_rx_long1(),
                SyncState::RxSignal => self.execute_rx_signal(),
                SyncState::RxData => self.execute_rx_data(),
            }
        }
    }

    fn execute_seek_plcp(&mut self) {
        self.timer += 1;
        if self.timer < 64 {
            return;
        }
        self.timer = 0;

        let rc = self.window.read();
        let mut energy = 0.0f32;
        for &s in &rc[16..80] {
            energy += s.norm_sqr();
        }
        let g = 64.0 / (energy + 1e-12);
        self.g0 = g;

        let mut block = read_block(rc, 16);
        self.fft.forward(&mut block);
        self.g0a = channel_estimate::s0_gain(&block);
        let s_hat = channel_estimate::s0_metric_complex(&self.g0a) * g;

        let tau_hat = s_hat.arg() * 16.0 / (2.0 * PI);
        if s_hat.norm() > S0A_ABS_THRESH {
            let dt = tau_hat.round() as i32;
            self.timer = (16 + dt).rem_euclid(16);
            self.state = SyncState::RxShort0;
        }
    }

    fn execute_rx_short0(&mut self) {
        self.timer += 1;
        if self.timer < 16 {
            return;
        }
        self.timer = 0;

        let rc = self.window.read();
        let mut block = read_block(rc, 16);
        self.fft.forward(&mut block);
        self.g0a = channel_estimate::s0_gain(&block);
        self.state = SyncState::RxShort1;
    }

    fn execute_rx_short1(&mut self) {
        self.timer += 1;
        if self.timer < 16 {
            return;
        }
        self.timer = 0;

        let rc = self.window.read();
        let mut block = read_block(rc, 16);
        self.fft.forward(&mut block);
        self.g0b = channel_estimate::s0_gain(&block);

        let nu_hat = channel_estimate::cfo_from_s0(&self.g0a, &self.g0b);
        self.nco.set_frequency(nu_hat);
        self.state = SyncState::RxLong0;
    }

    fn execute_rx_long0(&mut self) {
        self.timer += 1;
        if self.timer < 16 {
            return;
        }
        self.timer = 0;

        let rc = self.window.read();
        let mut block = read_block(rc, 14);
        self.fft.forward(&mut block);
        self.g1a = channel_estimate::s1_gain(&block);

        let mut s_hat = channel_estimate::s1_metric_complex(&self.g1a) * self.g0;
        s_hat *= Complex32::from_polar(1.0, S1_BACKOFF_PHASE);

        let s_hat_abs = s_hat.norm();
        let s_hat_arg = wrap_pi(s_hat.arg());
        if s_hat_abs > S1A_ABS_THRESH && s_hat_arg.abs() < S1A_ARG_THRESH {
            self.state = SyncState::RxLong1;
            self.timer = 0;
        }
    }

    fn execute_rx_long1(&mut self) {
        self.timer += 1;
        if self.timer < 64 {
            return;
        }

        let rc = self.window.read();
        let mut block = read_block(rc, 14);
        self.fft.forward(&mut block);
        self.g1b = channel_estimate::s1_gain(&block);

        let mut s_hat = channel_estimate::s1_metric_complex(&self.g1b) * self.g0;
        s_hat *= Complex32::from_polar(1.0, S1_BACKOFF_PHASE);

        let s_hat_abs = s_hat.norm();
        let s_hat_arg = wrap_pi(s_hat.arg());
        if s_hat_abs > S1B_ABS_THRESH && s_hat_arg.abs() < S1B_ARG_THRESH {
            let nu_hat = channel_estimate::cfo_from_s1(&self.g1a, &self.g1b);
            self.nco.adjust_frequency(nu_hat);
            self.r = channel_estimate::equalizer_from_s1(&self.g1b);
        }

        self.state = SyncState::RxSignal;
        self.timer = 0;
    }

    fn execute_rx_signal(&mut self) {
        self.timer += 1;
        if self.timer < 80 {
            return;
        }
        self.timer = 0;

        let rc = self.window.read();
        let mut x = read_block(rc, 14);
        self.fft.forward(&mut x);
        self.rx_symbol(&mut x);

        let signal_bits: Vec<u8> =
            data_bins_by_frequency().map(|bin| if x[bin].re > 0.0 { 1 } else { 0 }).collect();

        let mut deinterleaved = vec![0u8; 48];
        interleaver::deinterleave(&signal_bits, &mut deinterleaved, 1);
        let soft: Vec<u8> = deinterleaved.iter().map(|&b| if b == 1 { 255 } else { 0 }).collect();
        let decoded_bits = viterbi::decode(&soft, 24);
        let decoded_bytes = repack::repack_bits(&decoded_bits, 1, 8);
        let signal_bytes: [u8; 3] = [decoded_bytes[0], decoded_bytes[1], decoded_bytes[2]];

        match Signal::unpack(&signal_bytes) {
            Some(signal) => {
                self.rate = signal.rate;
                self.length = signal.length;
                self.params = DataFieldParams::derive(self.rate, self.length);
                self.msg_enc_bits = vec![0u8; (self.params.nsym * self.rate.entry().ncbps) as usize];
                self.num_symbols = 0;
                self.state = SyncState::RxData;
            }
            None => {
                self.stats.frames_rejected += 1;
                self.reset();
            }
        }
    }

    fn execute_rx_data(&mut self) {
        self.timer += 1;
        if self.timer < 80 {
            return;
        }
        self.timer = 0;

        let rc = self.window.read();
        let mut x = read_block(rc, 14);
        self.fft.forward(&mut x);
        self.rx_symbol(&mut x);

        let nbpsc = self.rate.entry().nbpsc;
        let modulation = self.rate.entry().modulation;
        let symbols: Vec<u8> =
            data_bins_by_frequency().map(|bin| crate::modem::demodulate(modulation, x[bin])).collect();
        let interleaved_bits = repack::repack_bits(&symbols, nbpsc, 1);

        let ncbps = self.rate.entry().ncbps as usize;
        let mut symbol_bits = vec![0u8; ncbps];
        interleaver::deinterleave(&interleaved_bits, &mut symbol_bits, nbpsc as usize);

        let offset = self.num_symbols as usize * ncbps;
        for (slot, &bit) in self.msg_enc_bits[offset..offset + ncbps].iter_mut().zip(symbol_bits.iter()) {
            *slot = if bit == 1 { 255 } else { 0 };
        }
        self.num_symbols += 1;

        if self.num_symbols == self.params.nsym {
            let ndata_raw = self.params.ndata as usize;
            let depunctured =
                puncture::depuncture(&self.msg_enc_bits, self.rate.entry().code_rate, ndata_raw * 2);
            let mut decoded = viterbi::decode(&depunctured, ndata_raw);
            scrambler::descramble_frame(&mut decoded);

            let payload_bits = &decoded[16..16 + 8 * self.length as usize];
            let payload_bytes = repack::repack_bits(payload_bits, 1, 8);

            let rx_vector = RxVector {
                length: self.length as usize,
                rssi: self.rssi() as i32,
                datarate: self.rate,
                service: 0,
            };
            self.stats.frames_synced += 1;
            (self.callback)(&payload_bytes, rx_vector);
            self.reset();
        }
    }

    /// Applies the equalizer gain and corrects residual pilot-carried
    /// phase offset in place; advances the pilot sequence and the NCO's
    /// differential-phase tracking loop.
    fn rx_symbol(&mut self, x: &mut [Complex32; 64]) {
        for (xi, &ri) in x.iter_mut().zip(self.r.iter()) {
            *xi *= ri;
        }

        let pilot_phase = self.pilot.advance();
        let x_phase = [-21.0f32, -7.0, 7.0, 21.0];
        let mut y_phase = [0.0f32; 4];
        y_phase[0] = if pilot_phase == 1 { (-x[43]).arg() } else { x[43].arg() };
        y_phase[1] = if pilot_phase == 1 { (-x[57]).arg() } else { x[57].arg() };
        y_phase[2] = if pilot_phase == 1 { (-x[7]).arg() } else { x[7].arg() };
        y_phase[3] = if pilot_phase == 1 { x[21].arg() } else { (-x[21]).arg() };

        for i in 1..4 {
            while y_phase[i] - y_phase[i - 1] > PI {
                y_phase[i] -= 2.0 * PI;
            }
            while y_phase[i] - y_phase[i - 1] < -PI {
                y_phase[i] += 2.0 * PI;
            }
        }

        let mut p_phase = [0.0f32; 2];
        polyfit::fit(&x_phase, &y_phase, &mut p_phase);

        for (i, xi) in x.iter_mut().enumerate() {
            let fx = wlan_core::preamble::shifted_subcarrier(i) as f32;
            let theta = polyfit::eval(&p_phase, fx);
            *xi *= Complex32::from_polar(1.0, -theta);
        }

        if self.num_symbols > 0 {
            let mut dphi_prime = p_phase[0] - self.phi_prime;
            dphi_prime = wrap_pi(dphi_prime);
            self.nco.adjust_frequency(1e-3 * dphi_prime);
        }
        self.phi_prime = p_phase[0];
    }
}

fn read_block(rc: &[Complex32], offset: usize) -> [Complex32; 64] {
    let mut block = [Complex32::new(0.0, 0.0); 64];
    block.copy_from_slice(&rc[offset..offset + 64]);
    block
}

fn wrap_pi(mut theta: f32) -> f32 {
    while theta > PI {
        theta -= 2.0 * PI;
    }
    while theta < -PI {
        theta += 2.0 * PI;
    }
    theta
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_in_seek_state() {
        let sync = FrameSync::new(|_, _| {});
        assert_eq!(sync.state, SyncState::SeekPlcp);
    }

    #[test]
    fn reset_returns_to_seek_state_with_zeroed_timer() {
        let mut sync = FrameSync::new(|_, _| {});
        sync.state = SyncState::RxData;
        sync.timer = 42;
        sync.reset();
        assert_eq!(sync.state, SyncState::SeekPlcp);
        assert_eq!(sync.timer, 0);
    }

    #[test]
    fn noise_alone_never_triggers_a_callback() {
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = fired.clone();
        let mut sync = FrameSync::new(move |_, _| {
            *fired_clone.borrow_mut() = true;
        });
        let samples = vec![Complex32::new(0.0, 0.0); 4096];
        sync.execute(&samples);
        assert!(!*fired.borrow());
    }

    fn generate_frame(rate: wlan_core::Rate, payload: &[u8]) -> Vec<Complex32> {
        generate_frame_with_service(rate, payload, 0)
    }

    fn generate_frame_with_service(rate: wlan_core::Rate, payload: &[u8], service: u16) -> Vec<Complex32> {
        use crate::frame_gen::FrameGen;
        use wlan_core::TxVector;

        let mut gen = FrameGen::new();
        let tx_vector = TxVector::new(payload.len(), rate, service, 1).unwrap();
        gen.assemble(payload, tx_vector).unwrap();

        let mut samples = Vec::new();
        while let Some((buf, done)) = gen.write_symbol() {
            samples.extend_from_slice(&buf);
            if done {
                break;
            }
        }
        samples
    }

    #[test]
    fn recovers_a_clean_generated_frame_at_every_rate() {
        for &rate in wlan_core::Rate::ALL.iter() {
            let payload: Vec<u8> = (0..37).map(|i: u32| (i * 17 + 3) as u8).collect();
            let samples = generate_frame(rate, &payload);

            let received = Rc::new(RefCell::new(None));
            let received_clone = received.clone();
            let mut sync = FrameSync::new(move |bytes, rx_vector| {
                *received_clone.borrow_mut() = Some((bytes.to_vec(), rx_vector));
            });

            let mut padded = vec![Complex32::new(0.0, 0.0); 128];
            padded.extend_from_slice(&samples);
            padded.extend(vec![Complex32::new(0.0, 0.0); 128]);
            sync.execute(&padded);

            let result = received.borrow();
            let (bytes, rx_vector) = result.as_ref().unwrap_or_else(|| panic!("no frame recovered at {rate:?}"));
            assert_eq!(bytes, &payload, "payload mismatch at {rate:?}");
            assert_eq!(rx_vector.datarate, rate);
            assert_eq!(rx_vector.length, payload.len());
        }
    }

    #[test]
    fn recovers_a_frame_with_nonzero_service() {
        // SERVICE's low 7 bits seed the data scrambler but must never
        // affect the pilot LFSR, which always starts at 0x7f.
        let payload: Vec<u8> = (0..40).map(|i: u32| (i * 13 + 5) as u8).collect();
        let samples = generate_frame_with_service(wlan_core::Rate::R36, &payload, 0x55);

        let received = Rc::new(RefCell::new(None));
        let received_clone = received.clone();
        let mut sync = FrameSync::new(move |bytes, rx_vector| {
            *received_clone.borrow_mut() = Some((bytes.to_vec(), rx_vector));
        });

        let mut padded = vec![Complex32::new(0.0, 0.0); 128];
        padded.extend_from_slice(&samples);
        padded.extend(vec![Complex32::new(0.0, 0.0); 128]);
        sync.execute(&padded);

        let result = received.borrow();
        let (bytes, rx_vector) = result.as_ref().unwrap_or_else(|| panic!("no frame recovered with nonzero service"));
        assert_eq!(bytes, &payload);
        assert_eq!(rx_vector.datarate, wlan_core::Rate::R36);
        assert_eq!(rx_vector.length, payload.len());
    }

    #[test]
    fn recovers_two_back_to_back_frames() {
        let payload_a: Vec<u8> = (0..20u32).map(|i| (i * 7 + 1) as u8).collect();
        let payload_b: Vec<u8> = (0..50u32).map(|i| (i * 3 + 11) as u8).collect();

        let mut samples = generate_frame(wlan_core::Rate::R24, &payload_a);
        samples.extend(vec![Complex32::new(0.0, 0.0); 64]);
        samples.extend(generate_frame(wlan_core::Rate::R54, &payload_b));

        let received = Rc::new(RefCell::new(Vec::new()));
        let received_clone = received.clone();
        let mut sync = FrameSync::new(move |bytes, rx_vector| {
            received_clone.borrow_mut().push((bytes.to_vec(), rx_vector));
        });

        let mut padded = vec![Complex32::new(0.0, 0.0); 128];
        padded.extend_from_slice(&samples);
        padded.extend(vec![Complex32::new(0.0, 0.0); 128]);
        sync.execute(&padded);

        let result = received.borrow();
        assert_eq!(result.len(), 2, "expected two frames recovered");
        assert_eq!(result[0].0, payload_a);
        assert_eq!(result[0].1.datarate, wlan_core::Rate::R24);
        assert_eq!(result[1].0, payload_b);
        assert_eq!(result[1].1.datarate, wlan_core::Rate::R54);
        assert_eq!(sync.stats().frames_synced, 2);
    }

    #[test]
    fn corrupted_signal_parity_is_rejected_with_no_callback() {
        use crate::frame_gen::FrameGen;
        use wlan_core::TxVector;

        let payload = vec![0xaau8; 24];
        let mut gen = FrameGen::new();
        let tx_vector = TxVector::new(payload.len(), wlan_core::Rate::R12, 0, 1).unwrap();
        gen.assemble(&payload, tx_vector).unwrap();

        let mut samples = Vec::new();
        let mut symbol_index = 0;
        while let Some((mut buf, done)) = gen.write_symbol() {
            if symbol_index == 4 {
                // Corrupt several samples in the SIGNAL symbol's
                // data portion, enough to flip decoded SIGNAL
                // bits and break its parity without destroying
                // acquisition.
                for s in buf[20..60].iter_mut().step_by(3) {
                    *s *= -1.0;
                }
            }
            samples.extend_from_slice(&buf);
            symbol_index += 1;
            // Stop right after the corrupted SIGNAL symbol so no
            // genuine DATA symbols remain to spuriously
            // re-trigger acquisition once the synchronizer
            // resets.
            if symbol_index > 4 || done {
                break;
            }
        }

        let fired = Rc::new(RefCell::new(false));
        let fired_clone = fired.clone();
        let mut sync = FrameSync::new(move |_, _| {
            *fired_clone.borrow_mut() = true;
        });

        let mut padded = vec![Complex32::new(0.0, 0.0); 128];
        padded.extend_from_slice(&samples);
        padded.extend(vec![Complex32::new(0.0, 0.0); 128]);
        sync.execute(&padded);

        assert!(!*fired.borrow());
        assert_eq!(sync.stats().frames_rejected, 1);
        assert_eq!(sync.state, SyncState::SeekPlcp);
    }

    #[test]
    fn cfo_converges_against_a_rotated_carrier() {
        let payload: Vec<u8> = (0..60u32).map(|i| (i * 13 + 5) as u8).collect();
        let samples = generate_frame(wlan_core::Rate::R48, &payload);

        // Apply a small constant per-sample phase rotation, simulating
        // an uncorrected carrier frequency offset on the channel.
        let true_cfo = 0.01f32;
        let rotated: Vec<Complex32> =
            samples.iter().enumerate().map(|(i, &s)| s * Complex32::from_polar(1.0, true_cfo * i as f32)).collect();

        let received = Rc::new(RefCell::new(None));
        let received_clone = received.clone();
        let locked_cfo = Rc::new(RefCell::new(None));
        let locked_cfo_clone = locked_cfo.clone();
        let mut sync = FrameSync::new(move |bytes, rx_vector| {
            *received_clone.borrow_mut() = Some((bytes.to_vec(), rx_vector));
        });

        let mut padded = vec![Complex32::new(0.0, 0.0); 128];
        padded.extend_from_slice(&rotated);
        padded.extend(vec![Complex32::new(0.0, 0.0); 128]);

        // Feed sample-by-sample, continuously recording the NCO's
        // locked frequency while in RxData -- execute_rx_data's
        // end-of-frame reset happens synchronously within the same call
        // that invokes the callback, so the CFO can't be read back out
        // after the fact.
        for &sample in &padded {
            sync.execute(std::slice::from_ref(&sample));
            if sync.state == SyncState::RxData {
                *locked_cfo_clone.borrow_mut() = Some(sync.cfo());
            }
        }

        let result = received.borrow();
        let (bytes, _) = result.as_ref().expect("frame recovered despite carrier offset");
        assert_eq!(bytes, &payload);
        // The NCO should have locked onto the applied offset so mixing
        // down by it exactly cancels the channel rotation.
        let cfo = locked_cfo.borrow().expect("frame completed without observing a locked cfo");
        assert!((cfo - true_cfo).abs() < 0.002, "cfo={cfo}");
    }
}
