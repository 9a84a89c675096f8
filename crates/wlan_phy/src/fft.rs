use num::complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Owned 64-point forward/inverse FFT plan pair, acquired once and reused
/// for every symbol -- the scratch buffer lives with the plan, not on the
/// stack of each call.
pub struct Fft64 {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl Fft64 {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(64);
        let mut planner = FftPlanner::new();
        let inverse = planner.plan_fft_inverse(64);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self { forward, inverse, scratch: vec![Complex32::new(0.0, 0.0); scratch_len] }
    }

    pub fn forward(&mut self, buf: &mut [Complex32; 64]) {
        self.forward.process_with_scratch(buf, &mut self.scratch);
    }

    /// Inverse transform, normalized by 1/64 so `forward(inverse(x)) == x`.
    pub fn inverse(&mut self, buf: &mut [Complex32; 64]) {
        self.inverse.process_with_scratch(buf, &mut self.scratch);
        let norm = 1.0 / 64.0;
        for v in buf.iter_mut() {
            *v *= norm;
        }
    }
}

impl Default for Fft64 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_undoes_forward() {
        let mut fft = Fft64::new();
        let mut buf = [Complex32::new(0.0, 0.0); 64];
        for (i, v) in buf.iter_mut().enumerate() {
            *v = Complex32::new((i as f32 * 0.37).sin(), (i as f32 * 0.21).cos());
        }
        let original = buf;
        fft.forward(&mut buf);
        fft.inverse(&mut buf);
        for (a, b) in buf.iter().zip(original.iter()) {
            assert!((a - b).norm() < 1e-3, "{a:?} vs {b:?}");
        }
    }
}
