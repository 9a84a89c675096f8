use num::complex::Complex32;

const LEN: usize = 80;

/// Holds exactly the last 80 complex samples (one OFDM symbol plus guard),
/// exposing them as a contiguous oldest-to-newest slice after every push.
///
/// Implemented with a doubled backing array so `read()` never has to copy:
/// each sample is written at both `index` and `index + LEN`, so the 80
/// samples starting at the current `index` are always contiguous and in
/// push order.
pub struct SampleWindow {
    data: Vec<Complex32>,
    index: usize,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self { data: vec![Complex32::new(0.0, 0.0); LEN * 2], index: 0 }
    }

    pub fn reset(&mut self) {
        for sample in self.data.iter_mut() {
            *sample = Complex32::new(0.0, 0.0);
        }
        self.index = 0;
    }

    pub fn push(&mut self, sample: Complex32) {
        self.data[self.index] = sample;
        self.data[self.index + LEN] = sample;
        self.index = (self.index + 1) % LEN;
    }

    /// Oldest-to-newest view of the last 80 samples.
    pub fn read(&self) -> &[Complex32] {
        &self.data[self.index..self.index + LEN]
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_reflects_push_order_once_full() {
        let mut window = SampleWindow::new();
        for i in 0..LEN {
            window.push(Complex32::new(i as f32, 0.0));
        }
        let view: Vec<f32> = window.read().iter().map(|c| c.re).collect();
        let expected: Vec<f32> = (0..LEN as i32).map(|i| i as f32).collect();
        assert_eq!(view, expected);
    }

    #[test]
    fn oldest_sample_is_evicted_on_overflow() {
        let mut window = SampleWindow::new();
        for i in 0..(LEN + 3) {
            window.push(Complex32::new(i as f32, 0.0));
        }
        let view: Vec<f32> = window.read().iter().map(|c| c.re).collect();
        let expected: Vec<f32> = (3..(LEN as i32 + 3)).map(|i| i as f32).collect();
        assert_eq!(view, expected);
    }
}
