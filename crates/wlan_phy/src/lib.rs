pub mod channel_estimate;
pub mod fft;
pub mod frame_gen;
pub mod frame_sync;
pub mod interleaver;
pub mod modem;
pub mod nco;
pub mod polyfit;
pub mod puncture;
pub mod repack;
pub mod ring;
pub mod scrambler;
pub mod signal;
pub mod viterbi;

pub use frame_gen::FrameGen;
pub use frame_sync::FrameSync;
