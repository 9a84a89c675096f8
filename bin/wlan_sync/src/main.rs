use clap::Parser;
use num::complex::Complex32;
use std::cell::RefCell;
use std::io::{BufWriter, Read, Write};
use wlan_phy::FrameSync;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppArguments {
    /// Number of IQ sample pairs to read in each chunk from the input.
    #[arg(short, long, default_value_t = 4096 * 8)]
    number_of_input_samples: usize,
    /// Input filepath carrying interleaved 8-bit unsigned I/Q samples
    /// (dc_offset = 128). If not provided, reads from stdin.
    #[arg(short, long)]
    input_filepath: Option<String>,
    /// Output filepath for recovered PSDU payload bytes, one frame's
    /// bytes written back-to-back per synced frame. If not provided,
    /// writes to stdout.
    #[arg(short, long)]
    output_filepath: Option<String>,
}

fn main() -> Result<(), String> {
    let args = AppArguments::parse();

    let number_of_input_samples = match args.number_of_input_samples {
        0 => return Err("Number of input samples cannot be zero.".into()),
        length => length,
    };

    let mut input_file: Box<dyn Read> = match &args.input_filepath {
        None => Box::new(std::io::stdin()),
        Some(filepath) => match std::fs::File::open(filepath) {
            Ok(file) => Box::new(file),
            Err(err) => return Err(format!("Failed to open input file {filepath}: {err}")),
        },
    };
    let output_file: Box<dyn Write> = match &args.output_filepath {
        None => Box::new(BufWriter::new(std::io::stdout())),
        Some(filepath) => match std::fs::File::create(filepath) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(err) => return Err(format!("Failed to open output file {filepath}: {err}")),
        },
    };
    let output_file = RefCell::new(output_file);

    // `FrameSync::execute` already delivers complete frames
    // synchronously via callback, so -- unlike the teacher's DAB
    // demodulator, which hands partial bit-output buffers across a
    // Barrier to a separate writer thread -- a single reader thread
    // suffices here.
    let mut sync = FrameSync::new(move |bytes, rx_vector| {
        eprintln!(
            "[frame_sync] synced frame: rate={:?} length={} rssi={}",
            rx_vector.datarate, rx_vector.length, rx_vector.rssi
        );
        if let Err(err) = output_file.borrow_mut().write_all(bytes) {
            eprintln!("[frame_sync] Error while writing recovered payload: {err}");
        }
    });

    let bytes_per_sample = 2;
    let mut input_bytes_buffer = vec![0u8; number_of_input_samples * bytes_per_sample];
    let mut input_samples_buffer = vec![Complex32::default(); number_of_input_samples];

    loop {
        let total_samples = match input_file.read(&mut input_bytes_buffer) {
            Ok(0) => {
                eprintln!("[reader] Finished reading samples from input");
                break;
            }
            Ok(length) => length / bytes_per_sample,
            Err(err) => {
                eprintln!("[reader] Error while reading from input: {err}");
                break;
            }
        };
        let dc_offset = 128.0;
        input_bytes_buffer[0..total_samples * bytes_per_sample]
            .chunks_exact(bytes_per_sample)
            .enumerate()
            .for_each(|(i, x)| {
                input_samples_buffer[i].re = x[0] as f32 - dc_offset;
                input_samples_buffer[i].im = x[1] as f32 - dc_offset;
            });
        sync.execute(&input_samples_buffer[..total_samples]);
    }

    let stats = sync.stats();
    eprintln!("[reader] frames synced={} rejected={}", stats.frames_synced, stats.frames_rejected);

    Ok(())
}
