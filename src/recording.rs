use crate::SAMPLE_RATE;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::thread;

/// Captures everything the ensemble plays into a WAV file.
///
/// A dedicated writer thread keeps file I/O off the playback path; closing
/// flushes outstanding writes and joins the thread.
pub struct Recorder {
    sample_tx: Sender<Vec<i8>>,
    handle: thread::JoinHandle<()>,
}

impl Recorder {
    pub fn create(path: &Path) -> Result<Recorder, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE as u32,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // Created here so an unwritable path surfaces before playback starts.
        let writer = hound::WavWriter::create(path, spec)?;

        let (sample_tx, sample_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("recorder".to_string())
            .spawn(move || wav_writer_loop(writer, sample_rx))
            .expect("Failed to spawn recorder thread");

        Ok(Recorder { sample_tx, handle })
    }

    pub fn append(&self, samples: &[i8]) {
        self.sample_tx
            .send(samples.to_vec())
            .expect("Recorder thread hung up");
    }

    /// Flushes the WAV file and joins the writer thread.
    pub fn close(self) {
        drop(self.sample_tx);
        self.handle.join().expect("Failed to join recorder thread");
    }
}

fn wav_writer_loop(mut writer: hound::WavWriter<BufWriter<File>>, sample_rx: Receiver<Vec<i8>>) {
    while let Ok(chunk) = sample_rx.recv() {
        for sample in chunk {
            // Widen the 8-bit samples into the WAV's 16-bit range.
            writer
                .write_sample((sample as i16) << 8)
                .expect("Failed to write WAV sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV file");
    info!("Flushed WAV recording");
}
