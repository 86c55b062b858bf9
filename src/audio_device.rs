use crate::SAMPLE_RATE;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use thiserror::Error;

/// Destination for raw PCM samples. Seam between the players and the device
/// so playback can be observed without real hardware.
pub trait PcmSink {
    fn write(&mut self, samples: &[i8]);

    /// Block until every previously written sample has been rendered.
    fn drain(&mut self);
}

#[derive(Debug, Error)]
pub enum LineError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// Tracks how many written samples the device callback has not yet consumed.
struct LineDepth {
    queued: Mutex<usize>,
    emptied: Condvar,
}

/// An open line to the default output device: mono, signed 8-bit, ~48KHz.
///
/// Samples are queued to the device callback over a channel; `drain` blocks
/// until the callback has moved every queued sample into the device buffer.
pub struct AudioOutputLine {
    _stream: cpal::Stream,
    sample_tx: Sender<Vec<i8>>,
    depth: Arc<LineDepth>,
}

impl AudioOutputLine {
    pub fn connect_default() -> Result<AudioOutputLine, LineError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(LineError::NoDevice)?;
        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(SAMPLE_RATE as u32),
            buffer_size: BufferSize::Default,
        };
        info!("Opening output line with config: {:?}", config);

        let (sample_tx, sample_rx) = crossbeam_channel::unbounded::<Vec<i8>>();
        let depth = Arc::new(LineDepth {
            queued: Mutex::new(0),
            emptied: Condvar::new(),
        });

        let callback_depth = depth.clone();
        let mut pending = VecDeque::new();
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [i8], _: &cpal::OutputCallbackInfo| {
                service_line_callback(data, &sample_rx, &mut pending, &callback_depth)
            },
            |err| warn!("Output stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok(AudioOutputLine {
            _stream: stream,
            sample_tx,
            depth,
        })
    }
}

impl PcmSink for AudioOutputLine {
    fn write(&mut self, samples: &[i8]) {
        if samples.is_empty() {
            return;
        }
        // Count before sending so the callback can never observe more
        // consumed samples than queued ones.
        {
            let mut queued = self.depth.queued.lock().expect("line depth lock poisoned");
            *queued += samples.len();
        }
        self.sample_tx
            .send(samples.to_vec())
            .expect("Failed to send samples to output line");
    }

    fn drain(&mut self) {
        let mut queued = self.depth.queued.lock().expect("line depth lock poisoned");
        while *queued > 0 {
            queued = self
                .depth
                .emptied
                .wait(queued)
                .expect("line depth lock poisoned");
        }
    }
}

fn service_line_callback(
    data: &mut [i8],
    sample_rx: &Receiver<Vec<i8>>,
    pending: &mut VecDeque<i8>,
    depth: &LineDepth,
) {
    let mut filled = 0;
    while filled < data.len() {
        if pending.is_empty() {
            match sample_rx.try_recv() {
                Ok(chunk) => pending.extend(chunk),
                // Nothing queued; the rest of the buffer plays silence.
                Err(_) => break,
            }
        }
        while filled < data.len() {
            match pending.pop_front() {
                Some(sample) => {
                    data[filled] = sample;
                    filled += 1;
                }
                None => break,
            }
        }
    }
    for sample in &mut data[filled..] {
        *sample = 0;
    }

    if filled > 0 {
        let mut queued = depth.queued.lock().expect("line depth lock poisoned");
        *queued -= filled;
        if *queued == 0 {
            depth.emptied.notify_all();
        }
    }
}
