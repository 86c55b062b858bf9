use crate::audio_device::{AudioOutputLine, LineError, PcmSink};
use crate::score::NoteLength;
use crate::wave_table::Pitch;
use crate::NOTE_GAP_SAMPLES;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info};
use std::thread;

/// Opens a fresh sink for one note. The default plays through the device;
/// tests substitute doubles.
pub(crate) type SinkFactory = Box<dyn FnMut() -> Result<Box<dyn PcmSink>, LineError> + Send>;

struct PlayRequest {
    length: NoteLength,
    done_tx: Sender<()>,
}

/// One member of the ensemble: a long-lived thread that rings a single pitch.
///
/// The thread outlives individual notes; it is spawned once at assembly and
/// joined once at retirement. Requests are served strictly one at a time over
/// a rendezvous channel, so at most one note per pitch is ever in flight.
pub struct Player {
    pitch: Pitch,
    request_tx: Sender<PlayRequest>,
    handle: thread::JoinHandle<()>,
}

impl Player {
    pub fn start(pitch: Pitch) -> Player {
        Player::start_with(
            pitch,
            Box::new(|| {
                AudioOutputLine::connect_default().map(|line| Box::new(line) as Box<dyn PcmSink>)
            }),
        )
    }

    pub(crate) fn start_with(pitch: Pitch, open_line: SinkFactory) -> Player {
        let (request_tx, request_rx) = bounded(0);
        let (ready_tx, ready_rx) = bounded(0);
        let handle = thread::Builder::new()
            .name(pitch.to_string())
            .spawn(move || player_loop(pitch, request_rx, ready_tx, open_line))
            .expect("Failed to spawn player thread");

        // The player accepts requests as soon as it announces itself.
        ready_rx
            .recv()
            .expect("Player thread exited before reporting ready");

        Player {
            pitch,
            request_tx,
            handle,
        }
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Rings this player's bell for `length`, returning only after the
    /// device has drained the note and its trailing rest.
    pub fn play(&self, length: NoteLength) {
        let (done_tx, done_rx) = bounded(0);
        self.request_tx
            .send(PlayRequest { length, done_tx })
            .expect("Player thread hung up its request channel");
        done_rx
            .recv()
            .expect("Player thread dropped an in-flight note");
    }

    /// Signals the player's thread to finish and joins it.
    pub(crate) fn retire(self) -> thread::Result<()> {
        drop(self.request_tx);
        self.handle.join()
    }
}

fn player_loop(
    pitch: Pitch,
    request_rx: Receiver<PlayRequest>,
    ready_tx: Sender<()>,
    mut open_line: SinkFactory,
) {
    info!("{} is ready to play", pitch);
    ready_tx
        .send(())
        .expect("Ensemble hung up before player became ready");

    // Runs until the ensemble drops the request sender at retirement.
    while let Ok(request) = request_rx.recv() {
        match open_line() {
            Ok(mut line) => {
                line.write(&pitch.waveform()[..request.length.sample_count()]);
                line.write(&Pitch::Rest.waveform()[..NOTE_GAP_SAMPLES]);
                line.drain();
            }
            // A note with no line is skipped; the song keeps going.
            Err(err) => error!("{}: skipping note, no output line: {}", pitch, err),
        }
        request
            .done_tx
            .send(())
            .expect("Conductor stopped waiting for note completion");
    }
}
