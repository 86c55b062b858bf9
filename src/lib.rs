mod audio_device;
mod ensemble;
mod player;
mod recording;
mod score;
mod server;
mod wave_table;

/// Samples per second for every line the ensemble opens. ~48KHz.
pub const SAMPLE_RATE: usize = 48 * 1024;

/// Length of one measure in seconds. Every note length is a fraction of this,
/// and every waveform holds exactly one measure of samples.
pub const MEASURE_LENGTH_SEC: usize = 1;

/// Samples of silence written after every note, independent of tempo.
const NOTE_GAP_SAMPLES: usize = 50;

pub use audio_device::{AudioOutputLine, LineError, PcmSink};
pub use ensemble::{Ensemble, TeardownError};
pub use player::Player;
pub use recording::Recorder;
pub use score::{parse_song, BellNote, NoteLength, ParseWarning, Song};
pub use server::CarillonServer;
pub use wave_table::Pitch;
