use crate::ensemble::{Ensemble, TeardownError};
use crate::recording::Recorder;
use crate::score::parse_song;

use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Wires one run together: song file -> parser -> ensemble -> teardown.
pub struct CarillonServer {
    recording_path: Option<PathBuf>,
}

impl CarillonServer {
    pub fn new(recording_path: Option<PathBuf>) -> Self {
        CarillonServer { recording_path }
    }

    /// Plays the song file front to back. Everything short of a failed
    /// teardown is recovered locally: a missing file plays as an empty song,
    /// malformed entries are substituted, device failures skip notes.
    pub fn run(&self, song_path: &Path) -> Result<(), TeardownError> {
        let text = match fs::read_to_string(song_path) {
            Ok(text) => text,
            Err(err) => {
                error!("{} could not be read: {}", song_path.display(), err);
                String::new()
            }
        };

        let (song, warnings) = parse_song(&text);
        for warning in &warnings {
            warn!("{}", warning);
        }
        info!("Loaded {} notes from {}", song.len(), song_path.display());

        let recorder = self.recording_path.as_ref().and_then(|path| {
            match Recorder::create(path) {
                Ok(recorder) => Some(recorder),
                // Recording is an extra; never let it stop the performance.
                Err(err) => {
                    error!("Cannot record to {}: {}", path.display(), err);
                    None
                }
            }
        });

        let ensemble = Ensemble::assemble();
        ensemble.play_song(&song, recorder.as_ref());
        if let Some(recorder) = recorder {
            recorder.close();
        }
        ensemble.retire()
    }
}
