use crate::player::{Player, SinkFactory};
use crate::recording::Recorder;
use crate::score::Song;
use crate::wave_table::Pitch;
use crate::NOTE_GAP_SAMPLES;

use log::info;
use thiserror::Error;

/// A player thread could not be joined cleanly at teardown. This is the one
/// fatal error in the design: it means the process failed to release its
/// playback resources.
#[derive(Debug, Error)]
#[error("player thread {pitch} could not be joined at teardown")]
pub struct TeardownError {
    pitch: Pitch,
}

/// The full set of per-pitch players, assembled together and retired together.
///
/// Every player exists for the whole run and outlives individual notes. The
/// drive loop in `play_song` is single threaded, which is what guarantees
/// that playback order equals song order.
pub struct Ensemble {
    // Indexed by pitch ordinal.
    players: Vec<Player>,
}

impl Ensemble {
    /// Starts one player per pitch. Every player has announced readiness by
    /// the time this returns.
    pub fn assemble() -> Ensemble {
        let players = Pitch::ALL.iter().map(|&pitch| Player::start(pitch)).collect();
        Ensemble { players }
    }

    pub(crate) fn assemble_with<F>(mut open_line_for: F) -> Ensemble
    where
        F: FnMut(Pitch) -> SinkFactory,
    {
        let players = Pitch::ALL
            .iter()
            .map(|&pitch| Player::start_with(pitch, open_line_for(pitch)))
            .collect();
        Ensemble { players }
    }

    fn player(&self, pitch: Pitch) -> &Player {
        &self.players[pitch.ordinal()]
    }

    /// Plays the song front to back, one blocking note at a time. Note N+1
    /// never starts before note N has drained. When a recorder is given, it
    /// receives the same samples the players write.
    pub fn play_song(&self, song: &Song, recorder: Option<&Recorder>) {
        for note in song {
            info!("{} is playing now", note.pitch);
            self.player(note.pitch).play(note.length);
            if let Some(recorder) = recorder {
                recorder.append(&note.pitch.waveform()[..note.length.sample_count()]);
                recorder.append(&Pitch::Rest.waveform()[..NOTE_GAP_SAMPLES]);
            }
        }
    }

    /// Signals every player to finish and joins every thread. A player that
    /// cannot be joined is escalated rather than abandoned.
    pub fn retire(self) -> Result<(), TeardownError> {
        for player in self.players {
            let pitch = player.pitch();
            player.retire().map_err(|_| TeardownError { pitch })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_device::{LineError, PcmSink};
    use crate::score::{BellNote, NoteLength};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq, Eq)]
    enum Event {
        Write { pitch: Pitch, samples: usize },
        Drain { pitch: Pitch },
    }

    /// Sink double appending every call to one shared log. Entries from
    /// overlapping plays would interleave, so a strictly per-note grouped log
    /// also proves sequential playback.
    struct RecordingSink {
        pitch: Pitch,
        log: Arc<Mutex<Vec<Event>>>,
    }

    impl PcmSink for RecordingSink {
        fn write(&mut self, samples: &[i8]) {
            self.log.lock().unwrap().push(Event::Write {
                pitch: self.pitch,
                samples: samples.len(),
            });
        }

        fn drain(&mut self) {
            self.log
                .lock()
                .unwrap()
                .push(Event::Drain { pitch: self.pitch });
        }
    }

    fn recording_ensemble(log: &Arc<Mutex<Vec<Event>>>) -> Ensemble {
        Ensemble::assemble_with(|pitch| {
            let log = log.clone();
            Box::new(move || {
                Ok(Box::new(RecordingSink {
                    pitch,
                    log: log.clone(),
                }) as Box<dyn PcmSink>)
            })
        })
    }

    fn note(pitch: Pitch, length: NoteLength) -> BellNote {
        BellNote { pitch, length }
    }

    fn expected_note_events(pitch: Pitch, length: NoteLength) -> [Event; 3] {
        [
            Event::Write {
                pitch,
                samples: length.sample_count(),
            },
            Event::Write {
                pitch,
                samples: NOTE_GAP_SAMPLES,
            },
            Event::Drain { pitch },
        ]
    }

    #[test]
    fn assembles_one_player_per_pitch() {
        let ensemble = recording_ensemble(&Arc::new(Mutex::new(Vec::new())));
        assert_eq!(ensemble.players.len(), Pitch::ALL.len());
        for (player, pitch) in ensemble.players.iter().zip(Pitch::ALL) {
            assert_eq!(player.pitch(), pitch);
        }
        ensemble.retire().unwrap();
    }

    #[test]
    fn plays_notes_sequentially_in_song_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ensemble = recording_ensemble(&log);
        let song = vec![
            note(Pitch::A4, NoteLength::Quarter),
            note(Pitch::Rest, NoteLength::Whole),
            note(Pitch::C4s, NoteLength::Eighth),
            note(Pitch::A4, NoteLength::Half),
        ];

        ensemble.play_song(&song, None);
        ensemble.retire().unwrap();

        let mut expected = Vec::new();
        for n in &song {
            expected.extend(expected_note_events(n.pitch, n.length));
        }
        assert_eq!(*log.lock().unwrap(), expected);
    }

    #[test]
    fn unavailable_line_skips_the_note_and_keeps_playing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ensemble = Ensemble::assemble_with(|pitch| {
            let log = log.clone();
            if pitch == Pitch::B4 {
                Box::new(|| Err(LineError::NoDevice))
            } else {
                Box::new(move || {
                    Ok(Box::new(RecordingSink {
                        pitch,
                        log: log.clone(),
                    }) as Box<dyn PcmSink>)
                })
            }
        });
        let song = vec![
            note(Pitch::B4, NoteLength::Whole),
            note(Pitch::E4, NoteLength::Quarter),
        ];

        ensemble.play_song(&song, None);
        ensemble.retire().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            expected_note_events(Pitch::E4, NoteLength::Quarter)
        );
    }

    #[test]
    fn empty_song_plays_nothing_and_retires_cleanly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ensemble = recording_ensemble(&log);
        ensemble.play_song(&Song::new(), None);
        ensemble.retire().unwrap();
        assert!(log.lock().unwrap().is_empty());
    }
}
