use crate::{MEASURE_LENGTH_SEC, SAMPLE_RATE};

use once_cell::sync::Lazy;
use std::f64::consts::PI;
use std::fmt;

const WAVEFORM_LEN: usize = SAMPLE_RATE * MEASURE_LENGTH_SEC;
const CONCERT_A_HZ: f64 = 440.0;
const MAX_VOLUME: f64 = 127.0;

/// Every pitch a bell in the ensemble can ring. `Rest` rings silence.
///
/// Frequencies follow 12-tone equal temperament anchored at A4 = 440Hz, one
/// half step per variant in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pitch {
    Rest,
    A4,
    A4s,
    B4,
    C4,
    C4s,
    D4,
    D4s,
    E4,
    F4,
    F4s,
    G4,
    G4s,
    A5,
}

impl Pitch {
    pub const ALL: [Pitch; 14] = [
        Pitch::Rest,
        Pitch::A4,
        Pitch::A4s,
        Pitch::B4,
        Pitch::C4,
        Pitch::C4s,
        Pitch::D4,
        Pitch::D4s,
        Pitch::E4,
        Pitch::F4,
        Pitch::F4s,
        Pitch::G4,
        Pitch::G4s,
        Pitch::A5,
    ];

    pub(crate) fn ordinal(self) -> usize {
        self as usize
    }

    /// None for `Rest`; otherwise 440 * 2^(half steps above A4 / 12).
    pub fn frequency_hz(self) -> Option<f64> {
        match self.ordinal() {
            0 => None,
            n => {
                let half_steps_up_from_a = (n - 1) as f64;
                Some(CONCERT_A_HZ * 2.0f64.powf(half_steps_up_from_a / 12.0))
            }
        }
    }

    /// Looks up a song-file token. The token set is closed; anything else is None.
    pub fn from_token(token: &str) -> Option<Pitch> {
        match token {
            "REST" => Some(Pitch::Rest),
            "A4" => Some(Pitch::A4),
            "A4S" => Some(Pitch::A4s),
            "B4" => Some(Pitch::B4),
            "C4" => Some(Pitch::C4),
            "C4S" => Some(Pitch::C4s),
            "D4" => Some(Pitch::D4),
            "D4S" => Some(Pitch::D4s),
            "E4" => Some(Pitch::E4),
            "F4" => Some(Pitch::F4),
            "F4S" => Some(Pitch::F4s),
            "G4" => Some(Pitch::G4),
            "G4S" => Some(Pitch::G4s),
            "A5" => Some(Pitch::A5),
            _ => None,
        }
    }

    /// One measure of signed 8-bit PCM at this pitch's frequency, synthesized
    /// once for the process lifetime. All pitches share the same length.
    pub fn waveform(self) -> &'static [i8] {
        &WAVEFORMS[self.ordinal()]
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Pitch::Rest => "REST",
            Pitch::A4 => "A4",
            Pitch::A4s => "A4S",
            Pitch::B4 => "B4",
            Pitch::C4 => "C4",
            Pitch::C4s => "C4S",
            Pitch::D4 => "D4",
            Pitch::D4s => "D4S",
            Pitch::E4 => "E4",
            Pitch::F4 => "F4",
            Pitch::F4s => "F4S",
            Pitch::G4 => "G4",
            Pitch::G4s => "G4S",
            Pitch::A5 => "A5",
        };
        f.write_str(token)
    }
}

static WAVEFORMS: Lazy<[Box<[i8]>; 14]> = Lazy::new(|| Pitch::ALL.map(synthesize));

fn synthesize(pitch: Pitch) -> Box<[i8]> {
    let mut samples = vec![0i8; WAVEFORM_LEN];
    if let Some(freq) = pitch.frequency_hz() {
        // Radians advanced per sample.
        let sin_step = freq * 2.0 * PI / SAMPLE_RATE as f64;
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample = ((i as f64 * sin_step).sin() * MAX_VOLUME).round() as i8;
        }
    }
    samples.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_waveforms_are_one_measure_long() {
        for pitch in Pitch::ALL {
            assert_eq!(pitch.waveform().len(), SAMPLE_RATE * MEASURE_LENGTH_SEC);
        }
    }

    #[test]
    fn rest_waveform_is_silent() {
        assert!(Pitch::Rest.waveform().iter().all(|&s| s == 0));
    }

    #[test]
    fn waveforms_are_cached() {
        for pitch in Pitch::ALL {
            assert!(std::ptr::eq(pitch.waveform(), pitch.waveform()));
        }
    }

    #[test]
    fn frequencies_follow_equal_temperament() {
        assert_eq!(Pitch::Rest.frequency_hz(), None);
        assert_eq!(Pitch::A4.frequency_hz(), Some(440.0));
        let a5 = Pitch::A5.frequency_hz().unwrap();
        assert!((a5 - 880.0).abs() < 1e-9);

        let half_step = 2.0f64.powf(1.0 / 12.0);
        let mut expected = 440.0;
        for pitch in &Pitch::ALL[1..] {
            let freq = pitch.frequency_hz().unwrap();
            assert!((freq - expected).abs() < 1e-6, "{} at {}Hz", pitch, freq);
            expected *= half_step;
        }
    }

    #[test]
    fn waveforms_start_at_zero_crossing_and_reach_full_volume() {
        for pitch in &Pitch::ALL[1..] {
            let waveform = pitch.waveform();
            assert_eq!(waveform[0], 0);
            assert!(waveform.iter().any(|&s| s.unsigned_abs() >= 120));
        }
    }

    #[test]
    fn tokens_round_trip() {
        for pitch in Pitch::ALL {
            assert_eq!(Pitch::from_token(&pitch.to_string()), Some(pitch));
        }
        assert_eq!(Pitch::from_token("Z9"), None);
        assert_eq!(Pitch::from_token("a4"), None);
    }
}
