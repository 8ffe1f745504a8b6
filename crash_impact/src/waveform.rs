//! Acceleration waveform synthesis for a single crash event.
//!
//! A waveform is 100 samples at 10 ms spacing (0..=990 ms) shaped in five
//! phases: pre-impact noise, rise, peak, decay and a settling oscillation.
//! Amplitudes are randomized, so the realized maximum only approximates the
//! requested peak; use [`realized_peak`] when the true maximum matters.

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SAMPLE_COUNT: usize = 100;
pub const SAMPLE_INTERVAL_MS: u32 = 10;

const BASELINE_G: f64 = 15.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WaveformSample {
    /// Milliseconds since the start of the recording.
    pub time: u32,
    /// Acceleration in g, never negative.
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    PreImpact,
    Rise,
    Peak,
    Decay,
    Settle,
}

impl Phase {
    pub fn of(index: usize) -> Self {
        match index {
            0..=19 => Phase::PreImpact,
            20..=29 => Phase::Rise,
            30..=39 => Phase::Peak,
            40..=59 => Phase::Decay,
            _ => Phase::Settle,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::PreImpact => "pre-impact",
            Phase::Rise => "rise",
            Phase::Peak => "peak",
            Phase::Decay => "decay",
            Phase::Settle => "settle",
        }
    }
}

/// Synthesize the acceleration curve for an impact peaking near `peak_g`.
pub fn synthesize_waveform<R: Rng + ?Sized>(rng: &mut R, peak_g: f64) -> Vec<WaveformSample> {
    (0..SAMPLE_COUNT)
        .map(|index| WaveformSample {
            time: index as u32 * SAMPLE_INTERVAL_MS,
            value: sample_value(&mut *rng, index, peak_g).max(0.0),
        })
        .collect()
}

fn sample_value<R: Rng + ?Sized>(rng: &mut R, index: usize, peak_g: f64) -> f64 {
    let i = index as f64;
    match Phase::of(index) {
        Phase::PreImpact => jitter(rng, 5, 15),
        Phase::Rise => {
            let factor = (i - 20.0) / 10.0;
            BASELINE_G + factor * peak_g * 0.7 + jitter(rng, -5, 5)
        }
        Phase::Peak => {
            let scale = 0.8 + rng.gen::<f64>() * 0.4;
            peak_g * scale + jitter(rng, -10, 10)
        }
        Phase::Decay => {
            let factor = 1.0 - (i - 40.0) / 20.0;
            peak_g * factor * 0.8 + jitter(rng, -5, 5)
        }
        Phase::Settle => BASELINE_G + (i * 0.2).sin() * 10.0 + jitter(rng, -3, 3),
    }
}

/// Integer draw in `low..=high` plus a sub-unit fraction, i.e. `[low, high + 1)`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, low: i32, high: i32) -> f64 {
    f64::from(rng.gen_range(low..=high)) + rng.gen::<f64>()
}

/// The highest sample; the first one wins on ties.
pub fn realized_peak(samples: &[WaveformSample]) -> Option<WaveformSample> {
    samples
        .iter()
        .copied()
        .rev()
        .max_by_key(|sample| OrderedFloat(sample.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shape_and_timebase() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = synthesize_waveform(&mut rng, 80.0);
        assert_eq!(samples.len(), SAMPLE_COUNT);
        assert_eq!(samples[0].time, 0);
        assert_eq!(samples[SAMPLE_COUNT - 1].time, 990);
        assert!(samples.windows(2).all(|w| w[1].time - w[0].time == 10));
    }

    #[test]
    fn test_phase_ranges() {
        let mut rng = StdRng::seed_from_u64(21);
        let peak = 100.0;
        let samples = synthesize_waveform(&mut rng, peak);
        for (index, sample) in samples.iter().enumerate() {
            let v = sample.value;
            match Phase::of(index) {
                Phase::PreImpact => assert!((5.0..16.0).contains(&v), "pre {index}: {v}"),
                Phase::Peak => assert!((70.0..131.0).contains(&v), "peak {index}: {v}"),
                Phase::Settle => assert!((2.0..29.0).contains(&v), "settle {index}: {v}"),
                _ => assert!(v >= 0.0),
            }
        }
    }

    #[test]
    fn test_peak_phase_dominates() {
        let mut rng = StdRng::seed_from_u64(99);
        let samples = synthesize_waveform(&mut rng, 120.0);
        let peak = realized_peak(&samples).unwrap();
        assert_eq!(Phase::of((peak.time / SAMPLE_INTERVAL_MS) as usize), Phase::Peak);
    }

    #[test]
    fn test_zero_peak_stays_non_negative() {
        let mut rng = StdRng::seed_from_u64(1);
        let samples = synthesize_waveform(&mut rng, 0.0);
        assert!(samples.iter().all(|s| s.value >= 0.0));
    }

    #[test]
    fn test_realized_peak_prefers_first_on_ties() {
        let samples = vec![
            WaveformSample { time: 0, value: 1.0 },
            WaveformSample { time: 10, value: 4.0 },
            WaveformSample { time: 20, value: 4.0 },
        ];
        assert_eq!(realized_peak(&samples).unwrap().time, 10);
        assert!(realized_peak(&[]).is_none());
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(Phase::of(19), Phase::PreImpact);
        assert_eq!(Phase::of(20), Phase::Rise);
        assert_eq!(Phase::of(30), Phase::Peak);
        assert_eq!(Phase::of(40), Phase::Decay);
        assert_eq!(Phase::of(59), Phase::Decay);
        assert_eq!(Phase::of(60), Phase::Settle);
        assert_eq!(Phase::of(99).label(), "settle");
    }

    proptest! {
        #[test]
        fn prop_values_never_negative(seed in any::<u64>(), peak in 0.0f64..200.0) {
            let mut rng = StdRng::seed_from_u64(seed);
            let samples = synthesize_waveform(&mut rng, peak);
            prop_assert_eq!(samples.len(), SAMPLE_COUNT);
            prop_assert!(samples.iter().all(|s| s.value >= 0.0));
            prop_assert!(samples.windows(2).all(|w| w[0].time < w[1].time));
        }
    }
}
