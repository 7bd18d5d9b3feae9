//! Simulated face-analysis source.
//!
//! There is no real detector behind studytrack. This produces observations
//! with plausible distributions (about 90% of frames find a face, 80% of
//! those look at the screen) so sessions can be exercised end to end.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::analysis::{Emotions, ImageQuality, Observation};
use super::model::{EyeGaze, HeadPose};

/// Random observation generator.
pub struct SimulatedDetector<R: Rng = StdRng> {
    rng: R,
}

impl SimulatedDetector<StdRng> {
    /// A detector seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible detector.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> SimulatedDetector<R> {
    /// Wrap an existing random source.
    pub const fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Produce the next observation.
    pub fn observe(&mut self) -> Observation {
        let rng = &mut self.rng;

        if !rng.gen_bool(0.9) {
            return Observation::no_face();
        }

        Observation {
            face_detected: true,
            confidence: rng.gen_range(0.85..=1.0),
            head_pose: Some(HeadPose {
                pitch: rng.gen_range(-15.0..=15.0),
                yaw: rng.gen_range(-20.0..=20.0),
                roll: rng.gen_range(-10.0..=10.0),
            }),
            eye_gaze: Some(EyeGaze {
                x: rng.gen_range(0.4..=0.6),
                y: rng.gen_range(0.4..=0.6),
                on_screen: rng.gen_bool(0.8),
            }),
            emotions: Some(Emotions {
                neutral: rng.gen_range(0.6..=0.9),
                focused: rng.gen_range(0.1..=0.3),
                tired: rng.gen_range(0.0..=0.15),
                distracted: rng.gen_range(0.0..=0.1),
            }),
            quality: Some(ImageQuality {
                brightness: rng.gen_range(0.6..=0.9),
                sharpness: rng.gen_range(0.7..=0.9),
                angle: rng.gen_range(0.0..=30.0),
            }),
            blink_rate: rng.gen_range(15.0..=25.0),
        }
    }
}

impl<R: Rng> Iterator for SimulatedDetector<R> {
    type Item = Observation;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.observe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::activity::analysis::Analyzer;

    #[test]
    fn test_seeded_detector_is_reproducible() {
        let a: Vec<_> = SimulatedDetector::seeded(7).take(20).collect();
        let b: Vec<_> = SimulatedDetector::seeded(7).take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_observations_within_ranges() {
        for obs in SimulatedDetector::seeded(42).take(200) {
            if !obs.face_detected {
                assert!(obs.head_pose.is_none());
                continue;
            }
            let pose = obs.head_pose.unwrap();
            assert!(pose.pitch.abs() <= 15.0);
            assert!(pose.yaw.abs() <= 20.0);
            assert!((0.85..=1.0).contains(&obs.confidence));
        }
    }

    #[test]
    fn test_mostly_detects_a_face() {
        let detected = SimulatedDetector::seeded(1)
            .take(1000)
            .filter(|o| o.face_detected)
            .count();
        assert!(detected > 800, "detected only {detected} of 1000");
    }

    #[test]
    fn test_simulated_metrics_are_valid_samples() {
        let analyzer = Analyzer::default();
        for obs in SimulatedDetector::seeded(3).take(100) {
            let analysis = analyzer.analyze(&obs, 30);
            assert!(analysis.metrics.sample().validate().is_ok());
        }
    }
}
