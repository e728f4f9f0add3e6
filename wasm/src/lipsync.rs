//! Oscillator-driven mouth morphs.

use crate::config::LipSyncConfig;
use crate::scene::MorphTargets;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Apply `f` to an influence slot, if the morph was resolved
fn with_slot(influences: &mut [f32], index: Option<usize>, f: impl FnOnce(f32) -> f32) {
    let Some(index) = index else {
        return;
    };
    if let Some(slot) = influences.get_mut(index) {
        *slot = f(*slot);
    }
}

/// Drives mouth-open and mouth-smile influences of the head mesh.
///
/// While speaking, mouth-open follows `(sin(t) + 1) / 2 * amplitude` and the
/// smile holds a constant level. When silent both relax toward zero by one
/// lerp step per frame. The phase is never reset, so resumed speech picks up
/// where the oscillator left off.
#[derive(Debug, Clone, PartialEq)]
pub struct LipSyncDriver {
    phase: f32,
    mouth_open: Option<usize>,
    mouth_smile: Option<usize>,
    tuning: LipSyncConfig,
}

impl LipSyncDriver {
    /// Resolve the mouth morph slots on a mesh. Missing morphs are logged and
    /// that channel stays idle.
    pub fn bind(
        morphs: &MorphTargets,
        mouth_open: &str,
        mouth_smile: &str,
        tuning: LipSyncConfig,
    ) -> Self {
        let resolve = |name: &str| {
            let index = morphs.index_of(name);
            if index.is_none() {
                log::warn!("Morph target '{}' not found; lip sync skips it", name);
            }
            index
        };

        Self {
            phase: 0.0,
            mouth_open: resolve(mouth_open),
            mouth_smile: resolve(mouth_smile),
            tuning,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// True when at least one mouth morph was found
    pub fn is_bound(&self) -> bool {
        self.mouth_open.is_some() || self.mouth_smile.is_some()
    }

    /// Advance one frame of `delta` seconds
    pub fn update(&mut self, morphs: &mut MorphTargets, speaking: bool, delta: f32) {
        let influences = morphs.influences.as_mut_slice();

        if speaking {
            self.phase += delta * self.tuning.phase_rate;
            let open = (self.phase.sin() + 1.0) / 2.0 * self.tuning.open_amplitude;
            let smile = self.tuning.smile_level;
            with_slot(influences, self.mouth_open, |_| open);
            with_slot(influences, self.mouth_smile, |_| smile);
        } else {
            let decay = self.tuning.decay;
            with_slot(influences, self.mouth_open, |x| lerp(x, 0.0, decay));
            with_slot(influences, self.mouth_smile, |x| lerp(x, 0.0, decay));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::collections::HashMap;

    fn face() -> MorphTargets {
        let dictionary = HashMap::from([
            ("mouthOpen".to_string(), 0),
            ("mouthSmile".to_string(), 1),
            ("eyeBlinkLeft".to_string(), 2),
        ]);
        MorphTargets::new(dictionary, vec![0.0; 3])
    }

    fn driver(morphs: &MorphTargets) -> LipSyncDriver {
        LipSyncDriver::bind(morphs, "mouthOpen", "mouthSmile", LipSyncConfig::default())
    }

    #[test]
    fn test_speaking_drives_mouth() {
        let mut morphs = face();
        let mut lips = driver(&morphs);

        lips.update(&mut morphs, true, 0.1);
        let expected = (1.0f32.sin() + 1.0) / 2.0 * 0.6;
        assert!((morphs.influence("mouthOpen").unwrap() - expected).abs() < 1e-6);
        assert_eq!(morphs.influence("mouthSmile"), Some(0.2));
        assert_eq!(morphs.influence("eyeBlinkLeft"), Some(0.0));
    }

    #[test]
    fn test_mouth_open_stays_in_range() {
        let mut morphs = face();
        let mut lips = driver(&morphs);
        let mut rng = rand::rng();

        for _ in 0..1000 {
            lips.update(&mut morphs, true, rng.random_range(0.0..0.1));
            let open = morphs.influence("mouthOpen").unwrap();
            assert!((0.0..=0.6 + 1e-6).contains(&open), "out of range: {}", open);
        }
    }

    #[test]
    fn test_silence_decays_toward_zero() {
        let mut morphs = face();
        let mut lips = driver(&morphs);
        morphs.set_influence("mouthOpen", 0.6);
        morphs.set_influence("mouthSmile", 0.2);

        lips.update(&mut morphs, false, 0.016);
        let open = morphs.influence("mouthOpen").unwrap();
        assert!((open - 0.48).abs() < 1e-6, "one step of 0.2 decay, got {}", open);

        for _ in 0..100 {
            lips.update(&mut morphs, false, 0.016);
        }
        assert!(morphs.influence("mouthOpen").unwrap() < 1e-6);
        assert!(morphs.influence("mouthSmile").unwrap() < 1e-6);
    }

    #[test]
    fn test_phase_survives_silence() {
        let mut morphs = face();
        let mut lips = driver(&morphs);

        lips.update(&mut morphs, true, 0.2);
        let phase = lips.phase();
        lips.update(&mut morphs, false, 0.2);
        assert_eq!(lips.phase(), phase);

        lips.update(&mut morphs, true, 0.1);
        assert!((lips.phase() - (phase + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_morphs_are_skipped() {
        let mut morphs = MorphTargets::new(
            HashMap::from([("mouthSmile".to_string(), 0)]),
            vec![0.0],
        );
        let mut lips = LipSyncDriver::bind(
            &morphs,
            "mouthOpen",
            "mouthSmile",
            LipSyncConfig::default(),
        );
        assert!(lips.is_bound());

        lips.update(&mut morphs, true, 0.1);
        assert_eq!(morphs.influences, vec![0.2]);
    }
}
