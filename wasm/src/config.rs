//! Avatar configuration.
//!
//! Every field has a default matching the shipped character, so a page can
//! pass a partial JSON document (or nothing at all).

use crate::animation::DEFAULT_FADE_TIME;
use crate::behavior::{AvatarAnimation, ModelPosition};
use crate::scene::Transform;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Lip-sync oscillator and decay tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Phase advance per second of speech
    pub phase_rate: f32,
    /// Peak mouth-open influence
    pub open_amplitude: f32,
    /// Mouth-smile influence held while speaking
    pub smile_level: f32,
    /// Per-frame lerp factor toward zero when silent
    pub decay: f32,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            phase_rate: 10.0,
            open_amplitude: 0.6,
            smile_level: 0.2,
            decay: 0.2,
        }
    }
}

/// Root placement for one framing preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub translation: [f32; 3],
    /// Forward tilt around X, radians
    pub tilt: f32,
    pub scale: f32,
}

impl Placement {
    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: Vec3::from_array(self.translation),
            rotation: Quat::from_rotation_x(self.tilt),
            scale: Vec3::splat(self.scale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementPresets {
    pub near: Placement,
    pub far: Placement,
}

impl Default for PlacementPresets {
    fn default() -> Self {
        Self {
            near: Placement {
                translation: [0.0, -7.8, -1.3],
                tilt: -0.26,
                scale: 4.55,
            },
            far: Placement {
                translation: [0.0, -2.7, -1.3],
                tilt: -0.35,
                scale: 1.7,
            },
        }
    }
}

impl PlacementPresets {
    pub fn for_position(&self, position: ModelPosition) -> &Placement {
        match position {
            ModelPosition::Near => &self.near,
            ModelPosition::Far => &self.far,
        }
    }
}

/// One motion clip the page should load and bind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipEntry {
    pub animation: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Mesh that carries the face morph targets
    pub head_mesh: String,
    pub mouth_open_morph: String,
    pub mouth_smile_morph: String,
    /// Cross-fade time for behavior changes, seconds
    pub default_fade_time: f32,
    pub lip_sync: LipSyncConfig,
    pub placement: PlacementPresets,
    pub clips: Vec<ClipEntry>,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            head_mesh: "Wolf3D_Head".to_string(),
            mouth_open_morph: "mouthOpen".to_string(),
            mouth_smile_morph: "mouthSmile".to_string(),
            default_fade_time: DEFAULT_FADE_TIME,
            lip_sync: LipSyncConfig::default(),
            placement: PlacementPresets::default(),
            clips: AvatarAnimation::ALL
                .iter()
                .map(|anim| ClipEntry {
                    animation: anim.as_str().to_string(),
                    path: format!("/animations/{}FBX.fbx", anim.as_str()),
                })
                .collect(),
        }
    }
}

impl AvatarConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AvatarConfig::default();
        assert_eq!(config.head_mesh, "Wolf3D_Head");
        assert_eq!(config.default_fade_time, 0.3);
        assert_eq!(config.clips.len(), AvatarAnimation::COUNT);
        assert_eq!(config.clips[5].animation, "Idle");
        assert_eq!(config.clips[5].path, "/animations/IdleFBX.fbx");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AvatarConfig::from_json(
            r#"{ "head_mesh": "Head", "lip_sync": { "decay": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.head_mesh, "Head");
        assert_eq!(config.mouth_open_morph, "mouthOpen");
        assert_eq!(config.lip_sync.decay, 0.5);
        assert_eq!(config.lip_sync.phase_rate, 10.0);
    }

    #[test]
    fn test_placement_presets() {
        let presets = PlacementPresets::default();
        let near = presets.for_position(ModelPosition::Near).to_transform();
        assert_eq!(near.scale, Vec3::splat(4.55));
        assert_eq!(near.translation, Vec3::new(0.0, -7.8, -1.3));
        let far = presets.for_position(ModelPosition::Far).to_transform();
        assert_eq!(far.scale, Vec3::splat(1.7));
    }
}
