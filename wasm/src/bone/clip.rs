use glam::{Quat, Vec3};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

// ============================================================================
// Animation Clips
// ============================================================================

/// Separator between the bone segment and the channel of a track name
pub const TRACK_PATH_SEPARATOR: char = '.';

/// Transform channel driven by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Position,
    Quaternion,
    Scale,
}

impl Channel {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "position" => Some(Channel::Position),
            "quaternion" => Some(Channel::Quaternion),
            "scale" => Some(Channel::Scale),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Channel::Position => "position",
            Channel::Quaternion => "quaternion",
            Channel::Scale => "scale",
        }
    }

    /// Number of floats per keyframe value
    pub const fn stride(self) -> usize {
        match self {
            Channel::Position | Channel::Scale => 3,
            Channel::Quaternion => 4,
        }
    }
}

/// Keyframe values, one per entry in `Track::times`
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Vec3(Vec<Vec3>),
    Quat(Vec<Quat>),
}

/// A single sampled channel value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampledValue {
    Vec3(Vec3),
    Quat(Quat),
}

/// Per-bone keyframe track addressed as `"<bone>.<channel>"`
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub channel: Channel,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl Track {
    /// Bone segment of the track name (everything before the first separator)
    pub fn bone_name(&self) -> &str {
        bone_segment(&self.name)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample at `time`. Holds the first/last key outside the keyed range.
    pub fn sample(&self, time: f32) -> Option<SampledValue> {
        if self.times.is_empty() {
            return None;
        }

        let next_idx = self.times.partition_point(|&t| t <= time);
        let (prev, next, t) = if next_idx == 0 {
            (0, 0, 0.0)
        } else if next_idx >= self.times.len() {
            let last = self.times.len() - 1;
            (last, last, 0.0)
        } else {
            let prev = next_idx - 1;
            let segment = self.times[next_idx] - self.times[prev];
            let t = if segment > 0.0 {
                (time - self.times[prev]) / segment
            } else {
                0.0
            };
            (prev, next_idx, t)
        };

        Some(match &self.values {
            TrackValues::Vec3(v) => SampledValue::Vec3(v[prev].lerp(v[next], t)),
            TrackValues::Quat(q) => SampledValue::Quat(q[prev].slerp(q[next], t)),
        })
    }
}

/// Split off the bone segment of a track path
pub fn bone_segment(path: &str) -> &str {
    path.split_once(TRACK_PATH_SEPARATOR)
        .map_or(path, |(bone, _)| bone)
}

/// Motion clip: ordered per-bone tracks
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

/// JSON format for a track, values flattened by channel stride
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackJson {
    pub name: String,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

/// JSON format for an animation clip
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnimationClipJson {
    pub name: String,
    /// Derived from the last keyframe when absent
    #[serde(default)]
    pub duration: Option<f32>,
    pub tracks: Vec<TrackJson>,
}

impl TrackJson {
    fn into_track(self) -> Result<Track, serde_json::Error> {
        let suffix = self
            .name
            .rsplit_once(TRACK_PATH_SEPARATOR)
            .map(|(_, channel)| channel)
            .unwrap_or_default();
        let channel = Channel::parse(suffix).ok_or_else(|| {
            serde_json::Error::custom(format!("track '{}' has no known channel", self.name))
        })?;

        if self.times.windows(2).any(|w| w[1] < w[0]) {
            return Err(serde_json::Error::custom(format!(
                "track '{}' keyframe times are not sorted",
                self.name
            )));
        }

        let stride = channel.stride();
        if self.values.len() != self.times.len() * stride {
            return Err(serde_json::Error::custom(format!(
                "track '{}' expects {} values, got {}",
                self.name,
                self.times.len() * stride,
                self.values.len()
            )));
        }

        let values = match channel {
            Channel::Quaternion => TrackValues::Quat(
                self.values
                    .chunks_exact(4)
                    .map(|c| Quat::from_xyzw(c[0], c[1], c[2], c[3]).normalize())
                    .collect(),
            ),
            Channel::Position | Channel::Scale => TrackValues::Vec3(
                self.values
                    .chunks_exact(3)
                    .map(|c| Vec3::new(c[0], c[1], c[2]))
                    .collect(),
            ),
        };

        Ok(Track {
            name: self.name,
            channel,
            times: self.times,
            values,
        })
    }
}

impl AnimationClip {
    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let clip_json: AnimationClipJson = serde_json::from_str(json)?;
        Self::from_clip_json(clip_json)
    }

    pub fn from_clip_json(clip_json: AnimationClipJson) -> Result<Self, serde_json::Error> {
        let tracks = clip_json
            .tracks
            .into_iter()
            .map(TrackJson::into_track)
            .collect::<Result<Vec<_>, _>>()?;

        let duration = clip_json.duration.unwrap_or_else(|| {
            tracks
                .iter()
                .filter_map(|t| t.times.last().copied())
                .fold(0.0, f32::max)
        });

        Ok(Self {
            name: clip_json.name,
            duration,
            tracks,
        })
    }

    /// Wrap a play-head time into the clip's duration (repeat looping)
    pub fn looped_time(&self, time: f32) -> f32 {
        if self.duration > 0.0 {
            time.rem_euclid(self.duration)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hips_clip_json() -> &'static str {
        r#"{
            "name": "mixamo.com",
            "tracks": [
                { "name": "mixamorig:Hips.position",
                  "times": [0.0, 1.0],
                  "values": [0, 0, 0, 0, 2, 0] },
                { "name": "mixamorig:Hips.quaternion",
                  "times": [0.0, 1.0],
                  "values": [0, 0, 0, 1, 0, 0.7071068, 0, 0.7071068] }
            ]
        }"#
    }

    #[test]
    fn test_clip_parsing() {
        let clip = AnimationClip::from_json(hips_clip_json()).unwrap();
        assert_eq!(clip.tracks.len(), 2);
        assert_eq!(clip.duration, 1.0);
        assert_eq!(clip.tracks[0].channel, Channel::Position);
        assert_eq!(clip.tracks[1].channel, Channel::Quaternion);
        assert_eq!(clip.tracks[1].bone_name(), "mixamorig:Hips");
    }

    #[test]
    fn test_track_interpolation() {
        let clip = AnimationClip::from_json(hips_clip_json()).unwrap();

        match clip.tracks[0].sample(0.5) {
            Some(SampledValue::Vec3(v)) => assert!((v.y - 1.0).abs() < 1e-5, "got {}", v.y),
            other => panic!("unexpected sample {:?}", other),
        }

        match clip.tracks[1].sample(0.5) {
            Some(SampledValue::Quat(q)) => {
                let (_, angle) = q.to_axis_angle();
                let expected = std::f32::consts::FRAC_PI_4;
                assert!((angle - expected).abs() < 1e-3, "got {}", angle.to_degrees());
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_sample_holds_outside_keyed_range() {
        let clip = AnimationClip::from_json(hips_clip_json()).unwrap();
        assert_eq!(
            clip.tracks[0].sample(-1.0),
            Some(SampledValue::Vec3(Vec3::ZERO))
        );
        assert_eq!(
            clip.tracks[0].sample(5.0),
            Some(SampledValue::Vec3(Vec3::new(0.0, 2.0, 0.0)))
        );
    }

    #[test]
    fn test_bad_value_count_rejected() {
        let json = r#"{ "name": "x", "tracks": [
            { "name": "Hips.quaternion", "times": [0.0], "values": [0, 0, 1] }
        ] }"#;
        assert!(AnimationClip::from_json(json).is_err());
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let json = r#"{ "name": "x", "tracks": [
            { "name": "Hips.morphTargetInfluences", "times": [0.0], "values": [0] }
        ] }"#;
        assert!(AnimationClip::from_json(json).is_err());
    }

    #[test]
    fn test_bone_segment_uses_first_separator() {
        assert_eq!(bone_segment("Hips.quaternion"), "Hips");
        assert_eq!(bone_segment("Armature.Hips.position"), "Armature");
        assert_eq!(bone_segment("NoChannel"), "NoChannel");
    }

    #[test]
    fn test_looped_time() {
        let clip = AnimationClip {
            name: "loop".to_string(),
            duration: 2.0,
            tracks: Vec::new(),
        };
        assert!((clip.looped_time(5.0) - 1.0).abs() < 1e-6);
        assert_eq!(clip.looped_time(-0.5), 1.5);
    }
}
