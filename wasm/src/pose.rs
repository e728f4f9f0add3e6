//! Blending of weighted actions into bone transforms.

use crate::animation::AnimationManager;
use crate::bone::{BoneIndex, Channel, SampledValue};
use crate::scene::{NodeId, SceneGraph, Transform};
use glam::{Quat, Vec3};
use std::collections::HashMap;

/// Weighted accumulation of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
struct Accumulated<T> {
    value: T,
    weight: f32,
}

/// Blended channels for one bone
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoneBlend {
    translation: Option<Accumulated<Vec3>>,
    rotation: Option<Accumulated<Quat>>,
    scale: Option<Accumulated<Vec3>>,
}

fn accumulate_vec3(slot: &mut Option<Accumulated<Vec3>>, value: Vec3, weight: f32) {
    match slot {
        None => *slot = Some(Accumulated { value, weight }),
        Some(acc) => {
            let total = acc.weight + weight;
            acc.value = acc.value.lerp(value, weight / total);
            acc.weight = total;
        }
    }
}

fn accumulate_quat(slot: &mut Option<Accumulated<Quat>>, value: Quat, weight: f32) {
    match slot {
        None => *slot = Some(Accumulated { value, weight }),
        Some(acc) => {
            let total = acc.weight + weight;
            acc.value = acc.value.slerp(value, weight / total);
            acc.weight = total;
        }
    }
}

impl BoneBlend {
    fn accumulate(&mut self, channel: Channel, value: SampledValue, weight: f32) {
        match (channel, value) {
            (Channel::Position, SampledValue::Vec3(v)) => {
                accumulate_vec3(&mut self.translation, v, weight)
            }
            (Channel::Scale, SampledValue::Vec3(v)) => accumulate_vec3(&mut self.scale, v, weight),
            (Channel::Quaternion, SampledValue::Quat(q)) => {
                accumulate_quat(&mut self.rotation, q, weight)
            }
            // Parsing guarantees channel and value shape agree
            _ => {}
        }
    }

    /// Mix the blend over a rest transform. Channels with total weight below
    /// one keep the remainder of the rest value.
    pub fn apply_to(&self, rest: &Transform) -> Transform {
        let mut out = *rest;
        if let Some(acc) = self.translation {
            out.translation = rest.translation.lerp(acc.value, acc.weight.min(1.0));
        }
        if let Some(acc) = self.rotation {
            out.rotation = rest.rotation.slerp(acc.value, acc.weight.min(1.0));
        }
        if let Some(acc) = self.scale {
            out.scale = rest.scale.lerp(acc.value, acc.weight.min(1.0));
        }
        out
    }
}

/// Result of sampling every weighted action, keyed by bone name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlendedPose {
    bones: HashMap<String, BoneBlend>,
}

impl BlendedPose {
    pub fn bone(&self, name: &str) -> Option<&BoneBlend> {
        self.bones.get(name)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

impl AnimationManager {
    /// Sample every action with nonzero weight and blend per bone channel,
    /// in binding order
    pub fn evaluate(&self) -> BlendedPose {
        let mut pose = BlendedPose::default();

        for (_, action) in self.actions() {
            let weight = action.effective_weight();
            if weight <= 0.0 {
                continue;
            }
            for track in &action.clip().tracks {
                let Some(value) = track.sample(action.time()) else {
                    continue;
                };
                pose.bones
                    .entry(track.bone_name().to_string())
                    .or_default()
                    .accumulate(track.channel, value, weight);
            }
        }

        pose
    }
}

/// Local transforms of the character's bones before any animation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestPose {
    bones: Vec<(String, NodeId, Transform)>,
}

impl RestPose {
    pub fn capture(scene: &SceneGraph, bones: &BoneIndex) -> Self {
        Self {
            bones: bones
                .iter()
                .map(|(name, id)| (name.to_string(), id, scene.node(id).transform))
                .collect(),
        }
    }

    /// Write a blended pose onto the scene. Bones without contribution return
    /// to rest; blend entries for unknown bones are ignored.
    pub fn apply(&self, scene: &mut SceneGraph, pose: &BlendedPose) {
        for (name, id, rest) in &self.bones {
            scene.node_mut(*id).transform = match pose.bone(name) {
                Some(blend) => blend.apply_to(rest),
                None => *rest,
            };
        }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::{build_bone_index, AnimationClip, Track, TrackValues};
    use crate::scene::NodeKind;

    fn rotation_clip(name: &str, bone: &str, angle: f32) -> AnimationClip {
        AnimationClip {
            name: name.to_string(),
            duration: 1.0,
            tracks: vec![
                Track {
                    name: format!("{}.quaternion", bone),
                    channel: Channel::Quaternion,
                    times: vec![0.0],
                    values: TrackValues::Quat(vec![Quat::from_rotation_y(angle)]),
                },
                Track {
                    name: format!("{}.position", bone),
                    channel: Channel::Position,
                    times: vec![0.0],
                    values: TrackValues::Vec3(vec![Vec3::new(0.0, 2.0, 0.0)]),
                },
            ],
        }
    }

    fn character() -> (SceneGraph, BoneIndex, NodeId) {
        let mut scene = SceneGraph::new("avatar");
        let hips = scene.add_node(scene.root(), "Hips", NodeKind::Bone);
        let bones = build_bone_index(&scene, scene.root());
        (scene, bones, hips)
    }

    #[test]
    fn test_single_full_weight_action_reproduces_keyframe() {
        let (mut scene, bones, hips) = character();
        let rest = RestPose::capture(&scene, &bones);

        let mut manager = AnimationManager::default();
        manager.bind("Idle", rotation_clip("Idle", "Hips", 1.0));
        manager.play("Idle");
        manager.update(1.0);

        rest.apply(&mut scene, &manager.evaluate());
        let transform = scene.node(hips).transform;
        assert!(transform.rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5));
        assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn test_partial_weight_mixes_with_rest() {
        let (mut scene, bones, hips) = character();
        let rest = RestPose::capture(&scene, &bones);

        let mut manager = AnimationManager::default();
        manager.bind("Idle", rotation_clip("Idle", "Hips", 1.0));
        manager.play_with_fade("Idle", 1.0);
        manager.update(0.5);

        rest.apply(&mut scene, &manager.evaluate());
        let y = scene.node(hips).transform.translation.y;
        assert!((y - 1.0).abs() < 1e-4, "expected halfway to 2.0, got {}", y);
    }

    #[test]
    fn test_cross_fade_blends_both_actions() {
        let (mut scene, bones, hips) = character();
        let rest = RestPose::capture(&scene, &bones);

        let mut manager = AnimationManager::default();
        manager.bind("Idle", rotation_clip("Idle", "Hips", 0.0));
        manager.bind("Talking", rotation_clip("Talking", "Hips", 1.0));
        manager.play("Idle");
        manager.update(1.0);
        manager.play_with_fade("Talking", 1.0);
        manager.update(0.5);

        rest.apply(&mut scene, &manager.evaluate());
        let expected = Quat::from_rotation_y(0.5);
        assert!(scene.node(hips).transform.rotation.abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn test_dangling_tracks_are_inert() {
        let (mut scene, bones, hips) = character();
        let rest = RestPose::capture(&scene, &bones);

        let mut manager = AnimationManager::default();
        manager.bind("Idle", rotation_clip("Idle", "mixamorig:Tail", 1.0));
        manager.play_with_fade("Idle", 0.0);
        manager.update(0.1);

        let pose = manager.evaluate();
        assert!(pose.bone("mixamorig:Tail").is_some());
        rest.apply(&mut scene, &pose);
        assert_eq!(scene.node(hips).transform, Transform::IDENTITY);
    }

    #[test]
    fn test_zero_weight_actions_skipped() {
        let mut manager = AnimationManager::default();
        manager.bind("Idle", rotation_clip("Idle", "Hips", 1.0));
        manager.play("Idle");
        // Fade-in not advanced yet: weight is zero
        assert!(manager.evaluate().is_empty());
    }
}
