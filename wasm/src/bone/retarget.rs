use super::clip::AnimationClip;
use super::index::BoneIndex;
use super::matcher::BoneCorrespondence;
use crate::scene::SceneGraph;
use serde::Serialize;

/// Outcome of retargeting one clip, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetargetReport {
    pub renamed_bones: usize,
    pub rewritten_tracks: usize,
    /// Tracks left addressing a bone the character does not have
    pub inert_tracks: usize,
}

/// Rewrite a clip so it addresses the character's bones.
///
/// First renames every mapped bone of the clip's own skeleton to its target
/// name, then rewrites the bone segment of each mapped track name, keeping
/// the channel suffix. Tracks with unmapped bones keep their names and end up
/// driving nothing. The track count never changes.
///
/// A clip and its skeleton are meant to be retargeted exactly once.
pub fn retarget(
    clip: &mut AnimationClip,
    source_skeleton: &mut SceneGraph,
    source_index: &BoneIndex,
    map: &BoneCorrespondence,
) -> RetargetReport {
    let mut report = RetargetReport::default();

    for (source_name, target_name) in map.iter() {
        if let Some(node) = source_index.get(source_name) {
            source_skeleton.node_mut(node).name = target_name.to_string();
            report.renamed_bones += 1;
        }
    }

    for track in &mut clip.tracks {
        let bone = track.bone_name();
        match map.get(bone) {
            Some(target) => {
                let channel = &track.name[bone.len()..];
                track.name = format!("{}{}", target, channel);
                report.rewritten_tracks += 1;
            }
            None => report.inert_tracks += 1,
        }
    }

    log::debug!(
        "Retargeted clip '{}': {} tracks rewritten, {} inert",
        clip.name,
        report.rewritten_tracks,
        report.inert_tracks
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::clip::{Channel, Track, TrackValues};
    use crate::bone::{build_bone_index, match_bones};
    use crate::scene::NodeKind;
    use glam::Quat;

    fn track(name: &str) -> Track {
        Track {
            name: name.to_string(),
            channel: Channel::Quaternion,
            times: vec![0.0],
            values: TrackValues::Quat(vec![Quat::IDENTITY]),
        }
    }

    fn clip(names: &[&str]) -> AnimationClip {
        AnimationClip {
            name: "mixamo.com".to_string(),
            duration: 1.0,
            tracks: names.iter().map(|n| track(n)).collect(),
        }
    }

    #[test]
    fn test_track_bone_segment_rewritten() {
        let mut skeleton = SceneGraph::new("mixamo");
        skeleton.add_node(skeleton.root(), "mixamorig:Hips", NodeKind::Bone);
        let source = build_bone_index(&skeleton, skeleton.root());
        let map: BoneCorrespondence = [("mixamorig:Hips", "Hips")].into_iter().collect();

        let mut clip = clip(&["mixamorig:Hips.quaternion"]);
        let report = retarget(&mut clip, &mut skeleton, &source, &map);

        assert_eq!(clip.tracks[0].name, "Hips.quaternion");
        assert_eq!(report.rewritten_tracks, 1);
        assert_eq!(report.inert_tracks, 0);
    }

    #[test]
    fn test_source_skeleton_bones_renamed() {
        let mut skeleton = SceneGraph::new("mixamo");
        let hips = skeleton.add_node(skeleton.root(), "mixamorig:Hips", NodeKind::Bone);
        let tail = skeleton.add_node(hips, "mixamorig:Tail", NodeKind::Bone);
        let source = build_bone_index(&skeleton, skeleton.root());
        let map: BoneCorrespondence = [("mixamorig:Hips", "Hips")].into_iter().collect();

        let mut clip = clip(&[]);
        let report = retarget(&mut clip, &mut skeleton, &source, &map);

        assert_eq!(skeleton.node(hips).name, "Hips");
        assert_eq!(skeleton.node(tail).name, "mixamorig:Tail");
        assert_eq!(report.renamed_bones, 1);
    }

    #[test]
    fn test_track_count_preserved_and_unmapped_left_dangling() {
        let mut skeleton = SceneGraph::new("mixamo");
        for name in ["mixamorig:Hips", "mixamorig:Spine", "mixamorig:Tail"] {
            skeleton.add_node(skeleton.root(), name, NodeKind::Bone);
        }
        let mut character = SceneGraph::new("avatar");
        for name in ["Hips", "Spine"] {
            character.add_node(character.root(), name, NodeKind::Bone);
        }

        let source = build_bone_index(&skeleton, skeleton.root());
        let target = build_bone_index(&character, character.root());
        let map = match_bones(&source, &target);

        let mut clip = clip(&[
            "mixamorig:Hips.position",
            "mixamorig:Spine.quaternion",
            "mixamorig:Tail.quaternion",
        ]);
        let report = retarget(&mut clip, &mut skeleton, &source, &map);

        let names: Vec<&str> = clip.tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["Hips.position", "Spine.quaternion", "mixamorig:Tail.quaternion"]
        );
        assert_eq!(report.inert_tracks, 1);
    }

    #[test]
    fn test_track_without_channel_suffix() {
        let mut skeleton = SceneGraph::new("mixamo");
        skeleton.add_node(skeleton.root(), "mixamorig:Hips", NodeKind::Bone);
        let source = build_bone_index(&skeleton, skeleton.root());
        let map: BoneCorrespondence = [("mixamorig:Hips", "Hips")].into_iter().collect();

        let mut clip = clip(&["mixamorig:Hips"]);
        retarget(&mut clip, &mut skeleton, &source, &map);
        assert_eq!(clip.tracks[0].name, "Hips");
    }
}
