use super::index::BoneIndex;
use super::normalize::normalize;
use std::collections::HashMap;

/// Source bone name to target bone name, in source order.
///
/// Keys are always source-index names and values always target-index names.
/// Sources without an acceptable match are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneCorrespondence {
    pairs: Vec<(String, String)>,
    lookup: HashMap<String, usize>,
}

impl BoneCorrespondence {
    fn insert(&mut self, source: &str, target: &str) {
        match self.lookup.get(source) {
            Some(&pos) => self.pairs[pos].1 = target.to_string(),
            None => {
                self.lookup.insert(source.to_string(), self.pairs.len());
                self.pairs.push((source.to_string(), target.to_string()));
            }
        }
    }

    /// Mapped target name for a source bone
    pub fn get(&self, source: &str) -> Option<&str> {
        self.lookup
            .get(source)
            .map(|&pos| self.pairs[pos].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<S: AsRef<str>, T: AsRef<str>> FromIterator<(S, T)> for BoneCorrespondence {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (source, target) in iter {
            map.insert(source.as_ref(), target.as_ref());
        }
        map
    }
}

/// Best-effort name correspondence between a clip skeleton and a character
/// skeleton.
///
/// For every source bone the first target (in target order) with an equal
/// normalized name wins. Failing that, the first target whose normalized name
/// contains, or is contained in, the source's normalized name is taken.
///
/// Containment is order-dependent and not ranked by length, so related names
/// such as "LeftArm" and "LeftForeArm" can pair up wrongly depending on which
/// target comes first. Some rigs in use depend on this exact behavior.
pub fn match_bones(source: &BoneIndex, target: &BoneIndex) -> BoneCorrespondence {
    let targets: Vec<(&str, String)> = target
        .names()
        .map(|name| (name, normalize(name)))
        .collect();

    let mut map = BoneCorrespondence::default();
    for source_name in source.names() {
        let n1 = normalize(source_name);

        let hit = targets
            .iter()
            .find(|(_, n2)| *n2 == n1)
            .or_else(|| {
                targets
                    .iter()
                    .find(|(_, n2)| n1.contains(n2.as_str()) || n2.contains(n1.as_str()))
            });

        if let Some((target_name, _)) = hit {
            map.insert(source_name, target_name);
        }
    }

    log::debug!(
        "Matched {}/{} source bones against {} target bones",
        map.len(),
        source.len(),
        target.len()
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeId, NodeKind, SceneGraph};

    /// Build an index whose node ids are fresh bones in a throwaway scene
    fn index_of(names: &[&str]) -> BoneIndex {
        let mut scene = SceneGraph::new("root");
        let mut index = BoneIndex::new();
        for name in names {
            let id: NodeId = scene.add_node(scene.root(), name, NodeKind::Bone);
            index.insert(name, id);
        }
        index
    }

    #[test]
    fn test_mixamo_prefix_maps_to_plain_name() {
        let source = index_of(&["mixamorig:Hips"]);
        let target = index_of(&["Hips"]);

        let map = match_bones(&source, &target);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("mixamorig:Hips"), Some("Hips"));
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        // "Spine" appears first and is contained in "spine2", but the exact
        // match comes later and must still win.
        let source = index_of(&["Spine2"]);
        let target = index_of(&["Spine", "Spine2"]);

        let map = match_bones(&source, &target);
        assert_eq!(map.get("Spine2"), Some("Spine2"));
    }

    #[test]
    fn test_substring_fallback_is_order_dependent() {
        // Known limitation: the first containment hit wins regardless of length
        let source = index_of(&["mixamorig:LeftForeArm"]);
        let target = index_of(&["LeftArm", "Arm", "LeftForeArmTwist"]);

        let map = match_bones(&source, &target);
        assert_eq!(map.get("mixamorig:LeftForeArm"), Some("Arm"));
    }

    #[test]
    fn test_unmatched_source_is_absent() {
        let source = index_of(&["mixamorig:Hips", "mixamorig:Tail"]);
        let target = index_of(&["Hips", "Head"]);

        let map = match_bones(&source, &target);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("mixamorig:Tail"), None);
    }

    #[test]
    fn test_mapping_stays_within_both_indices() {
        let source = index_of(&[
            "mixamorig:Hips",
            "mixamorig:Spine",
            "mixamorig:Spine1",
            "mixamorig:Neck",
            "mixamorig:LeftHand",
            "mixamorig:Unknown",
        ]);
        let target = index_of(&["Hips", "Spine", "Spine1", "Neck", "LeftHand", "RightHand"]);

        let map = match_bones(&source, &target);
        for (s, t) in map.iter() {
            assert!(source.contains(s), "{} not a source bone", s);
            assert!(target.contains(t), "{} not a target bone", t);
        }
    }

    #[test]
    fn test_empty_indices() {
        let empty = BoneIndex::new();
        let target = index_of(&["Hips"]);
        assert!(match_bones(&empty, &target).is_empty());
        assert!(match_bones(&target, &empty).is_empty());
    }
}
