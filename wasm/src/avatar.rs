//! The talking avatar: one character scene with its own animation manager,
//! behavior signals and lip sync.

use crate::animation::AnimationManager;
use crate::behavior::{select_behavior, AvatarAnimation, BehaviorSignals, ModelPosition};
use crate::bone::{build_bone_index, match_bones, retarget, AnimationClip, BoneIndex, RetargetReport};
use crate::config::AvatarConfig;
use crate::lipsync::LipSyncDriver;
use crate::pose::RestPose;
use crate::scene::{NodeId, SceneGraph};
use glam::Mat4;
use static_assertions::assert_eq_size;

// Bone matrices are exported as raw column-major floats
assert_eq_size!(Mat4, [f32; 16]);

/// Head mesh and the driver for its mouth morphs
#[derive(Debug, Clone)]
struct Head {
    node: NodeId,
    lips: LipSyncDriver,
}

#[derive(Debug, Clone)]
pub struct Avatar {
    scene: SceneGraph,
    bones: BoneIndex,
    rest_pose: RestPose,
    manager: AnimationManager,
    head: Option<Head>,
    signals: BehaviorSignals,
    config: AvatarConfig,
}

impl Avatar {
    pub fn new(scene: SceneGraph, config: AvatarConfig) -> Self {
        let head = Self::locate_head(&scene, &config);
        let bones = build_bone_index(&scene, scene.root());
        let rest_pose = RestPose::capture(&scene, &bones);

        log::info!(
            "Avatar ready: {} nodes, {} bones, head mesh {}",
            scene.len(),
            bones.len(),
            head.as_ref()
                .map_or("<none>", |h| scene.node(h.node).name.as_str())
        );

        let mut avatar = Self {
            scene,
            bones,
            rest_pose,
            manager: AnimationManager::new(config.default_fade_time),
            head,
            signals: BehaviorSignals::default(),
            config,
        };
        avatar.apply_placement(avatar.signals.model_position);
        avatar
    }

    /// Configured head mesh, else the first mesh carrying morph data
    fn locate_head(scene: &SceneGraph, config: &AvatarConfig) -> Option<Head> {
        let node = scene
            .find_by_name(&config.head_mesh)
            .filter(|&id| scene.node(id).kind.morph_targets().is_some())
            .or_else(|| scene.find_morph_mesh());

        let Some(node) = node else {
            log::warn!("No mesh with morph targets found; lip sync disabled");
            return None;
        };
        let morphs = scene.node(node).kind.morph_targets()?;
        let lips = LipSyncDriver::bind(
            morphs,
            &config.mouth_open_morph,
            &config.mouth_smile_morph,
            config.lip_sync,
        );
        Some(Head { node, lips })
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn bones(&self) -> &BoneIndex {
        &self.bones
    }

    pub fn manager(&self) -> &AnimationManager {
        &self.manager
    }

    pub fn signals(&self) -> &BehaviorSignals {
        &self.signals
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    /// Retarget a clip from its own skeleton onto this character and bind it
    /// under `name`
    pub fn add_clip(
        &mut self,
        name: &str,
        mut clip: AnimationClip,
        mut clip_skeleton: SceneGraph,
    ) -> RetargetReport {
        let source = build_bone_index(&clip_skeleton, clip_skeleton.root());
        let map = match_bones(&source, &self.bones);
        let report = retarget(&mut clip, &mut clip_skeleton, &source, &map);

        log::info!(
            "Bound clip '{}': {}/{} bones matched, {} inert tracks",
            name,
            map.len(),
            source.len(),
            report.inert_tracks
        );
        self.manager.bind(name, clip);

        // Signals set before any clip arrived still need an action
        if self.manager.current_name().is_none() {
            self.refresh_behavior();
        }
        report
    }

    /// Take a new signal set from the page and react to it. The selector only
    /// runs when a behavior input changed; resending the same set leaves the
    /// current action playing undisturbed.
    pub fn set_signals(&mut self, signals: BehaviorSignals) {
        if signals.model_position != self.signals.model_position {
            self.apply_placement(signals.model_position);
        }
        let changed = !signals.same_behavior(&self.signals);
        self.signals = signals;
        if changed {
            self.refresh_behavior();
        }
    }

    fn refresh_behavior(&mut self) {
        let idle_running = self.manager.is_running(AvatarAnimation::Idle.as_str());
        if let Some(animation) = select_behavior(&self.signals, idle_running) {
            self.manager.play(animation.as_str());
        }
    }

    /// Move the scene root to the framing preset
    pub fn apply_placement(&mut self, position: ModelPosition) {
        let transform = self.config.placement.for_position(position).to_transform();
        let root = self.scene.root();
        self.scene.node_mut(root).transform = transform;
    }

    /// Advance one frame. Animation only runs while active; lip sync runs
    /// whenever there is a head mesh.
    pub fn tick(&mut self, delta: f32) {
        if self.signals.is_active {
            self.manager.update(delta);
            let pose = self.manager.evaluate();
            self.rest_pose.apply(&mut self.scene, &pose);
        }

        if let Some(head) = self.head.as_mut() {
            if let Some(morphs) = self.scene.node_mut(head.node).kind.morph_targets_mut() {
                head.lips.update(morphs, self.signals.speaking, delta);
            }
        }
    }

    pub fn play(&mut self, name: &str) {
        self.manager.play(name);
    }

    pub fn stop(&mut self, name: &str) {
        self.manager.stop(name);
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.manager.current_name()
    }

    /// Flip a head morph between 0 and 1. Returns false for unknown morphs.
    pub fn toggle_morph(&mut self, name: &str) -> bool {
        let Some(head) = self.head.as_ref() else {
            return false;
        };
        let Some(morphs) = self.scene.node_mut(head.node).kind.morph_targets_mut() else {
            return false;
        };
        let Some(value) = morphs.influence(name) else {
            log::warn!("Morph target '{}' not found", name);
            return false;
        };
        morphs.set_influence(name, if value == 0.0 { 1.0 } else { 0.0 })
    }

    pub fn reset_morphs(&mut self) {
        if let Some(head) = self.head.as_ref() {
            if let Some(morphs) = self.scene.node_mut(head.node).kind.morph_targets_mut() {
                morphs.reset();
            }
        }
    }

    /// Head morph influences, empty without a head mesh
    pub fn morph_influences(&self) -> &[f32] {
        self.head
            .as_ref()
            .and_then(|head| self.scene.node(head.node).kind.morph_targets())
            .map(|morphs| morphs.influences.as_slice())
            .unwrap_or_default()
    }

    /// World matrix of every bone, in bone-index order
    pub fn bone_matrices(&self) -> Vec<Mat4> {
        let world = self.scene.world_matrices(Mat4::IDENTITY);
        self.bones.iter().map(|(_, id)| world[id.index()]).collect()
    }

    /// `bone_matrices` flattened for upload
    pub fn bone_matrix_buffer(&self) -> Vec<f32> {
        bytemuck::cast_slice(&self.bone_matrices()).to_vec()
    }

    /// Start speaking one utterance. `None` leaves the emotion unchanged.
    pub fn begin_utterance(&mut self, mood: Option<&str>) {
        let mut signals = self.signals.clone();
        if let Some(mood) = mood {
            signals.emotion = mood.to_string();
        }
        signals.speaking = true;
        self.set_signals(signals);
    }

    pub fn end_utterance(&mut self) {
        let mut signals = self.signals.clone();
        signals.speaking = false;
        self.set_signals(signals);
    }

    /// Narration queue ran dry: back to idling
    pub fn finish_narration(&mut self) {
        let mut signals = self.signals.clone();
        signals.speaking = false;
        signals.emotion = "idle".to_string();
        self.set_signals(signals);
    }
}
