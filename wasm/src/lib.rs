//! Talking Avatar - Wasm Core
//!
//! Bone retargeting, cross-faded animation, behavior selection and lip sync
//! for a browser-rendered character.

pub mod animation;
pub mod avatar;
pub mod behavior;
#[cfg(target_arch = "wasm32")]
pub mod bindings;
pub mod bone;
pub mod config;
pub mod dialogue;
pub mod lipsync;
pub mod pose;
pub mod scene;

use wasm_bindgen::prelude::*;

pub use animation::{AnimationAction, AnimationManager, DEFAULT_FADE_TIME};
pub use avatar::Avatar;
pub use behavior::{select_behavior, AvatarAnimation, BehaviorSignals, ModelPosition};
pub use config::AvatarConfig;
pub use glam::{Mat4, Quat, Vec3};
pub use lipsync::LipSyncDriver;
pub use scene::{NodeId, NodeKind, SceneGraph, Transform};

#[cfg(target_arch = "wasm32")]
pub use bindings::{init, load_avatar, AvatarHandle, ConversationHandle, NarrationHandle};

/// Log to browser console
#[wasm_bindgen]
pub fn log(msg: &str) {
    log::info!("{}", msg);
}

#[cfg(test)]
mod tests {
    use wasm_bindgen_test::*;
    wasm_bindgen_test_configure!(run_in_browser);
}
