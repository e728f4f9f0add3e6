//! Browser-facing API.
//!
//! The page owns rendering, asset fetching and speech; it hands scene and clip
//! descriptions in as JSON and pulls bone matrices and morph influences out
//! every frame.

use crate::avatar::Avatar;
use crate::behavior::BehaviorSignals;
use crate::bone::AnimationClip;
use crate::config::AvatarConfig;
use crate::dialogue::{select_voice, ChatResponse, Conversation, Narration, VoiceInfo, FALLBACK_REPLY};
use crate::scene::{NodeDescription, SceneGraph};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

fn log_level() -> log::Level {
    cfg_if::cfg_if! {
        if #[cfg(debug_assertions)] {
            log::Level::Debug
        } else {
            log::Level::Info
        }
    }
}

/// Install the panic hook and console logger. Safe to call more than once.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log_level()).ok();
}

fn parse_config(config_json: Option<String>) -> Result<AvatarConfig, JsValue> {
    match config_json {
        Some(json) => AvatarConfig::from_json(&json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e))),
        None => Ok(AvatarConfig::default()),
    }
}

fn parse_scene(json: &str) -> Result<SceneGraph, JsValue> {
    SceneGraph::from_json(json).map_err(|e| JsValue::from_str(&format!("Failed to parse scene: {}", e)))
}

fn now_ms() -> Option<f64> {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| perf.now())
}

#[wasm_bindgen]
pub struct AvatarHandle {
    avatar: Avatar,
    last_frame: Option<f64>,
}

impl AvatarHandle {
    fn from_avatar(avatar: Avatar) -> Self {
        Self {
            avatar,
            last_frame: None,
        }
    }
}

#[wasm_bindgen]
impl AvatarHandle {
    /// Build an avatar from a scene description JSON string
    #[wasm_bindgen(constructor)]
    pub fn new(scene_json: &str, config_json: Option<String>) -> Result<AvatarHandle, JsValue> {
        let scene = parse_scene(scene_json)?;
        let config = parse_config(config_json)?;
        Ok(Self::from_avatar(Avatar::new(scene, config)))
    }

    /// Retarget and bind one clip. Returns the retarget report.
    pub fn add_clip(
        &mut self,
        name: &str,
        clip_json: &str,
        skeleton_json: &str,
    ) -> Result<JsValue, JsValue> {
        let clip = AnimationClip::from_json(clip_json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse clip '{}': {}", name, e)))?;
        let skeleton = parse_scene(skeleton_json)?;

        let report = self.avatar.add_clip(name, clip, skeleton);
        serde_wasm_bindgen::to_value(&report).map_err(JsValue::from)
    }

    /// Replace the behavior signals. Expects `{ isActive, emotion, speaking,
    /// thinking, modelPosition }`; missing fields take their defaults.
    pub fn set_signals(&mut self, signals: JsValue) -> Result<(), JsValue> {
        let signals: BehaviorSignals = serde_wasm_bindgen::from_value(signals)
            .map_err(|e| JsValue::from_str(&format!("Invalid signals: {}", e)))?;
        self.avatar.set_signals(signals);
        Ok(())
    }

    /// Advance by `delta` seconds
    pub fn tick(&mut self, delta: f32) {
        self.avatar.tick(delta);
    }

    /// Advance by the wall time since the previous call
    pub fn tick_now(&mut self) {
        let Some(now) = now_ms() else {
            return;
        };
        let delta = self
            .last_frame
            .map_or(0.0, |last| ((now - last) / 1000.0) as f32);
        self.last_frame = Some(now);
        self.avatar.tick(delta);
    }

    /// World bone matrices, 16 floats each, column-major
    pub fn bone_matrices(&self) -> Vec<f32> {
        self.avatar.bone_matrix_buffer()
    }

    pub fn bone_names(&self) -> Vec<String> {
        self.avatar.bones().names().map(str::to_string).collect()
    }

    pub fn morph_influences(&self) -> Vec<f32> {
        self.avatar.morph_influences().to_vec()
    }

    pub fn current_animation(&self) -> Option<String> {
        self.avatar.current_animation().map(str::to_string)
    }

    pub fn toggle_morph(&mut self, name: &str) -> bool {
        self.avatar.toggle_morph(name)
    }

    pub fn reset_morphs(&mut self) {
        self.avatar.reset_morphs();
    }

    pub fn play(&mut self, name: &str) {
        self.avatar.play(name);
    }

    pub fn stop(&mut self, name: &str) {
        self.avatar.stop(name);
    }

    pub fn begin_utterance(&mut self, mood: Option<String>) {
        self.avatar.begin_utterance(mood.as_deref());
    }

    pub fn end_utterance(&mut self) {
        self.avatar.end_utterance();
    }

    pub fn finish_narration(&mut self) {
        self.avatar.finish_narration();
    }
}

/// Await the page's scene loader and build the avatar from its result, which
/// may be a JSON string or a plain object
#[wasm_bindgen]
pub async fn load_avatar(
    scene: js_sys::Promise,
    config_json: Option<String>,
) -> Result<AvatarHandle, JsValue> {
    let value = JsFuture::from(scene).await?;
    let scene = match value.as_string() {
        Some(json) => parse_scene(&json)?,
        None => {
            let desc: NodeDescription = serde_wasm_bindgen::from_value(value)
                .map_err(|e| JsValue::from_str(&format!("Failed to read scene: {}", e)))?;
            SceneGraph::from_description(&desc)
        }
    };
    let config = parse_config(config_json)?;

    log::info!("Scene loaded");
    Ok(AvatarHandle::from_avatar(Avatar::new(scene, config)))
}

/// Clip table `[{ animation, path }]` the page should fetch and bind
#[wasm_bindgen]
pub fn clip_manifest(config_json: Option<String>) -> Result<JsValue, JsValue> {
    let config = parse_config(config_json)?;
    serde_wasm_bindgen::to_value(&config.clips).map_err(JsValue::from)
}

/// Split a reply into `[{ mood, text }]`
#[wasm_bindgen]
pub fn parse_reply(reply: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&crate::dialogue::parse_mood_segments(reply)).map_err(JsValue::from)
}

/// Utterance queue for one reply
#[wasm_bindgen]
pub struct NarrationHandle {
    narration: Narration,
}

#[wasm_bindgen]
impl NarrationHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(reply: &str) -> NarrationHandle {
        Self {
            narration: Narration::from_reply(reply),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.narration.is_plain()
    }

    pub fn remaining(&self) -> usize {
        self.narration.remaining()
    }

    /// Next `{ mood, text, voice: { pitch, rate } }`, or `undefined` when done
    pub fn next_utterance(&mut self) -> Result<JsValue, JsValue> {
        match self.narration.next() {
            Some(utterance) => serde_wasm_bindgen::to_value(&utterance).map_err(JsValue::from),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Pick a voice name from `[{ name, lang }]`
    pub fn pick_voice(&self, voices: JsValue) -> Result<Option<String>, JsValue> {
        let voices: Vec<VoiceInfo> = serde_wasm_bindgen::from_value(voices)
            .map_err(|e| JsValue::from_str(&format!("Invalid voice list: {}", e)))?;
        Ok(select_voice(&voices, self.narration.voice_preferences()).map(|v| v.name.clone()))
    }
}

/// Chat history kept across turns
#[wasm_bindgen]
pub struct ConversationHandle {
    conversation: Conversation,
}

impl Default for ConversationHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ConversationHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ConversationHandle {
        Self {
            conversation: Conversation::new(),
        }
    }

    /// JSON body to post for `message`
    pub fn request_json(&self, message: &str) -> Result<String, JsValue> {
        serde_json::to_string(&self.conversation.request(message))
            .map_err(|e| JsValue::from_str(&format!("Failed to encode request: {}", e)))
    }

    /// Reply text from a backend response body, or the fallback line
    pub fn parse_response(&self, body: &str) -> String {
        match ChatResponse::from_json(body) {
            Ok(response) => response.reply,
            Err(e) => {
                log::warn!("Bad chat response: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub fn record_exchange(&mut self, prompt: &str, reply: &str) {
        self.conversation.record_exchange(prompt, reply);
    }

    pub fn history_len(&self) -> usize {
        self.conversation.history().len()
    }
}

#[wasm_bindgen]
pub fn fallback_reply() -> String {
    FALLBACK_REPLY.to_string()
}
