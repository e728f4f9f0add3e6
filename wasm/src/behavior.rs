use serde::{Deserialize, Serialize};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Animations the avatar knows how to perform.
/// Names double as action names in the `AnimationManager`.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvatarAnimation {
    Clapping,
    Greeting,
    HappyHand,
    HeadNodYes,
    HeadNo,
    Idle,
    Pointing,
    SadIdle,
    Talking,
    Thinking,
}

impl AvatarAnimation {
    pub const COUNT: usize = 10;

    pub const ALL: [AvatarAnimation; Self::COUNT] = [
        AvatarAnimation::Clapping,
        AvatarAnimation::Greeting,
        AvatarAnimation::HappyHand,
        AvatarAnimation::HeadNodYes,
        AvatarAnimation::HeadNo,
        AvatarAnimation::Idle,
        AvatarAnimation::Pointing,
        AvatarAnimation::SadIdle,
        AvatarAnimation::Talking,
        AvatarAnimation::Thinking,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AvatarAnimation::Clapping => "Clapping",
            AvatarAnimation::Greeting => "Greeting",
            AvatarAnimation::HappyHand => "HappyHand",
            AvatarAnimation::HeadNodYes => "HeadNodYes",
            AvatarAnimation::HeadNo => "HeadNo",
            AvatarAnimation::Idle => "Idle",
            AvatarAnimation::Pointing => "Pointing",
            AvatarAnimation::SadIdle => "SadIdle",
            AvatarAnimation::Talking => "Talking",
            AvatarAnimation::Thinking => "Thinking",
        }
    }

    /// Emotion tag lookup. Unknown tags fall back to idling.
    pub fn from_emotion(emotion: &str) -> Self {
        match emotion {
            "happy" => AvatarAnimation::HappyHand,
            "greet" => AvatarAnimation::Greeting,
            "sad" => AvatarAnimation::SadIdle,
            "clap" => AvatarAnimation::Clapping,
            "yes" => AvatarAnimation::HeadNodYes,
            "no" => AvatarAnimation::HeadNo,
            "point" => AvatarAnimation::Pointing,
            "think" => AvatarAnimation::Thinking,
            "talk" => AvatarAnimation::Talking,
            _ => AvatarAnimation::Idle,
        }
    }
}

/// Camera framing preset for the avatar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPosition {
    #[default]
    Near,
    Far,
}

/// Everything the page tells the avatar about the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviorSignals {
    pub is_active: bool,
    pub emotion: String,
    pub speaking: bool,
    pub thinking: bool,
    pub model_position: ModelPosition,
}

impl Default for BehaviorSignals {
    fn default() -> Self {
        Self {
            is_active: false,
            emotion: "idle".to_string(),
            speaking: false,
            thinking: false,
            model_position: ModelPosition::Near,
        }
    }
}

impl BehaviorSignals {
    /// True when both sets would feed the selector the same inputs.
    /// `model_position` only affects placement.
    pub fn same_behavior(&self, other: &BehaviorSignals) -> bool {
        self.is_active == other.is_active
            && self.emotion == other.emotion
            && self.speaking == other.speaking
            && self.thinking == other.thinking
    }
}

/// Pick the animation for a signal set, first rule wins:
/// inactive does nothing, thinking beats everything, speech only interrupts
/// idling, then the emotion tag decides.
///
/// `idle_running` reports whether the "Idle" action is currently playing.
pub fn select_behavior(signals: &BehaviorSignals, idle_running: bool) -> Option<AvatarAnimation> {
    if !signals.is_active {
        return None;
    }
    if signals.thinking {
        return Some(AvatarAnimation::Thinking);
    }
    if signals.speaking && idle_running {
        return Some(AvatarAnimation::Talking);
    }
    Some(AvatarAnimation::from_emotion(&signals.emotion))
}
