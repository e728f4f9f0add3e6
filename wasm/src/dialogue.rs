//! Conversation plumbing: backend wire types, chat history, mood-tagged reply
//! segmentation and per-mood voice settings.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Narrated when the backend cannot be reached
pub const FALLBACK_REPLY: &str = "[sad] Something went wrong. Try again.";

/// Voice name fragments preferred for segmented narration, in order
pub const NARRATION_VOICES: [&str; 2] = ["Microsoft Ravi", "Samantha"];

/// Voice name fragments preferred for a single neutral utterance
pub const PLAIN_VOICES: [&str; 2] = ["Microsoft Heera", "Samantha"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub parts: Vec<String>,
}

/// Body posted to the conversational backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

impl ChatResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Running chat history sent along with every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    history: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Request for `message` carrying the history so far
    pub fn request(&self, message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            history: self.history.clone(),
        }
    }

    /// Append a completed user/model exchange
    pub fn record_exchange(&mut self, prompt: &str, reply: &str) {
        self.history.push(ChatMessage {
            role: ChatRole::User,
            parts: vec![prompt.to_string()],
        });
        self.history.push(ChatMessage {
            role: ChatRole::Model,
            parts: vec![reply.to_string()],
        });
    }
}

/// A run of reply text and the mood tag in force for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSegment {
    pub mood: String,
    pub text: String,
}

/// Line terminators a bracketed tag may not span
fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Split a reply like `"[happy] Hi! [sad] Bye."` into mood segments.
///
/// Tags are trimmed and lower-cased. Text before the first tag carries an
/// empty mood. Blank runs between tags are dropped.
pub fn parse_mood_segments(reply: &str) -> Vec<MoodSegment> {
    let mut segments = Vec::new();
    let mut mood = String::new();
    let mut last = 0;
    let mut search = 0;

    let mut push = |mood: &str, text: &str| {
        let text = text.trim();
        if !text.is_empty() {
            segments.push(MoodSegment {
                mood: mood.to_string(),
                text: text.to_string(),
            });
        }
    };

    while let Some(open) = reply[search..].find('[').map(|i| search + i) {
        let Some(close) = reply[open + 1..].find(']').map(|i| open + 1 + i) else {
            break;
        };
        let tag = &reply[open + 1..close];
        if tag.contains(is_line_break) {
            // Not a tag; keep scanning after this bracket
            search = open + 1;
            continue;
        }

        push(&mood, &reply[last..open]);
        mood = tag.trim().to_lowercase();
        last = close + 1;
        search = last;
    }
    push(&mood, &reply[last..]);

    segments
}

/// Speech synthesis pitch and rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub pitch: f32,
    pub rate: f32,
}

impl VoiceSettings {
    pub fn for_mood(mood: &str) -> Self {
        let (pitch, rate) = match mood {
            "happy" | "greet" => (1.3, 1.4),
            "thinking" | "calm" => (1.0, 0.9),
            "angry" => (0.8, 1.2),
            "sad" => (0.7, 0.85),
            _ => (1.0, 1.0),
        };
        Self { pitch, rate }
    }
}

/// A synthesis voice as reported by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
}

/// First voice whose name contains a preferred fragment (fragments tried in
/// order), else the first `en-US` voice, else the first voice at all.
pub fn select_voice<'a>(voices: &'a [VoiceInfo], preferences: &[&str]) -> Option<&'a VoiceInfo> {
    preferences
        .iter()
        .find_map(|fragment| voices.iter().find(|v| v.name.contains(fragment)))
        .or_else(|| voices.iter().find(|v| v.lang == "en-US"))
        .or_else(|| voices.first())
}

/// One utterance to hand to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub mood: String,
    pub text: String,
    pub voice: VoiceSettings,
}

/// Sequential narration of a mood-tagged reply.
///
/// Each utterance sets the avatar's emotion to its mood while it is spoken;
/// once the queue runs dry the avatar goes back to idling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Narration {
    segments: VecDeque<MoodSegment>,
}

impl Narration {
    pub fn from_reply(reply: &str) -> Self {
        Self {
            segments: parse_mood_segments(reply).into(),
        }
    }

    /// A lone `[neutral]` segment is spoken as one plain utterance with the
    /// alternate voice and no emotion change
    pub fn is_plain(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].mood == "neutral"
    }

    /// Voice fragments to prefer for this narration
    pub fn voice_preferences(&self) -> &'static [&'static str] {
        if self.is_plain() {
            &PLAIN_VOICES
        } else {
            &NARRATION_VOICES
        }
    }

    pub fn remaining(&self) -> usize {
        self.segments.len()
    }
}

impl Iterator for Narration {
    type Item = Utterance;

    fn next(&mut self) -> Option<Utterance> {
        let segment = self.segments.pop_front()?;
        Some(Utterance {
            voice: VoiceSettings::for_mood(&segment.mood),
            mood: segment.mood,
            text: segment.text,
        })
    }
}
