//! Cross-fading animation manager.
//!
//! One manager per avatar. It owns the retargeted clips as named actions,
//! tracks which action is current, and advances play heads and fades once per
//! frame. Nothing here is global; two avatars never share fade state.

use crate::bone::AnimationClip;
use std::collections::HashMap;

/// Fade time used by `AnimationManager::play`, in seconds
pub const DEFAULT_FADE_TIME: f32 = 0.3;

/// In-flight weight ramp
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Fade {
    fn progress(&self) -> f32 {
        if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        }
    }

    fn value(&self) -> f32 {
        self.from + (self.to - self.from) * self.progress()
    }

    fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// Playable binding of one clip: play head, weight and fade state
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: AnimationClip,
    time: f32,
    /// Base weight, scaled by any running fade
    weight: f32,
    enabled: bool,
    paused: bool,
    /// Scheduled for updates by the manager
    active: bool,
    fade: Option<Fade>,
}

impl AnimationAction {
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            weight: 1.0,
            enabled: true,
            paused: false,
            active: false,
            fade: None,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Play head in seconds, wrapped into the clip duration
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Running means scheduled, enabled and not paused
    pub fn is_running(&self) -> bool {
        self.active && self.enabled && !self.paused
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Weight this action currently contributes to the blend
    pub fn effective_weight(&self) -> f32 {
        if !self.active || !self.enabled {
            return 0.0;
        }
        match self.fade {
            Some(fade) => self.weight * fade.value(),
            None => self.weight,
        }
    }

    /// Rewind to time zero, re-enable and drop any fade
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self.enabled = true;
        self.paused = false;
        self.fade = None;
        self
    }

    pub fn fade_in(&mut self, duration: f32) -> &mut Self {
        self.schedule_fade(duration, 0.0, 1.0)
    }

    /// Ramp from the weight currently in effect down to zero
    pub fn fade_out(&mut self, duration: f32) -> &mut Self {
        let from = match self.fade {
            Some(fade) if self.enabled => fade.value(),
            _ if self.enabled => 1.0,
            _ => 0.0,
        };
        self.schedule_fade(duration, from, 0.0)
    }

    pub fn play(&mut self) -> &mut Self {
        self.active = true;
        self
    }

    /// Halt and rewind
    pub fn stop(&mut self) -> &mut Self {
        self.active = false;
        self.reset()
    }

    fn schedule_fade(&mut self, duration: f32, from: f32, to: f32) -> &mut Self {
        self.fade = Some(Fade {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        });
        self
    }

    /// Advance play head and fade by `delta` seconds
    fn update(&mut self, delta: f32) {
        if !self.active || !self.enabled {
            return;
        }

        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed += delta;
            if fade.is_finished() {
                let target = fade.to;
                self.fade = None;
                if target <= 0.0 {
                    // Faded out: stays scheduled but contributes nothing
                    self.enabled = false;
                }
            }
        }

        if !self.paused {
            self.time = self.clip.looped_time(self.time + delta);
        }
    }
}

/// Named actions plus the single "current" designation
#[derive(Debug, Clone)]
pub struct AnimationManager {
    actions: Vec<(String, AnimationAction)>,
    lookup: HashMap<String, usize>,
    current: Option<usize>,
    default_fade: f32,
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self::new(DEFAULT_FADE_TIME)
    }
}

impl AnimationManager {
    pub fn new(default_fade: f32) -> Self {
        Self {
            actions: Vec::new(),
            lookup: HashMap::new(),
            current: None,
            default_fade,
        }
    }

    /// Register a clip under `name`. Binding an existing name keeps the
    /// original action.
    pub fn bind(&mut self, name: &str, clip: AnimationClip) {
        if self.lookup.contains_key(name) {
            log::debug!("Action '{}' already bound", name);
            return;
        }
        self.lookup.insert(name.to_string(), self.actions.len());
        self.actions.push((name.to_string(), AnimationAction::new(clip)));
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Cross-fade to `name` using the default fade time
    pub fn play(&mut self, name: &str) {
        self.play_with_fade(name, self.default_fade);
    }

    /// Cross-fade to `name`.
    ///
    /// The incoming action becomes current immediately; the outgoing one keeps
    /// playing while it fades out. Playing the current action again restarts
    /// it with a fresh fade-in. Unbound names are ignored.
    pub fn play_with_fade(&mut self, name: &str, fade_time: f32) {
        let Some(&next) = self.lookup.get(name) else {
            return;
        };

        if let Some(current) = self.current.filter(|&c| c != next) {
            self.actions[current].1.fade_out(fade_time);
        }
        self.actions[next].1.reset().fade_in(fade_time).play();

        self.current = Some(next);
    }

    /// Halt one action. The current designation is left untouched.
    pub fn stop(&mut self, name: &str) {
        if let Some(&idx) = self.lookup.get(name) {
            self.actions[idx].1.stop();
        }
    }

    /// Advance every scheduled action by `delta` seconds. Call once per frame.
    pub fn update(&mut self, delta: f32) {
        for (_, action) in &mut self.actions {
            action.update(delta);
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.action(name).is_some_and(AnimationAction::is_running)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.map(|idx| self.actions[idx].0.as_str())
    }

    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.lookup.get(name).map(|&idx| &self.actions[idx].1)
    }

    /// Effective blend weight of an action, zero when unbound
    pub fn weight(&self, name: &str) -> f32 {
        self.action(name)
            .map_or(0.0, AnimationAction::effective_weight)
    }

    /// Actions in binding order
    pub fn actions(&self) -> impl Iterator<Item = (&str, &AnimationAction)> {
        self.actions.iter().map(|(name, action)| (name.as_str(), action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
