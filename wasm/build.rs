//! Build script for bundled clip validation
//!
//! Runs at compile time over every clip description JSON shipped with the
//! page and rejects tracks the runtime parser would refuse.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Track {
    name: String,
    times: Vec<f32>,
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct AnimationClip {
    name: String,
    tracks: Vec<Track>,
}

/// Floats per keyframe for a channel suffix
fn channel_stride(channel: &str) -> Option<usize> {
    match channel {
        "position" | "scale" => Some(3),
        "quaternion" => Some(4),
        _ => None,
    }
}

fn validate_track(track: &Track) -> Vec<String> {
    let mut errors = Vec::new();

    let Some((bone, channel)) = track.name.rsplit_once('.') else {
        errors.push(format!("  {}: expected 'bone.channel'", track.name));
        return errors;
    };
    if bone.is_empty() {
        errors.push(format!("  {}: empty bone name", track.name));
    }
    let Some(stride) = channel_stride(channel) else {
        errors.push(format!("  {}: unknown channel '{}'", track.name, channel));
        return errors;
    };

    if track.times.windows(2).any(|w| w[1] < w[0]) {
        errors.push(format!("  {}: keyframe times are not sorted", track.name));
    }
    if track.values.len() != track.times.len() * stride {
        errors.push(format!(
            "  {}: {} values for {} keys (expected {})",
            track.name,
            track.values.len(),
            track.times.len(),
            track.times.len() * stride
        ));
    }

    errors
}

/// Validate a clip description file
fn validate_clip_file(path: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let clip: AnimationClip = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    let errors: Vec<String> = clip.tracks.iter().flat_map(validate_track).collect();

    if errors.is_empty() {
        println!(
            "cargo:warning=✓ {} validated ({} tracks)",
            clip.name,
            clip.tracks.len()
        );
        Ok(())
    } else {
        Err(format!(
            "Clip '{}' has invalid tracks:\n{}",
            clip.name,
            errors.join("\n")
        ))
    }
}

fn main() {
    // Clip descriptions (relative to wasm crate root)
    let clip_dir = Path::new("../assets/animations");

    if !clip_dir.exists() {
        println!("cargo:warning=Clip directory not found, skipping validation");
        return;
    }

    let mut has_errors = false;

    if let Ok(entries) = fs::read_dir(clip_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                println!("cargo:rerun-if-changed={}", path.display());

                if let Err(e) = validate_clip_file(&path) {
                    println!("cargo:warning=VALIDATION ERROR: {}", e);
                    has_errors = true;
                }
            }
        }
    }

    if has_errors {
        panic!("Clip validation failed! Fix the track data in the clip files.");
    }

    println!("cargo:rerun-if-changed={}", clip_dir.display());
}
