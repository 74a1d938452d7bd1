//! Effector colors and the per-pipeline color cache

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A single color or a palette to index into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    Palette(Vec<String>),
}

impl ColorSpec {
    /// Pick a color: a palette indexes by `floor(t * len)`, a single color
    /// applies only when `gate` holds
    pub fn pick(&self, t: f32, gate: bool) -> Option<&str> {
        match self {
            ColorSpec::Single(color) => gate.then_some(color.as_str()),
            ColorSpec::Palette(colors) => {
                if colors.is_empty() {
                    return None;
                }
                let i = ((crate::clamp01(t) * colors.len() as f32).floor() as usize).min(colors.len() - 1);
                Some(colors[i].as_str())
            }
        }
    }
}

/// Parsed hex colors, memoized per pipeline
#[derive(Debug, Clone, Default)]
pub struct ColorCache {
    map: HashMap<String, Option<Vec3>>,
}

impl ColorCache {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Resolve `#rgb` / `#rrggbb` (leading `#` optional) into [0, 1] channels
    pub fn resolve(&mut self, color: &str) -> Option<Vec3> {
        if let Some(cached) = self.map.get(color) {
            return *cached;
        }
        let parsed = parse_hex(color);
        if parsed.is_none() {
            log::debug!("Ignoring unparsable color {:?}", color);
        }
        self.map.insert(color.to_string(), parsed);
        parsed
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

fn parse_hex(color: &str) -> Option<Vec3> {
    let hex = color.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
    match hex.len() {
        3 => {
            let mut out = [0.0; 3];
            for (i, c) in hex.chars().enumerate() {
                let doubled: String = [c, c].iter().collect();
                out[i] = channel(&doubled)?;
            }
            Some(Vec3::from_array(out))
        }
        6 => Some(Vec3::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}
