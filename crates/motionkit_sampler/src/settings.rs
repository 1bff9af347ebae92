// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sampler settings.
//!
//! Loaded from an optional RON file. Every field has a default, so a
//! settings file only needs the values it changes.

use motionkit_anim::AnimationDocument;
use serde::{Deserialize, Serialize};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Controls which frames are sampled and what is written per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Settings format version
    pub version: u32,
    /// Frame rate override; the document's rate when unset
    pub frame_rate: Option<f64>,
    /// First frame to sample
    pub start_frame: u32,
    /// Last frame to sample, inclusive; the document's last frame when unset
    pub end_frame: Option<u32>,
    /// Sample every Nth frame
    pub step: u32,
    /// Also write local transforms
    pub include_local: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            frame_rate: None,
            start_frame: 0,
            end_frame: None,
            step: 1,
            include_local: false,
        }
    }
}

impl SamplerSettings {
    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Apply overrides to a document before sampling
    pub fn apply(&self, document: &mut AnimationDocument) {
        if let Some(frame_rate) = self.frame_rate.filter(|rate| *rate > 0.0) {
            document.frame_rate = frame_rate;
        }
    }

    /// Frames to sample for `document`
    pub fn frames(&self, document: &AnimationDocument) -> impl Iterator<Item = u32> {
        let last = document.frame_count().saturating_sub(1);
        let end = self.end_frame.map_or(last, |end| end.min(last));
        (self.start_frame..=end).step_by(self.step.max(1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SamplerSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.step, 1);
        assert!(!settings.include_local);
    }

    #[test]
    fn test_partial_ron() {
        let settings = SamplerSettings::from_ron("(step: 5, include_local: true)").unwrap();
        assert_eq!(settings.step, 5);
        assert!(settings.include_local);
        assert_eq!(settings.start_frame, 0);
    }

    #[test]
    fn test_serialization() {
        let settings = SamplerSettings {
            frame_rate: Some(24.0),
            end_frame: Some(48),
            ..SamplerSettings::default()
        };
        let ron_str = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = SamplerSettings::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_frame_range() {
        let mut document = AnimationDocument::new("Range");
        document.duration = 1.0;
        document.frame_rate = 10.0;

        let all: Vec<u32> = SamplerSettings::default().frames(&document).collect();
        assert_eq!(all.len(), 11);

        let settings = SamplerSettings {
            start_frame: 2,
            end_frame: Some(100),
            step: 4,
            ..SamplerSettings::default()
        };
        let stepped: Vec<u32> = settings.frames(&document).collect();
        assert_eq!(stepped, vec![2, 6, 10]);
    }

    #[test]
    fn test_frame_rate_override() {
        let mut document = AnimationDocument::new("Rate");
        let settings = SamplerSettings {
            frame_rate: Some(60.0),
            ..SamplerSettings::default()
        };
        settings.apply(&mut document);
        assert_eq!(document.frame_rate, 60.0);

        SamplerSettings { frame_rate: Some(0.0), ..settings }.apply(&mut document);
        assert_eq!(document.frame_rate, 60.0);
    }
}
