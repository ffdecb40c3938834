//! Voice settings and change notifications

use serde::{Deserialize, Serialize};

/// Current mute and volume state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub muted: bool,
    /// 0.0 ..= 1.0
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            muted: false,
            volume: 1.0,
        }
    }
}

/// Change notification from the settings store; absent fields are unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsChange {
    #[serde(default)]
    pub muted: Option<bool>,
    #[serde(default)]
    pub volume: Option<f32>,
}

impl VoiceSettings {
    /// Apply a change, returning true if anything differs afterwards
    pub fn apply(&mut self, change: SettingsChange) -> bool {
        let before = *self;
        if let Some(muted) = change.muted {
            self.muted = muted;
        }
        if let Some(volume) = change.volume {
            if volume.is_finite() {
                self.volume = volume.clamp(0.0, 1.0);
            }
        }
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_change() {
        let mut settings = VoiceSettings::default();
        assert!(settings.apply(SettingsChange {
            muted: Some(true),
            volume: None,
        }));
        assert!(settings.muted);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn test_volume_clamped_and_nan_ignored() {
        let mut settings = VoiceSettings::default();
        settings.apply(SettingsChange {
            muted: None,
            volume: Some(1.7),
        });
        assert_eq!(settings.volume, 1.0);
        settings.apply(SettingsChange {
            muted: None,
            volume: Some(0.25),
        });
        assert!(!settings.apply(SettingsChange {
            muted: None,
            volume: Some(f32::NAN),
        }));
        assert_eq!(settings.volume, 0.25);
    }

    #[test]
    fn test_change_deserialization() {
        let change: SettingsChange = serde_json::from_str(r#"{"volume":0.5}"#).unwrap();
        assert_eq!(change.muted, None);
        assert_eq!(change.volume, Some(0.5));
    }
}
