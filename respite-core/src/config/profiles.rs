//! Ready-made break configurations
//!
//! - Casual: short sessions, frequent breaks
//! - Marathon: long sessions, short breaks, best-load reconnection
//! - InPlace: scripts pause but the session never disconnects

use super::types::*;
use crate::endpoint::SelectionMode;

/// Preset name, as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetName {
    Casual,
    Marathon,
    InPlace,
}

impl PresetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Marathon => "marathon",
            Self::InPlace => "in_place",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "casual" => Some(Self::Casual),
            "marathon" => Some(Self::Marathon),
            "in_place" | "in-place" | "inplace" => Some(Self::InPlace),
            _ => None,
        }
    }

    pub fn config(&self) -> BreakConfig {
        match self {
            Self::Casual => BreakConfig::casual(),
            Self::Marathon => BreakConfig::marathon(),
            Self::InPlace => BreakConfig::in_place(),
        }
    }
}

impl BreakConfig {
    /// 20-40 minutes of play, 10-20 minute disconnect breaks
    pub fn casual() -> Self {
        Self {
            timing: TimingConfig {
                min_playtime_minutes: 20,
                max_playtime_minutes: 40,
                min_break_minutes: 10,
                max_break_minutes: 20,
            },
            ..Self::default()
        }
    }

    /// 2-4 hours of play, 3-8 minute breaks, least crowded endpoint on return
    pub fn marathon() -> Self {
        Self {
            timing: TimingConfig {
                min_playtime_minutes: 120,
                max_playtime_minutes: 240,
                min_break_minutes: 3,
                max_break_minutes: 8,
            },
            reconnect: ReconnectConfig {
                endpoint_selection_mode: SelectionMode::BestLoad,
                ..ReconnectConfig::default()
            },
            ..Self::default()
        }
    }

    /// Default timing, but breaks only pause scripts
    pub fn in_place() -> Self {
        Self {
            behavior: BehaviorConfig {
                disconnect_on_break: false,
                safety_check_enabled: false,
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for name in [PresetName::Casual, PresetName::Marathon, PresetName::InPlace] {
            let config = name.config();
            assert!(config.validate().is_ok(), "{} preset invalid", name.as_str());
        }
    }

    #[test]
    fn test_preset_name_parsing() {
        assert_eq!(PresetName::from_str("Casual"), Some(PresetName::Casual));
        assert_eq!(PresetName::from_str("in-place"), Some(PresetName::InPlace));
        assert_eq!(PresetName::from_str("marathon"), Some(PresetName::Marathon));
        assert_eq!(PresetName::from_str("sprint"), None);
    }

    #[test]
    fn test_in_place_preset_never_disconnects() {
        let config = BreakConfig::in_place();
        assert!(!config.behavior.disconnect_on_break);
        assert_eq!(config.timing, TimingConfig::default());
    }
}
