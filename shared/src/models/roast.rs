//! Roast level model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::Language;

/// Roast levels, lightest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoastLevel {
    UltraLight,
    Light,
    MediumLight,
    Medium,
    MediumDark,
    Dark,
}

impl RoastLevel {
    pub const ALL: [RoastLevel; 6] = [
        RoastLevel::UltraLight,
        RoastLevel::Light,
        RoastLevel::MediumLight,
        RoastLevel::Medium,
        RoastLevel::MediumDark,
        RoastLevel::Dark,
    ];

    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (RoastLevel::UltraLight, Language::Chinese) => "极浅烘焙",
            (RoastLevel::Light, Language::Chinese) => "浅度烘焙",
            (RoastLevel::MediumLight, Language::Chinese) => "中浅烘焙",
            (RoastLevel::Medium, Language::Chinese) => "中度烘焙",
            (RoastLevel::MediumDark, Language::Chinese) => "中深烘焙",
            (RoastLevel::Dark, Language::Chinese) => "深度烘焙",
            (RoastLevel::UltraLight, Language::English) => "Ultra Light",
            (RoastLevel::Light, Language::English) => "Light",
            (RoastLevel::MediumLight, Language::English) => "Medium Light",
            (RoastLevel::Medium, Language::English) => "Medium",
            (RoastLevel::MediumDark, Language::English) => "Medium Dark",
            (RoastLevel::Dark, Language::English) => "Dark",
        }
    }

    /// Parse a stored label in either language.
    ///
    /// Unrecognised labels are classified by their light/dark/medium marker,
    /// so free-typed values like "Nordic light" still land in a family.
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        for level in Self::ALL {
            if level.label(Language::Chinese) == trimmed
                || level.label(Language::English).eq_ignore_ascii_case(trimmed)
            {
                return Some(level);
            }
        }

        let lower = trimmed.to_lowercase();
        if lower.contains("light") || trimmed.contains('浅') {
            Some(RoastLevel::Light)
        } else if lower.contains("dark") || trimmed.contains('深') {
            Some(RoastLevel::Dark)
        } else if lower.contains("medium") || trimmed.contains('中') {
            Some(RoastLevel::Medium)
        } else {
            None
        }
    }

    /// Carries the light marker ("light" / "浅")
    pub fn is_light_family(&self) -> bool {
        matches!(
            self,
            RoastLevel::UltraLight | RoastLevel::Light | RoastLevel::MediumLight
        )
    }

    /// Carries the dark marker ("dark" / "深")
    pub fn is_dark_family(&self) -> bool {
        matches!(self, RoastLevel::MediumDark | RoastLevel::Dark)
    }
}

impl std::fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label(Language::English))
    }
}

impl Serialize for RoastLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label(Language::Chinese))
    }
}

impl<'de> Deserialize<'de> for RoastLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        RoastLevel::parse(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown roast level: {label}")))
    }
}
