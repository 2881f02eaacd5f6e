use crate::foundation::error::{MockupError, MockupResult};

/// Id of the identity preset.
pub const NONE_PRESET: &str = "none";

/// Color-grade parameters.
///
/// `brightness`, `saturation` and `contrast` are multiplicative factors where `1.0` is
/// neutral; `warmth` runs from `-100` (cool) to `100` (warm).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorGrade {
    pub warmth: f32,
    pub brightness: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self::IDENTITY
    }
}

const PRESETS: &[(&str, ColorGrade)] = &[
    (NONE_PRESET, ColorGrade::IDENTITY),
    (
        "warm",
        ColorGrade {
            warmth: 30.0,
            brightness: 1.03,
            saturation: 1.08,
            contrast: 1.04,
        },
    ),
    (
        "cool",
        ColorGrade {
            warmth: -25.0,
            brightness: 1.0,
            saturation: 0.95,
            contrast: 1.05,
        },
    ),
    (
        "vivid",
        ColorGrade {
            warmth: 5.0,
            brightness: 1.05,
            saturation: 1.25,
            contrast: 1.12,
        },
    ),
    (
        "muted",
        ColorGrade {
            warmth: 8.0,
            brightness: 1.02,
            saturation: 0.75,
            contrast: 0.92,
        },
    ),
    (
        "moody",
        ColorGrade {
            warmth: -10.0,
            brightness: 0.9,
            saturation: 0.85,
            contrast: 1.15,
        },
    ),
];

impl ColorGrade {
    /// Neutral grade, returns pixels unchanged.
    pub const IDENTITY: Self = Self {
        warmth: 0.0,
        brightness: 1.0,
        saturation: 1.0,
        contrast: 1.0,
    };

    /// Look up a built-in preset by id (case-insensitive).
    pub fn preset(id: &str) -> Option<Self> {
        let id = id.trim();
        PRESETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(id))
            .map(|(_, g)| *g)
    }

    /// Like [`ColorGrade::preset`] but failing with a validation error.
    pub fn require(id: &str) -> MockupResult<Self> {
        Self::preset(id)
            .ok_or_else(|| MockupError::validation(format!("unknown color grade preset '{id}'")))
    }

    /// Resolve a preset id, logging and falling back to identity for unknown ids.
    pub fn resolve_lenient(id: &str) -> Self {
        Self::preset(id).unwrap_or_else(|| {
            tracing::warn!(preset = id, "unknown color grade preset, using identity");
            Self::IDENTITY
        })
    }

    /// Ids of all built-in presets.
    pub fn preset_ids() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(name, _)| *name)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Whether `id` names the identity preset.
pub fn is_none_preset(id: &str) -> bool {
    id.trim().eq_ignore_ascii_case(NONE_PRESET)
}
