//! Whisper model variant catalog.
//!
//! The model selector travels over the wire in configuration messages and
//! maps onto a ggml file on disk.

use crate::error::ScribedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available model sizes.
///
/// Models range from tiny (fast, lower accuracy) to large-v3 (slowest,
/// highest accuracy). Sessions that never configure themselves use
/// [`ModelSize::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelSize {
    Tiny,
    Base,
    #[default]
    Small,
    Medium,
    LargeV3,
}

impl ModelSize {
    /// All known variants, smallest first.
    pub const ALL: &'static [ModelSize] = &[
        ModelSize::Tiny,
        ModelSize::Base,
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::LargeV3,
    ];

    /// Wire name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::LargeV3 => "large-v3",
        }
    }

    /// File name of the ggml weights inside the model directory.
    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self.as_str())
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = ScribedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelSize::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ScribedError::UnknownModel {
                name: s.to_string(),
            })
    }
}
