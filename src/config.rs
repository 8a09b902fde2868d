use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::math::Precision;

/// On-disk encoding of an archive.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Binary,
    Text,
}

impl Encoding {
    pub fn is_binary(self) -> bool {
        matches!(self, Encoding::Binary)
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" | "b" => Ok(Encoding::Binary),
            "text" | "t" => Ok(Encoding::Text),
            _ => Err(format!(
                "Unknown encoding: {}. Expected binary or text",
                s
            )),
        }
    }
}

/// How the path-level helpers in [`crate::io::archive`] write objects.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    pub encoding: Encoding,

    /// Precision written to disk; `None` keeps the container's own.
    #[serde(default)]
    pub precision: Option<Precision>,
}

impl ArchiveConfig {
    pub fn new(encoding: Encoding, precision: Option<Precision>) -> Self {
        Self {
            encoding,
            precision,
        }
    }

    pub fn text() -> Self {
        Self::new(Encoding::Text, None)
    }

    pub fn binary() -> Self {
        Self::new(Encoding::Binary, None)
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::binary()
    }
}
