use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens to the contents of an owning container when it is resized.
///
/// Every policy allocates fresh storage; views created before the resize
/// keep the old storage alive and no longer alias the container.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// All elements become zero.
    #[default]
    ZeroFill,
    /// Contents are unspecified and will be overwritten by the caller.
    /// Storage is still zero-initialised.
    Undefined,
    /// Elements valid in both old and new shapes are kept, the rest are zero.
    PreserveAndZeroPad,
}

impl FromStr for ResizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" | "zero_fill" | "set_zero" => Ok(ResizePolicy::ZeroFill),
            "undefined" => Ok(ResizePolicy::Undefined),
            "copy" | "copy_data" | "preserve" | "preserve_and_zero_pad" => {
                Ok(ResizePolicy::PreserveAndZeroPad)
            }
            _ => Err(format!("Unknown resize policy: {}", s)),
        }
    }
}
