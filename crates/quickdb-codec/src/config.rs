//! Configuration options for encoding behavior

use serde::{Deserialize, Serialize};

// ============================================================================
// Array Item Encoding
// ============================================================================

/// How the elements of an `Array` field are tagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayItemMode {
    /// Tag each element from its own host type, ignoring the declared item type (default)
    #[default]
    Sniff,
    /// Encode each element against the declared item type
    Declared,
}

// ============================================================================
// Encode Options
// ============================================================================

/// Configuration options for the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Array element tagging
    #[serde(default)]
    pub array_items: ArrayItemMode,
}

impl EncodeOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode array elements against the declared item type
    pub fn declared_array_items(mut self) -> Self {
        self.array_items = ArrayItemMode::Declared;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sniffs_array_items() {
        assert_eq!(EncodeOptions::new().array_items, ArrayItemMode::Sniff);
    }

    #[test]
    fn test_declared_array_items() {
        let options = EncodeOptions::new().declared_array_items();
        assert_eq!(options.array_items, ArrayItemMode::Declared);
    }

    #[test]
    fn test_deserialize() {
        let options: EncodeOptions =
            serde_json::from_str(r#"{"array_items": "declared"}"#).unwrap();
        assert_eq!(options.array_items, ArrayItemMode::Declared);

        let options: EncodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, EncodeOptions::default());
    }
}
