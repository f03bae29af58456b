//! Bridge response envelope

use quickdb_codec::decode;
use quickdb_common::{QuickDbError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `{success, data?, error?, message?}` as returned by every bridge call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BridgeResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Failure carrying the placeholder data callers branch on (`[]`, `null`, `0`)
    pub fn failure_with_data(error: impl Into<String>, data: JsonValue) -> Self {
        Self {
            data: Some(data),
            ..Self::failure(error)
        }
    }

    /// Parse engine response text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse engine response text and decode `data` into host values on success
    pub fn parse_decoded(text: &str) -> Result<Self> {
        let mut response = Self::parse(text)?;
        if response.success {
            if let Some(data) = response.data.as_mut() {
                *data = decode(data);
            }
        }
        Ok(response)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number carried in `data`, as for `count`, `update` and `delete`
    pub fn affected(&self) -> Option<i64> {
        self.data.as_ref().and_then(JsonValue::as_i64)
    }

    /// Error text of a failed response
    pub fn error_message(&self) -> &str {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("unknown engine error")
    }

    /// Turn a failed response into an `Engine` error, keeping `data` on success
    pub fn into_result(self) -> Result<Option<JsonValue>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(QuickDbError::Engine(self.error_message().to_string()))
        }
    }
}
