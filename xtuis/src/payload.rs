use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// A message for the xtuis service.
///
/// Serialized as the service's form fields: `text` is the title shown in the
/// notification, `desp` the optional body (markdown is rendered).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Payload {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    desp: Option<String>,
}

impl Payload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            desp: None,
        }
    }

    pub fn with_desp(mut self, desp: impl Into<String>) -> Self {
        self.desp = Some(desp.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn desp(&self) -> Option<&str> {
        self.desp.as_deref()
    }

    /// Rejects payloads the service cannot deliver.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::InvalidPayload("text must not be empty".to_string()));
        }
        Ok(())
    }
}
