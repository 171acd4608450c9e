//! Decoder for the Data API response envelope.
//!
//! Every Data API response, success or failure, has the same shape:
//!
//! ```json
//! { "response": { ... }, "messages": [ { "code": "0", "message": "OK" } ] }
//! ```
//!
//! Decoding only validates that wrapper. The contents of `response` are left
//! to the caller, since each operation projects a different field out of it
//! (`token`, `recordId`, `data`, ...).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Envelope code signalling success.
pub const SUCCESS_CODE: &str = "0";

/// Failure to read a response body as an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The body is not JSON, or `response`/`messages` have the wrong type.
    #[error("response body is not a valid envelope: {0}")]
    Malformed(String),

    /// The body has no `messages` array.
    #[error("response envelope has no messages array")]
    MissingMessages,

    /// The `messages` array is empty.
    #[error("response envelope has an empty messages array")]
    EmptyMessages,
}

/// Failure to extract an expected value from `response`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// The field is absent (or `response` itself is absent).
    #[error("response is missing field '{0}'")]
    MissingField(String),

    /// The field is present but does not have the expected shape.
    #[error("response field '{field}' has unexpected shape: {reason}")]
    InvalidField { field: String, reason: String },
}

/// One entry of the `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// The decoded `{response, messages}` wrapper.
///
/// Only [`Envelope::decode`] builds one, so `messages` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    response: Option<Map<String, Value>>,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    response: Option<Map<String, Value>>,
    #[serde(default)]
    messages: Option<Vec<Message>>,
}

impl Envelope {
    /// Decode a raw response body.
    ///
    /// Fails if the body is not JSON, lacks a `messages` array, or the array
    /// is empty. Pure: no I/O, safe to call repeatedly.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawEnvelope =
            serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let messages = raw.messages.ok_or(DecodeError::MissingMessages)?;
        if messages.is_empty() {
            return Err(DecodeError::EmptyMessages);
        }

        Ok(Self {
            response: raw.response,
            messages,
        })
    }

    /// The `response` object, if the server sent one.
    pub fn response(&self) -> Option<&Map<String, Value>> {
        self.response.as_ref()
    }

    /// All status messages, in server order. Never empty.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The leading message; its code decides success.
    pub fn first(&self) -> &Message {
        // decode() rejects empty message lists
        &self.messages[0]
    }

    /// Code of the leading message.
    pub fn code(&self) -> &str {
        &self.first().code
    }

    /// Text of the leading message.
    pub fn message(&self) -> &str {
        &self.first().message
    }

    /// Returns true if the leading code is `"0"`.
    pub fn is_success(&self) -> bool {
        self.code() == SUCCESS_CODE
    }

    /// Borrow a field of `response`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.response.as_ref()?.get(name)
    }

    /// Deserialize a field of `response` into `T`.
    pub fn project<T: DeserializeOwned>(&self, name: &str) -> Result<T, ProjectionError> {
        let value = self
            .field(name)
            .ok_or_else(|| ProjectionError::MissingField(name.to_string()))?;

        T::deserialize(value).map_err(|e| ProjectionError::InvalidField {
            field: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Deserialize a field of `response` if present; `None` when absent.
    pub fn project_optional<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, ProjectionError> {
        match self.field(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.project(name).map(Some),
        }
    }
}

/// Older servers send numeric codes; normalise to strings.
fn code_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(i64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Number(n) => n.to_string(),
    })
}
