//! The JSON command envelope carried inside each frame.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named command with its positional and keyword arguments.
///
/// On the wire the envelope is a UTF-8 JSON object with exactly three keys:
/// `command`, `args` and `kwargs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEnvelope {
    /// Registered command name, for example `set`.
    #[serde(rename = "command")]
    pub name: String,
    /// Ordered positional arguments.
    #[serde(rename = "args")]
    pub positional_args: Vec<String>,
    /// Keyword arguments keyed by name.
    #[serde(rename = "kwargs")]
    pub keyword_args: BTreeMap<String, String>,
}

/// Errors raised while converting envelopes to and from payload bytes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload was not valid UTF-8.
    #[error("envelope is not valid UTF-8: {source}")]
    InvalidEncoding {
        /// Underlying decoding error.
        #[source]
        source: std::str::Utf8Error,
    },
    /// The payload was not a well-formed envelope object.
    #[error("malformed command envelope: {source}")]
    Malformed {
        /// Underlying JSON error, naming any missing or unexpected field.
        #[source]
        source: serde_json::Error,
    },
    /// The envelope named no command.
    #[error("command envelope has an empty name")]
    EmptyName,
}

impl CommandEnvelope {
    /// Builds an envelope with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positional_args: Vec::new(),
            keyword_args: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with_arg(mut self, value: impl Into<String>) -> Self {
        self.positional_args.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing any earlier value for `key`.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyword_args.insert(key.into(), value.into());
        self
    }

    /// Serialises the envelope to UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::EmptyName`] when the name is empty, or
    /// [`EnvelopeError::Malformed`] if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.name.is_empty() {
            return Err(EnvelopeError::EmptyName);
        }
        serde_json::to_vec(self).map_err(|source| EnvelopeError::Malformed { source })
    }

    /// Parses an envelope from payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidEncoding`] for non UTF-8 input,
    /// [`EnvelopeError::Malformed`] when the JSON is not an envelope (missing
    /// or extra fields included) and [`EnvelopeError::EmptyName`] when the
    /// name is empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let text =
            std::str::from_utf8(bytes).map_err(|source| EnvelopeError::InvalidEncoding { source })?;
        let envelope: Self =
            serde_json::from_str(text).map_err(|source| EnvelopeError::Malformed { source })?;
        if envelope.name.is_empty() {
            return Err(EnvelopeError::EmptyName);
        }
        Ok(envelope)
    }
}

/// Renders the envelope as a shell-like line, e.g. `set -color 0xE09D37`.
impl fmt::Display for CommandEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.positional_args {
            write!(f, " {arg}")?;
        }
        for (key, value) in &self.keyword_args {
            write!(f, " -{key} {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn set_envelope() -> CommandEnvelope {
        CommandEnvelope::new("set")
            .with_kwarg("brightness", "0.6")
            .with_kwarg("color", "0xE09D37")
    }

    #[rstest]
    fn round_trips_through_bytes(set_envelope: CommandEnvelope) {
        let bytes = set_envelope.to_bytes().expect("serialise");
        let decoded = CommandEnvelope::from_bytes(&bytes).expect("deserialise");
        assert_eq!(decoded, set_envelope);
    }

    #[test]
    fn uses_producer_field_names() {
        let payload =
            br#"{"command": "echo", "args": ["pos_arg1", "pos_arg2"], "kwargs": {"key1": "value1"}}"#;
        let envelope = CommandEnvelope::from_bytes(payload).expect("valid envelope");
        assert_eq!(envelope.name, "echo");
        assert_eq!(envelope.positional_args, ["pos_arg1", "pos_arg2"]);
        assert_eq!(
            envelope.keyword_args.get("key1").map(String::as_str),
            Some("value1")
        );
    }

    #[rstest]
    #[case::missing_kwargs(br#"{"command": "off", "args": []}"#.as_slice())]
    #[case::missing_args(br#"{"command": "off", "kwargs": {}}"#.as_slice())]
    #[case::missing_command(br#"{"args": [], "kwargs": {}}"#.as_slice())]
    #[case::extra_field(br#"{"command": "off", "args": [], "kwargs": {}, "id": 1}"#.as_slice())]
    #[case::not_an_object(b"[1, 2, 3]".as_slice())]
    #[case::non_string_argument(br#"{"command": "off", "args": [1], "kwargs": {}}"#.as_slice())]
    #[case::truncated_json(br#"{"command": "off""#.as_slice())]
    fn rejects_malformed_envelopes(#[case] payload: &[u8]) {
        let error = CommandEnvelope::from_bytes(payload).expect_err("must fail");
        assert!(
            matches!(error, EnvelopeError::Malformed { .. }),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn rejects_invalid_utf8() {
        let error = CommandEnvelope::from_bytes(&[0xff, 0xfe]).expect_err("must fail");
        assert!(matches!(error, EnvelopeError::InvalidEncoding { .. }));
    }

    #[test]
    fn rejects_empty_names_in_both_directions() {
        let payload = br#"{"command": "", "args": [], "kwargs": {}}"#;
        assert!(matches!(
            CommandEnvelope::from_bytes(payload),
            Err(EnvelopeError::EmptyName)
        ));
        assert!(matches!(
            CommandEnvelope::new("").to_bytes(),
            Err(EnvelopeError::EmptyName)
        ));
    }

    #[rstest]
    fn displays_as_command_line(set_envelope: CommandEnvelope) {
        let envelope = set_envelope.with_arg("ring");
        assert_eq!(
            envelope.to_string(),
            "set ring -brightness 0.6 -color 0xE09D37"
        );
    }
}
