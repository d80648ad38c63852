//! Value codecs
//!
//! A codec turns a serializable value into the opaque string stored in a
//! backing store, and back. Whatever the format, a nil value (`None`, `()`)
//! encodes to the empty string so that it reads back as "no value".

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while encoding or decoding a value
#[derive(Error, Debug)]
pub enum CodecError {
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR encoding failed
    #[error("CBOR encoding failed: {0}")]
    CborEncode(String),

    /// CBOR decoding failed
    #[error("CBOR decoding failed: {0}")]
    CborDecode(String),

    /// Stored text is not valid base64
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encode/decode pair used by the settings manager
pub trait Codec: Send + Sync {
    /// Short identifier, used in logs
    fn name(&self) -> &'static str;

    /// Encode a value; nil values produce an empty string
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError>;

    /// Decode a non-empty stored string
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError>;
}

/// JSON text codec (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        let text = serde_json::to_string(value)?;
        if text == "null" {
            return Ok(String::new());
        }
        Ok(text)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// CBOR bytes, base64-armored so they fit the text column
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

/// CBOR encoding of a null item
const CBOR_NULL: u8 = 0xf6;

impl Codec for CborCodec {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(value, &mut bytes)
            .map_err(|e| CodecError::CborEncode(e.to_string()))?;
        if bytes == [CBOR_NULL] {
            return Ok(String::new());
        }
        Ok(STANDARD.encode(bytes))
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        let bytes = STANDARD.decode(text.trim())?;
        ciborium::from_reader(bytes.as_slice()).map_err(|e| CodecError::CborDecode(e.to_string()))
    }
}
