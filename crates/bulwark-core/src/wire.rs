//! Binary encoding of console traffic via `bitcode` with a versioned header.
//!
//! Every frame is a [`WireFrame`]: a [`WireHeader`] followed by the
//! payload. Frames with the wrong magic or a different version are rejected
//! before the payload is used.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::console::{ConsoleMessage, ShieldStateSnapshot};

/// Magic number identifying a shield console frame.
pub const WIRE_MAGIC: u32 = 0x5D1E_0001;

/// Current wire format version.
pub const WIRE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", WIRE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported wire version: expected {}, got {}", WIRE_VERSION, .0)]
    UnsupportedVersion(u32),
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireHeader {
    pub magic: u32,
    pub version: u32,
}

impl WireHeader {
    pub fn current() -> Self {
        Self {
            magic: WIRE_MAGIC,
            version: WIRE_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), WireError> {
        if self.magic != WIRE_MAGIC {
            return Err(WireError::InvalidMagic(self.magic));
        }
        if self.version != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame<T> {
    pub header: WireHeader,
    pub payload: T,
}

fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, WireError> {
    let frame = WireFrame {
        header: WireHeader::current(),
        payload,
    };
    bitcode::serialize(&frame).map_err(|e| WireError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, WireError> {
    let frame: WireFrame<T> =
        bitcode::deserialize(data).map_err(|e| WireError::Decode(e.to_string()))?;
    frame.header.validate()?;
    Ok(frame.payload)
}

pub fn encode_message(message: &ConsoleMessage) -> Result<Vec<u8>, WireError> {
    encode(message)
}

pub fn decode_message(data: &[u8]) -> Result<ConsoleMessage, WireError> {
    decode(data)
}

/// Encode a snapshot push. `None` tells the console it is unbound.
pub fn encode_snapshot(snapshot: &Option<ShieldStateSnapshot>) -> Result<Vec<u8>, WireError> {
    encode(snapshot)
}

pub fn decode_snapshot(data: &[u8]) -> Result<Option<ShieldStateSnapshot>, WireError> {
    decode(data)
}
