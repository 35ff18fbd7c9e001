//! The fixed command header preceding every payload.

use crate::types::ClientId;

use super::types::{CommandId, COMMAND_VERSION};
use super::DeserializeError;

/// Size of the command header in bytes.
pub const COMMAND_HEADER_SIZE: usize = 8;

/// Byte offset of the id field.
pub const COMMAND_POSITION_ID: usize = 0;
/// Byte offset of the version field.
pub const COMMAND_POSITION_VERSION: usize = 1;
/// Byte offset of the client field.
pub const COMMAND_POSITION_CLIENT: usize = 2;
/// Byte offset of the size field.
pub const COMMAND_POSITION_SIZE: usize = 4;
/// Byte offset of the first payload byte.
pub const COMMAND_POSITION_PAYLOAD: usize = 8;

/// Command header (8 bytes, little-endian multi-byte fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Command kind.
    pub id: CommandId,
    /// Protocol version (currently always 0).
    pub version: u8,
    /// Originating client.
    pub client: ClientId,
    /// Payload length in bytes.
    pub size: u32,
}

impl CommandHeader {
    /// Create a header for the given command kind and client with the
    /// current protocol version.
    pub fn new(id: CommandId, client: ClientId, size: u32) -> Self {
        Self {
            id,
            version: COMMAND_VERSION,
            client,
            size,
        }
    }

    /// Append the serialized header to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.id as u8);
        out.push(self.version);
        out.extend_from_slice(&self.client.0.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
    }

    /// Parse a header from the start of `data` and validate that the size
    /// field does not claim more payload than `data` holds.
    pub fn read(data: &[u8]) -> Result<Self, DeserializeError> {
        if data.len() < COMMAND_HEADER_SIZE {
            return Err(DeserializeError::TooShort {
                expected: COMMAND_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let id = CommandId::from_u8(data[COMMAND_POSITION_ID])
            .ok_or(DeserializeError::UnknownId(data[COMMAND_POSITION_ID]))?;
        let version = data[COMMAND_POSITION_VERSION];
        let client = ClientId(u16::from_le_bytes([
            data[COMMAND_POSITION_CLIENT],
            data[COMMAND_POSITION_CLIENT + 1],
        ]));
        let size = u32::from_le_bytes([
            data[COMMAND_POSITION_SIZE],
            data[COMMAND_POSITION_SIZE + 1],
            data[COMMAND_POSITION_SIZE + 2],
            data[COMMAND_POSITION_SIZE + 3],
        ]);

        let available = data.len() - COMMAND_HEADER_SIZE;
        if size as usize > available {
            return Err(DeserializeError::Truncated {
                expected: size as usize,
                actual: available,
            });
        }

        Ok(Self {
            id,
            version,
            client,
            size,
        })
    }

    /// The payload bytes described by this header within `data`.
    ///
    /// Must only be called on the buffer `read` succeeded on.
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[COMMAND_POSITION_PAYLOAD..COMMAND_POSITION_PAYLOAD + self.size as usize]
    }
}
