//! Security policy response payloads.

use crate::types::ClientId;

use super::DeserializeError;

/// Payload size of a security policy response in bytes.
pub(super) const SECURITY_RESPONSE_PAYLOAD_SIZE: usize = 4;

/// Answer to a security policy update or removal, carrying the update ID
/// the daemon used to distribute the policy change.
///
/// Shared by `UpdateSecurityPolicyResponse` and
/// `RemoveSecurityPolicyResponse`; the command id distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityPolicyResponse {
    /// Originating client.
    pub client: ClientId,
    /// The update this response acknowledges.
    pub update_id: u32,
}

impl SecurityPolicyResponse {
    /// Append the serialized payload to `out`.
    pub(super) fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.update_id.to_le_bytes());
    }

    /// Parse the payload of a security policy response.
    pub(super) fn read_payload(
        client: ClientId,
        payload: &[u8],
    ) -> Result<Self, DeserializeError> {
        if payload.len() < SECURITY_RESPONSE_PAYLOAD_SIZE {
            return Err(DeserializeError::Truncated {
                expected: SECURITY_RESPONSE_PAYLOAD_SIZE,
                actual: payload.len(),
            });
        }

        Ok(Self {
            client,
            update_id: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
        })
    }
}
