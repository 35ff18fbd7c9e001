//! Payload layout shared by the subscribe command family.

use crate::types::{ClientId, EventId, EventgroupId, InstanceId, MajorVersion, PendingId, ServiceId};

use super::DeserializeError;

/// Payload size of a subscribe-family command in bytes.
pub const SUBSCRIBE_PAYLOAD_SIZE: usize = 11;

/// The fields shared by `Subscribe`, `Unsubscribe`, `SubscribeAck`,
/// `SubscribeNack` and `UnsubscribeAck`.
///
/// Payload layout (little-endian multi-byte fields):
///
/// ```text
/// offset 0: service    u16
/// offset 2: instance   u16
/// offset 4: eventgroup u16
/// offset 6: major      u8
/// offset 7: event      u16
/// offset 9: pending_id u16
/// ```
///
/// Wildcard sentinels (`ServiceId::ANY`, …) are valid field values; the
/// codec carries them through without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeBase {
    /// Originating client.
    pub client: ClientId,
    /// Target service.
    pub service: ServiceId,
    /// Target instance.
    pub instance: InstanceId,
    /// Target eventgroup.
    pub eventgroup: EventgroupId,
    /// Major interface version.
    pub major: MajorVersion,
    /// Single event to subscribe, or `EventId::ANY` for the whole group.
    pub event: EventId,
    /// Correlation ID for the matching acknowledgement.
    pub pending_id: PendingId,
}

impl SubscribeBase {
    /// Append the serialized payload to `out`.
    ///
    /// Each write advances by the width of the field just written; the
    /// conformance test below pins every resulting offset.
    pub(super) fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.service.0.to_le_bytes());
        out.extend_from_slice(&self.instance.0.to_le_bytes());
        out.extend_from_slice(&self.eventgroup.0.to_le_bytes());
        out.push(self.major.0);
        out.extend_from_slice(&self.event.0.to_le_bytes());
        out.extend_from_slice(&self.pending_id.0.to_le_bytes());
    }

    /// Parse the payload of a subscribe-family command.
    pub(super) fn read_payload(
        client: ClientId,
        payload: &[u8],
    ) -> Result<Self, DeserializeError> {
        if payload.len() < SUBSCRIBE_PAYLOAD_SIZE {
            return Err(DeserializeError::Truncated {
                expected: SUBSCRIBE_PAYLOAD_SIZE,
                actual: payload.len(),
            });
        }

        Ok(Self {
            client,
            service: ServiceId(u16::from_le_bytes([payload[0], payload[1]])),
            instance: InstanceId(u16::from_le_bytes([payload[2], payload[3]])),
            eventgroup: EventgroupId(u16::from_le_bytes([payload[4], payload[5]])),
            major: MajorVersion(payload[6]),
            event: EventId(u16::from_le_bytes([payload[7], payload[8]])),
            pending_id: PendingId(u16::from_le_bytes([payload[9], payload[10]])),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, COMMAND_POSITION_PAYLOAD};

    fn sample() -> SubscribeBase {
        SubscribeBase {
            client: ClientId(0x0077),
            service: ServiceId(0x1234),
            instance: InstanceId(0x5678),
            eventgroup: EventgroupId(0x0ABC),
            major: MajorVersion(1),
            event: EventId(0x0DEF),
            pending_id: PendingId(0x0042),
        }
    }

    #[test]
    fn test_payload_roundtrip() {
        let base = sample();
        let mut payload = Vec::new();
        base.write_payload(&mut payload);
        assert_eq!(payload.len(), SUBSCRIBE_PAYLOAD_SIZE);

        let parsed = SubscribeBase::read_payload(base.client, &payload).unwrap();
        assert_eq!(parsed, base);
    }

    #[test]
    fn test_field_offsets_in_serialized_command() {
        // Pins the on-wire position of every field so that a skipped or
        // double-counted field width cannot go unnoticed.
        let mut buffer = Vec::new();
        Command::Subscribe(sample()).serialize(&mut buffer).unwrap();

        let p = COMMAND_POSITION_PAYLOAD;
        assert_eq!(&buffer[p..p + 2], &[0x34, 0x12]); // service
        assert_eq!(&buffer[p + 2..p + 4], &[0x78, 0x56]); // instance
        assert_eq!(&buffer[p + 4..p + 6], &[0xBC, 0x0A]); // eventgroup
        assert_eq!(buffer[p + 4], 0xBC); // eventgroup low byte at offset 12
        assert_eq!(buffer[p + 6], 0x01); // major
        assert_eq!(&buffer[p + 7..p + 9], &[0xEF, 0x0D]); // event at offset 15
        assert_eq!(&buffer[p + 9..p + 11], &[0x42, 0x00]); // pending_id
        assert_eq!(buffer.len(), p + SUBSCRIBE_PAYLOAD_SIZE);
    }

    #[test]
    fn test_wildcards_pass_through() {
        let base = SubscribeBase {
            client: ClientId(0x0001),
            service: ServiceId::ANY,
            instance: InstanceId::ANY,
            eventgroup: EventgroupId(0x0001),
            major: MajorVersion::ANY,
            event: EventId::ANY,
            pending_id: PendingId(0),
        };

        let mut payload = Vec::new();
        base.write_payload(&mut payload);
        let parsed = SubscribeBase::read_payload(base.client, &payload).unwrap();

        assert!(parsed.service.is_any());
        assert!(parsed.instance.is_any());
        assert!(parsed.major.is_any());
        assert!(parsed.event.is_any());
    }

    #[test]
    fn test_short_payload_rejected() {
        let base = sample();
        let mut payload = Vec::new();
        base.write_payload(&mut payload);

        for len in 0..SUBSCRIBE_PAYLOAD_SIZE {
            let result = SubscribeBase::read_payload(base.client, &payload[..len]);
            assert_eq!(
                result,
                Err(DeserializeError::Truncated {
                    expected: SUBSCRIBE_PAYLOAD_SIZE,
                    actual: len,
                })
            );
        }
    }
}
