//! The tagged command set and its serialization dispatch.

use crate::types::{ClientId, InstanceId, MajorVersion, MinorVersion, ServiceId};

use super::header::{CommandHeader, COMMAND_HEADER_SIZE};
use super::security::{SecurityPolicyResponse, SECURITY_RESPONSE_PAYLOAD_SIZE};
use super::subscribe::{SubscribeBase, SUBSCRIBE_PAYLOAD_SIZE};
use super::types::CommandId;
use super::{DeserializeError, SerializeError};

/// Request a client ID from the routing daemon.
///
/// The first command an application sends; the payload is the application
/// name as UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignClient {
    /// Requested client, `ClientId::UNASSIGNED` on first contact.
    pub client: ClientId,
    /// Application name.
    pub name: String,
}

/// The daemon's answer to [`AssignClient`].
///
/// Payload: the assigned client ID followed by one reserved byte (written
/// as zero, ignored on decode). This is the first command a client accepts
/// on its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignClientAck {
    /// Client the answer is addressed to (header field).
    pub client: ClientId,
    /// The client ID the daemon assigned.
    pub assigned: ClientId,
}

/// Offer (or withdraw) a service instance.
///
/// Payload (little-endian): service u16, instance u16, major u8, minor u32.
/// Shared by `OfferService` and `StopOfferService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferBase {
    /// Originating client.
    pub client: ClientId,
    /// Offered service.
    pub service: ServiceId,
    /// Offered instance.
    pub instance: InstanceId,
    /// Major interface version.
    pub major: MajorVersion,
    /// Minor interface version.
    pub minor: MinorVersion,
}

/// Payload size of an offer-family command in bytes.
const OFFER_PAYLOAD_SIZE: usize = 9;

/// Suspend event distribution; header only, no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suspend {
    /// Originating client.
    pub client: ClientId,
}

/// A control command exchanged between an application and the routing
/// daemon.
///
/// Every variant shares the fixed 8-byte header; the payload layout is
/// per-variant. See the module docs for the header layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request a client ID assignment.
    AssignClient(AssignClient),
    /// Answer to a client ID assignment request.
    AssignClientAck(AssignClientAck),
    /// Offer a service instance.
    OfferService(OfferBase),
    /// Withdraw a service offer.
    StopOfferService(OfferBase),
    /// Subscribe to an eventgroup.
    Subscribe(SubscribeBase),
    /// Cancel an eventgroup subscription.
    Unsubscribe(SubscribeBase),
    /// Reject a subscription.
    SubscribeNack(SubscribeBase),
    /// Acknowledge a subscription.
    SubscribeAck(SubscribeBase),
    /// Acknowledge an unsubscription.
    UnsubscribeAck(SubscribeBase),
    /// Answer to a security policy update.
    UpdateSecurityPolicyResponse(SecurityPolicyResponse),
    /// Answer to a security policy removal.
    RemoveSecurityPolicyResponse(SecurityPolicyResponse),
    /// Suspend event distribution.
    Suspend(Suspend),
}

impl Command {
    /// The command kind of this variant.
    pub fn id(&self) -> CommandId {
        match self {
            Self::AssignClient(_) => CommandId::AssignClient,
            Self::AssignClientAck(_) => CommandId::AssignClientAck,
            Self::OfferService(_) => CommandId::OfferService,
            Self::StopOfferService(_) => CommandId::StopOfferService,
            Self::Subscribe(_) => CommandId::Subscribe,
            Self::Unsubscribe(_) => CommandId::Unsubscribe,
            Self::SubscribeNack(_) => CommandId::SubscribeNack,
            Self::SubscribeAck(_) => CommandId::SubscribeAck,
            Self::UnsubscribeAck(_) => CommandId::UnsubscribeAck,
            Self::UpdateSecurityPolicyResponse(_) => CommandId::UpdateSecurityPolicyResponse,
            Self::RemoveSecurityPolicyResponse(_) => CommandId::RemoveSecurityPolicyResponse,
            Self::Suspend(_) => CommandId::Suspend,
        }
    }

    /// The originating client carried in the header.
    pub fn client(&self) -> ClientId {
        match self {
            Self::AssignClient(c) => c.client,
            Self::AssignClientAck(c) => c.client,
            Self::OfferService(c) | Self::StopOfferService(c) => c.client,
            Self::Subscribe(c)
            | Self::Unsubscribe(c)
            | Self::SubscribeNack(c)
            | Self::SubscribeAck(c)
            | Self::UnsubscribeAck(c) => c.client,
            Self::UpdateSecurityPolicyResponse(c) | Self::RemoveSecurityPolicyResponse(c) => {
                c.client
            }
            Self::Suspend(c) => c.client,
        }
    }

    /// Payload length in bytes of the serialized form.
    fn payload_size(&self) -> usize {
        match self {
            Self::AssignClient(c) => c.name.len(),
            Self::AssignClientAck(_) => 3,
            Self::OfferService(_) | Self::StopOfferService(_) => OFFER_PAYLOAD_SIZE,
            Self::Subscribe(_)
            | Self::Unsubscribe(_)
            | Self::SubscribeNack(_)
            | Self::SubscribeAck(_)
            | Self::UnsubscribeAck(_) => SUBSCRIBE_PAYLOAD_SIZE,
            Self::UpdateSecurityPolicyResponse(_) | Self::RemoveSecurityPolicyResponse(_) => {
                SECURITY_RESPONSE_PAYLOAD_SIZE
            }
            Self::Suspend(_) => 0,
        }
    }

    /// Append the serialized command (header + payload) to `out`.
    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<(), SerializeError> {
        let size = self.payload_size();
        if size > u32::MAX as usize {
            return Err(SerializeError::PayloadTooLarge {
                size,
                max: u32::MAX as usize,
            });
        }

        out.reserve(COMMAND_HEADER_SIZE + size);
        CommandHeader::new(self.id(), self.client(), size as u32).write(out);

        match self {
            Self::AssignClient(c) => out.extend_from_slice(c.name.as_bytes()),
            Self::AssignClientAck(c) => {
                out.extend_from_slice(&c.assigned.0.to_le_bytes());
                out.push(0x00); // reserved
            }
            Self::OfferService(c) | Self::StopOfferService(c) => {
                out.extend_from_slice(&c.service.0.to_le_bytes());
                out.extend_from_slice(&c.instance.0.to_le_bytes());
                out.push(c.major.0);
                out.extend_from_slice(&c.minor.0.to_le_bytes());
            }
            Self::Subscribe(c)
            | Self::Unsubscribe(c)
            | Self::SubscribeNack(c)
            | Self::SubscribeAck(c)
            | Self::UnsubscribeAck(c) => c.write_payload(out),
            Self::UpdateSecurityPolicyResponse(c) | Self::RemoveSecurityPolicyResponse(c) => {
                c.write_payload(out)
            }
            Self::Suspend(_) => {}
        }

        Ok(())
    }

    /// Parse a command from a buffer holding header and payload.
    pub fn deserialize(data: &[u8]) -> Result<Command, DeserializeError> {
        let header = CommandHeader::read(data)?;
        let client = header.client;
        let payload = header.payload(data);

        match header.id {
            CommandId::AssignClient => Ok(Self::AssignClient(AssignClient {
                client,
                name: String::from_utf8_lossy(payload).into_owned(),
            })),
            CommandId::AssignClientAck => {
                if payload.len() < 3 {
                    return Err(DeserializeError::Truncated {
                        expected: 3,
                        actual: payload.len(),
                    });
                }
                Ok(Self::AssignClientAck(AssignClientAck {
                    client,
                    assigned: ClientId(u16::from_le_bytes([payload[0], payload[1]])),
                }))
            }
            CommandId::OfferService | CommandId::StopOfferService => {
                if payload.len() < OFFER_PAYLOAD_SIZE {
                    return Err(DeserializeError::Truncated {
                        expected: OFFER_PAYLOAD_SIZE,
                        actual: payload.len(),
                    });
                }
                let offer = OfferBase {
                    client,
                    service: ServiceId(u16::from_le_bytes([payload[0], payload[1]])),
                    instance: InstanceId(u16::from_le_bytes([payload[2], payload[3]])),
                    major: MajorVersion(payload[4]),
                    minor: MinorVersion(u32::from_le_bytes([
                        payload[5], payload[6], payload[7], payload[8],
                    ])),
                };
                if header.id == CommandId::OfferService {
                    Ok(Self::OfferService(offer))
                } else {
                    Ok(Self::StopOfferService(offer))
                }
            }
            CommandId::Subscribe => {
                Ok(Self::Subscribe(SubscribeBase::read_payload(client, payload)?))
            }
            CommandId::Unsubscribe => Ok(Self::Unsubscribe(SubscribeBase::read_payload(
                client, payload,
            )?)),
            CommandId::SubscribeNack => Ok(Self::SubscribeNack(SubscribeBase::read_payload(
                client, payload,
            )?)),
            CommandId::SubscribeAck => Ok(Self::SubscribeAck(SubscribeBase::read_payload(
                client, payload,
            )?)),
            CommandId::UnsubscribeAck => Ok(Self::UnsubscribeAck(SubscribeBase::read_payload(
                client, payload,
            )?)),
            CommandId::UpdateSecurityPolicyResponse => Ok(Self::UpdateSecurityPolicyResponse(
                SecurityPolicyResponse::read_payload(client, payload)?,
            )),
            CommandId::RemoveSecurityPolicyResponse => Ok(Self::RemoveSecurityPolicyResponse(
                SecurityPolicyResponse::read_payload(client, payload)?,
            )),
            CommandId::Suspend => Ok(Self::Suspend(Suspend { client })),
        }
    }
}
