//! Command protocol type definitions.

use super::header::COMMAND_HEADER_SIZE;

/// Protocol version carried in every command header (currently always 0).
pub const COMMAND_VERSION: u8 = 0x00;

/// Serialized size of an `AssignClientAck` command: the 8-byte header plus
/// the assigned client ID and one reserved byte. The first frame a client
/// accepts from the routing daemon carries exactly this command.
pub const ASSIGN_CLIENT_ACK_COMMAND_SIZE: usize = COMMAND_HEADER_SIZE + 3;

/// The closed set of command kinds exchanged with the routing daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Request a client ID assignment (carries the application name).
    AssignClient = 0x00,
    /// Answer to `AssignClient` with the assigned client ID.
    AssignClientAck = 0x01,
    /// Offer a service instance.
    OfferService = 0x10,
    /// Withdraw a service offer.
    StopOfferService = 0x11,
    /// Subscribe to an eventgroup.
    Subscribe = 0x12,
    /// Cancel an eventgroup subscription.
    Unsubscribe = 0x13,
    /// Reject a subscription.
    SubscribeNack = 0x16,
    /// Acknowledge a subscription.
    SubscribeAck = 0x17,
    /// Acknowledge an unsubscription.
    UnsubscribeAck = 0x21,
    /// Answer to a security policy update.
    UpdateSecurityPolicyResponse = 0x24,
    /// Answer to a security policy removal.
    RemoveSecurityPolicyResponse = 0x26,
    /// Suspend event distribution.
    Suspend = 0x2A,
}

impl CommandId {
    /// Create a CommandId from a raw byte value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::AssignClient),
            0x01 => Some(Self::AssignClientAck),
            0x10 => Some(Self::OfferService),
            0x11 => Some(Self::StopOfferService),
            0x12 => Some(Self::Subscribe),
            0x13 => Some(Self::Unsubscribe),
            0x16 => Some(Self::SubscribeNack),
            0x17 => Some(Self::SubscribeAck),
            0x21 => Some(Self::UnsubscribeAck),
            0x24 => Some(Self::UpdateSecurityPolicyResponse),
            0x26 => Some(Self::RemoveSecurityPolicyResponse),
            0x2A => Some(Self::Suspend),
            _ => None,
        }
    }

    /// Check if this command belongs to the subscribe family, all of which
    /// share the same payload layout.
    pub fn is_subscribe_family(&self) -> bool {
        matches!(
            self,
            Self::Subscribe
                | Self::Unsubscribe
                | Self::SubscribeNack
                | Self::SubscribeAck
                | Self::UnsubscribeAck
        )
    }
}
