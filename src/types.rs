//! Semantic identifier types shared by the command protocol and the endpoints.

/// Service ID - identifies a SOME/IP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServiceId(pub u16);

impl ServiceId {
    /// Wildcard service ID that matches any service.
    pub const ANY: ServiceId = ServiceId(0xFFFF);

    /// Check if this is the wildcard service ID.
    pub fn is_any(&self) -> bool {
        self.0 == 0xFFFF
    }
}

/// Instance ID - identifies an instance of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InstanceId(pub u16);

impl InstanceId {
    /// Wildcard instance ID that matches any instance.
    pub const ANY: InstanceId = InstanceId(0xFFFF);

    /// Check if this is the wildcard instance ID.
    pub fn is_any(&self) -> bool {
        self.0 == 0xFFFF
    }
}

/// Eventgroup ID - identifies a group of events within a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventgroupId(pub u16);

/// Event ID - identifies a single event within a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventId(pub u16);

impl EventId {
    /// Wildcard event ID that matches any event.
    pub const ANY: EventId = EventId(0xFFFF);

    /// Check if this is the wildcard event ID.
    pub fn is_any(&self) -> bool {
        self.0 == 0xFFFF
    }
}

/// Major interface version of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MajorVersion(pub u8);

impl MajorVersion {
    /// Wildcard major version that matches any version.
    pub const ANY: MajorVersion = MajorVersion(0xFF);

    /// Check if this is the wildcard major version.
    pub fn is_any(&self) -> bool {
        self.0 == 0xFF
    }
}

/// Minor interface version of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MinorVersion(pub u32);

impl MinorVersion {
    /// Wildcard minor version that matches any version.
    pub const ANY: MinorVersion = MinorVersion(0xFFFF_FFFF);
}

/// Pending ID - correlates a subscription request with its acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PendingId(pub u16);

/// Client ID - identifies the application that originated a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClientId(pub u16);

impl ClientId {
    /// The unassigned client ID used before the routing daemon has
    /// answered the client assignment request.
    pub const UNASSIGNED: ClientId = ClientId(0x0000);
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl std::fmt::Display for EventgroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards() {
        assert!(ServiceId::ANY.is_any());
        assert!(!ServiceId(0x1234).is_any());
        assert!(InstanceId::ANY.is_any());
        assert!(EventId::ANY.is_any());
        assert!(MajorVersion::ANY.is_any());
        assert_eq!(MajorVersion::ANY.0, 0xFF);
        assert_eq!(MinorVersion::ANY.0, 0xFFFF_FFFF);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ServiceId(0x1234)), "0x1234");
        assert_eq!(format!("{}", ClientId(0x00AB)), "0x00AB");
    }
}
