use crate::protocol::parts::option_part::{OptionId, OptionPart};

// Failover host information from the CONNECT reply. The engine retains it
// for embedding applications but does not act on it.
pub type Topology = OptionPart<TopologyAttrId>;

#[derive(Clone, Debug, PartialEq)]
pub enum TopologyAttrId {
    HostName,         //  1, string
    HostPortNumber,   //  2, int
    TenantName,       //  3, string
    LoadFactor,       //  4, double
    VolumeId,         //  5, int
    IsMaster,         //  6, bool
    IsCurrentSession, //  7, bool
    ServiceType,      //  8, int
    IsStandby,        // 10, bool
    SiteType,         // 13, int
    Other(u8),
}

impl OptionId for TopologyAttrId {
    fn from_wire(id: u8) -> Self {
        match id {
            1 => Self::HostName,
            2 => Self::HostPortNumber,
            3 => Self::TenantName,
            4 => Self::LoadFactor,
            5 => Self::VolumeId,
            6 => Self::IsMaster,
            7 => Self::IsCurrentSession,
            8 => Self::ServiceType,
            10 => Self::IsStandby,
            13 => Self::SiteType,
            id => Self::Other(id),
        }
    }

    fn wire_id(&self) -> u8 {
        match *self {
            Self::HostName => 1,
            Self::HostPortNumber => 2,
            Self::TenantName => 3,
            Self::LoadFactor => 4,
            Self::VolumeId => 5,
            Self::IsMaster => 6,
            Self::IsCurrentSession => 7,
            Self::ServiceType => 8,
            Self::IsStandby => 10,
            Self::SiteType => 13,
            Self::Other(id) => id,
        }
    }
}
