//! Interface Manager Type Definitions

use gnmi_cfgmgr_common::{CfgMgrError, CfgMgrResult, LifecycleState};
use serde::{Deserialize, Serialize};

/// Lowest usable VLAN id
pub const VLAN_ID_MIN: u16 = 1;
/// Highest usable VLAN id
pub const VLAN_ID_MAX: u16 = 4094;

fn default_switchport() -> bool {
    true
}

/// Declared attributes of one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    /// Interface name (e.g. `Ethernet1`), immutable once created
    pub name: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Layer-2 switchport (true) or routed port (false), immutable once created
    #[serde(default = "default_switchport")]
    pub switchport: bool,

    /// Access VLAN (switchport only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_vlan: Option<u16>,

    /// Trunk VLANs in declaration order (switchport only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trunk_vlans: Vec<u16>,

    /// IPv4 address in CIDR form, e.g. `10.0.0.1/24` (routed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
}

impl InterfaceSpec {
    /// A switchport with no VLANs
    pub fn switchport(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            switchport: true,
            access_vlan: None,
            trunk_vlans: Vec::new(),
            ipv4_address: None,
        }
    }

    /// A routed port with no address
    pub fn routed(name: impl Into<String>) -> Self {
        Self {
            switchport: false,
            ..Self::switchport(name)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_access_vlan(mut self, vlan: u16) -> Self {
        self.access_vlan = Some(vlan);
        self
    }

    pub fn with_trunk_vlans(mut self, vlans: impl IntoIterator<Item = u16>) -> Self {
        self.trunk_vlans = vlans.into_iter().collect();
        self
    }

    pub fn with_ipv4_address(mut self, cidr: impl Into<String>) -> Self {
        self.ipv4_address = Some(cidr.into());
        self
    }

    /// Check the declaration before anything is sent to the device
    ///
    /// CIDR syntax is checked by the assembler, which is the only place that
    /// parses it.
    pub fn validate(&self) -> CfgMgrResult<()> {
        if self.name.is_empty() {
            return Err(CfgMgrError::invalid_config("name", "must not be empty"));
        }
        if self.name.contains(['[', ']']) {
            return Err(CfgMgrError::invalid_config(
                "name",
                format!("'{}' must not contain '[' or ']'", self.name),
            ));
        }

        if self.switchport {
            if self.ipv4_address.is_some() {
                return Err(CfgMgrError::invalid_config(
                    "ipv4_address",
                    "cannot be set on a switchport",
                ));
            }
        } else if self.access_vlan.is_some() || !self.trunk_vlans.is_empty() {
            return Err(CfgMgrError::invalid_config(
                if self.access_vlan.is_some() {
                    "access_vlan"
                } else {
                    "trunk_vlans"
                },
                "cannot be set on a routed port",
            ));
        }

        if let Some(vlan) = self.access_vlan {
            check_vlan_id("access_vlan", vlan)?;
        }
        for vlan in &self.trunk_vlans {
            check_vlan_id("trunk_vlans", *vlan)?;
        }
        Ok(())
    }

    /// True if the VLAN attributes differ from `other`
    pub fn vlan_changed(&self, other: &InterfaceSpec) -> bool {
        self.access_vlan != other.access_vlan || self.trunk_vlans != other.trunk_vlans
    }
}

fn check_vlan_id(field: &str, vlan: u16) -> CfgMgrResult<()> {
    if (VLAN_ID_MIN..=VLAN_ID_MAX).contains(&vlan) {
        Ok(())
    } else {
        Err(CfgMgrError::invalid_config(
            field,
            format!("VLAN {} outside {}-{}", vlan, VLAN_ID_MIN, VLAN_ID_MAX),
        ))
    }
}

/// Host-persisted record of one managed interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceResource {
    /// Entity id; set on create, cleared on delete
    pub id: Option<String>,

    /// Last-known attributes
    pub attrs: InterfaceSpec,

    /// Lifecycle state
    pub state: LifecycleState,
}

impl InterfaceResource {
    /// An empty record, as the host holds it before create
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            attrs: InterfaceSpec::switchport(name),
            state: LifecycleState::Absent,
        }
    }

    /// Record of an interface already present on the device
    pub fn present(attrs: InterfaceSpec) -> Self {
        Self {
            id: Some(attrs.name.clone()),
            attrs,
            state: LifecycleState::Present,
        }
    }

    /// Entity id, or `MissingId`
    pub fn require_id(&self) -> CfgMgrResult<&str> {
        self.id.as_deref().ok_or(CfgMgrError::MissingId)
    }
}
