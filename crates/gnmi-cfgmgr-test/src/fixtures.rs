//! Test fixtures for device responses
//!
//! Builds get responses shaped the way an OpenConfig device answers a get on
//! an interface: full-document updates at the interface path, or leaf
//! updates under a prefix.

use gnmi_cfgmgr_common::{GetResponse, GnmiPath, Notification, Update};
use serde_json::{json, Value};

/// Interface list entry path for `name`
pub fn interface_path(name: &str) -> GnmiPath {
    GnmiPath::parse(&format!("/interfaces/interface[name={}]", name))
        .unwrap_or_else(|e| panic!("bad fixture path for {}: {}", name, e))
}

/// Parse a fixture path
pub fn path(s: &str) -> GnmiPath {
    GnmiPath::parse(s).unwrap_or_else(|e| panic!("bad fixture path {}: {}", s, e))
}

/// Notification builder
#[derive(Debug, Default)]
pub struct NotificationBuilder {
    prefix: Option<GnmiPath>,
    updates: Vec<Update>,
}

impl NotificationBuilder {
    /// Start a notification without a prefix
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a notification with a prefix
    pub fn with_prefix(prefix: GnmiPath) -> Self {
        Self {
            prefix: Some(prefix),
            updates: Vec::new(),
        }
    }

    /// Add an update carrying a JSON value
    pub fn update(mut self, path: GnmiPath, val: &Value) -> Self {
        self.updates.push(Update::new(path, val.to_string()));
        self
    }

    /// Add an update carrying a raw (possibly malformed) value
    pub fn raw_update(mut self, path: GnmiPath, val: impl Into<String>) -> Self {
        self.updates.push(Update::new(path, val));
        self
    }

    /// Finish the notification
    pub fn build(self) -> Notification {
        Notification {
            prefix: self.prefix,
            updates: self.updates,
        }
    }

    /// Finish as a single-notification response
    pub fn into_response(self) -> GetResponse {
        GetResponse::single(self.build())
    }
}

/// Canned interface documents (RFC 7951 JSON, module-qualified)
pub mod documents {
    use super::*;

    /// Routed interface with one IPv4 address
    pub fn routed(name: &str, description: &str, ip: &str, prefix_length: u8) -> Value {
        json!({
            "openconfig-interfaces:name": name,
            "openconfig-interfaces:config": {
                "name": name,
                "description": description,
            },
            "openconfig-interfaces:subinterfaces": {
                "subinterface": [{
                    "index": 0,
                    "config": { "index": 0 },
                    "openconfig-if-ip:ipv4": {
                        "config": { "enabled": true },
                        "addresses": {
                            "address": [{
                                "ip": ip,
                                "config": { "ip": ip, "prefix-length": prefix_length },
                            }]
                        }
                    }
                }]
            }
        })
    }

    /// Access-mode switchport
    pub fn access(name: &str, description: &str, vlan: u16) -> Value {
        json!({
            "openconfig-interfaces:name": name,
            "openconfig-interfaces:config": {
                "name": name,
                "description": description,
            },
            "openconfig-if-ethernet:ethernet": {
                "openconfig-vlan:switched-vlan": {
                    "config": {
                        "access-vlan": vlan,
                        "arista-vlan-augments:interface-mode": "ACCESS",
                    }
                }
            }
        })
    }

    /// Trunk-mode switchport; entries may be ids or `"low..high"` ranges
    pub fn trunk(name: &str, trunk_vlans: Value) -> Value {
        json!({
            "openconfig-interfaces:name": name,
            "openconfig-interfaces:config": { "name": name },
            "openconfig-if-ethernet:ethernet": {
                "openconfig-vlan:switched-vlan": {
                    "config": {
                        "trunk-vlans": trunk_vlans,
                        "arista-vlan-augments:interface-mode": "TRUNK",
                    }
                }
            }
        })
    }
}

/// Response carrying one full interface document at the interface path
pub fn interface_response(name: &str, document: &Value) -> GetResponse {
    NotificationBuilder::new()
        .update(interface_path(name), document)
        .into_response()
}
