//! OpenConfig interface subtree and its RFC 7951 JSON codec
//!
//! The structs mirror the schema branches this manager touches. Every node is
//! optional so that a subtree only carries the branches that were populated;
//! absent branches are omitted from emitted documents rather than zeroed.
//!
//! Emitted documents are canonical: keys sorted, top-level members qualified
//! with the node's module, and children that cross into another module
//! qualified with theirs. On decode, `openconfig-*` qualifications are
//! stripped so documents from devices that qualify every member parse the
//! same way; vendor augment names keep their prefix.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tables::{modules, SUBINTERFACE_INDEX};

/// `interfaces/interface` list entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<InterfaceConfig>,

    #[serde(
        rename(serialize = "openconfig-if-ethernet:ethernet", deserialize = "ethernet"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ethernet: Option<Ethernet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subinterfaces: Option<Subinterfaces>,
}

/// `interface/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `interface/ethernet`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ethernet {
    #[serde(
        rename(serialize = "openconfig-vlan:switched-vlan", deserialize = "switched-vlan"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub switched_vlan: Option<SwitchedVlan>,
}

/// `ethernet/switched-vlan`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchedVlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SwitchedVlanConfig>,
}

/// `switched-vlan/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchedVlanConfig {
    #[serde(rename = "access-vlan", default, skip_serializing_if = "Option::is_none")]
    pub access_vlan: Option<u16>,

    #[serde(rename = "trunk-vlans", default, skip_serializing_if = "Vec::is_empty")]
    pub trunk_vlans: Vec<TrunkVlan>,

    /// Standard OpenConfig mode leaf; read but never written
    #[serde(rename = "interface-mode", default, skip_serializing_if = "Option::is_none")]
    pub interface_mode: Option<InterfaceMode>,

    /// Vendor augment carrying the mode label the device acts on
    #[serde(
        rename = "arista-vlan-augments:interface-mode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub vendor_interface_mode: Option<InterfaceMode>,
}

impl SwitchedVlanConfig {
    /// True when no VLAN is configured
    pub fn is_empty(&self) -> bool {
        self.access_vlan.is_none() && self.trunk_vlans.is_empty()
    }

    /// Effective mode label, preferring the vendor leaf
    pub fn mode(&self) -> Option<InterfaceMode> {
        self.vendor_interface_mode.or(self.interface_mode)
    }

    /// Trunk VLAN ids with ranges expanded, in declaration order
    pub fn trunk_vlan_ids(&self) -> Result<Vec<u16>, String> {
        let mut ids = Vec::new();
        for entry in &self.trunk_vlans {
            ids.extend(entry.expand()?);
        }
        Ok(ids)
    }
}

/// Switchport mode label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceMode {
    Access,
    Trunk,
}

/// `trunk-vlans` leaf-list entry: a single id or a `low..high` range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrunkVlan {
    Id(u16),
    Range(String),
}

impl TrunkVlan {
    /// Expand the entry into individual VLAN ids
    pub fn expand(&self) -> Result<Vec<u16>, String> {
        match self {
            TrunkVlan::Id(id) => Ok(vec![*id]),
            TrunkVlan::Range(range) => {
                let (low, high) = range
                    .split_once("..")
                    .ok_or_else(|| format!("invalid trunk VLAN range '{}'", range))?;
                let low: u16 = low
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid trunk VLAN range '{}'", range))?;
                let high: u16 = high
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid trunk VLAN range '{}'", range))?;
                if low > high {
                    return Err(format!("inverted trunk VLAN range '{}'", range));
                }
                Ok((low..=high).collect())
            }
        }
    }
}

/// `interface/subinterfaces`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subinterfaces {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subinterface: Vec<Subinterface>,
}

/// `subinterfaces/subinterface` list entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subinterface {
    #[serde(default)]
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SubinterfaceConfig>,

    #[serde(
        rename(serialize = "openconfig-if-ip:ipv4", deserialize = "ipv4"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ipv4: Option<Ipv4>,
}

impl Subinterface {
    /// Create a subinterface entry with its config index set
    pub fn new(index: u32) -> Self {
        Self {
            index,
            config: Some(SubinterfaceConfig { index: Some(index) }),
            ipv4: None,
        }
    }

    /// The IPv4 node, created if absent
    pub fn ipv4_mut(&mut self) -> &mut Ipv4 {
        self.ipv4.get_or_insert_with(Ipv4::default)
    }
}

/// `subinterface/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubinterfaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// `subinterface/ipv4`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Ipv4Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Addresses>,
}

impl Ipv4 {
    /// Set `config/enabled`
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.get_or_insert_with(Ipv4Config::default).enabled = Some(enabled);
    }

    /// Value of `config/enabled`, if set
    pub fn enabled(&self) -> Option<bool> {
        self.config.as_ref().and_then(|c| c.enabled)
    }

    /// Address entries (empty if the container is absent)
    pub fn address_list(&self) -> &[Address] {
        self.addresses
            .as_ref()
            .map(|a| a.address.as_slice())
            .unwrap_or_default()
    }

    /// Append an address entry
    pub fn push_address(&mut self, address: Address) {
        self.addresses
            .get_or_insert_with(Addresses::default)
            .address
            .push(address);
    }
}

/// `ipv4/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// `ipv4/addresses`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

/// `addresses/address` list entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub ip: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<AddressConfig>,
}

impl Address {
    /// Create an address entry with key and config populated
    pub fn new(ip: impl Into<String>, prefix_length: u8) -> Self {
        let ip = ip.into();
        Self {
            config: Some(AddressConfig {
                ip: Some(ip.clone()),
                prefix_length: Some(prefix_length),
            }),
            ip,
        }
    }

    /// Prefix length from `config/prefix-length`
    pub fn prefix_length(&self) -> Option<u8> {
        self.config.as_ref().and_then(|c| c.prefix_length)
    }
}

/// `address/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(rename = "prefix-length", default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

impl Interface {
    /// Empty subtree rooted at `name`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            config: Some(InterfaceConfig {
                name: Some(name.clone()),
                description: None,
            }),
            name: Some(name),
            ethernet: None,
            subinterfaces: None,
        }
    }

    /// `config/description`
    pub fn description(&self) -> Option<&str> {
        self.config.as_ref()?.description.as_deref()
    }

    /// Set `config/description`
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.config
            .get_or_insert_with(InterfaceConfig::default)
            .description = Some(description.into());
    }

    /// `ethernet/switched-vlan/config`, if present
    pub fn switched_vlan_config(&self) -> Option<&SwitchedVlanConfig> {
        self.ethernet.as_ref()?.switched_vlan.as_ref()?.config.as_ref()
    }

    /// `ethernet/switched-vlan/config`, created along the way if absent
    pub fn switched_vlan_config_mut(&mut self) -> &mut SwitchedVlanConfig {
        self.ethernet
            .get_or_insert_with(Ethernet::default)
            .switched_vlan
            .get_or_insert_with(SwitchedVlan::default)
            .config
            .get_or_insert_with(SwitchedVlanConfig::default)
    }

    /// Subinterface `index`, if present
    pub fn subinterface(&self, index: u32) -> Option<&Subinterface> {
        self.subinterfaces
            .as_ref()?
            .subinterface
            .iter()
            .find(|s| s.index == index)
    }

    /// Subinterface `index`, created if absent
    pub fn subinterface_mut(&mut self, index: u32) -> &mut Subinterface {
        let list = &mut self
            .subinterfaces
            .get_or_insert_with(Subinterfaces::default)
            .subinterface;
        let pos = match list.iter().position(|s| s.index == index) {
            Some(pos) => pos,
            None => {
                list.push(Subinterface::new(index));
                list.len() - 1
            }
        };
        &mut list[pos]
    }

    /// IPv4 node of the addressing subinterface
    pub fn ipv4(&self) -> Option<&Ipv4> {
        self.subinterface(SUBINTERFACE_INDEX)?.ipv4.as_ref()
    }
}

/// A subtree node that can be emitted as a standalone document
pub trait YangNode {
    /// Module owning the node's children
    fn module(&self) -> &'static str;

    /// Unqualified JSON form
    fn to_value(&self) -> serde_json::Result<Value>;
}

macro_rules! yang_node {
    ($($ty:ty => $module:expr),* $(,)?) => {
        $(
            impl YangNode for $ty {
                fn module(&self) -> &'static str {
                    $module
                }

                fn to_value(&self) -> serde_json::Result<Value> {
                    serde_json::to_value(self)
                }
            }
        )*
    };
}

yang_node! {
    Interface => modules::INTERFACES,
    SwitchedVlanConfig => modules::VLAN,
    Ipv4 => modules::IP,
}

/// Emit a node as a canonical RFC 7951 document
pub fn emit_json(node: &dyn YangNode) -> serde_json::Result<String> {
    let value = match node.to_value()? {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .map(|(k, v)| (qualify(node.module(), k), v))
                .collect(),
        ),
        other => other,
    };
    serde_json::to_string_pretty(&sort_keys(value))
}

/// Parse a document (or a grafted fragment) into a subtree type
pub fn parse_json<T: DeserializeOwned>(doc: &str) -> serde_json::Result<T> {
    let value: Value = serde_json::from_str(doc)?;
    from_value(value)
}

/// Deserialize an already-parsed value, stripping OpenConfig qualifications
pub fn from_value<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(unqualify(value))
}

fn qualify(module: &str, key: String) -> String {
    if key.contains(':') {
        key
    } else {
        format!("{}:{}", module, key)
    }
}

/// Strip `openconfig-*:` prefixes from every member name
pub fn unqualify(value: Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .map(|(k, v)| {
                    let key = match k.split_once(':') {
                        Some((module, local)) if module.starts_with("openconfig-") => {
                            local.to_string()
                        }
                        _ => k,
                    };
                    (key, unqualify(v))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(unqualify).collect()),
        other => other,
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut entries: Vec<(String, Value)> = members.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, sort_keys(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_emit_interface_qualifies_modules() {
        let mut intf = Interface::new("Ethernet1");
        intf.set_description("uplink");
        intf.switched_vlan_config_mut().access_vlan = Some(10);

        let doc: Value = serde_json::from_str(&emit_json(&intf).unwrap()).unwrap();
        assert_eq!(
            doc,
            json!({
                "openconfig-interfaces:name": "Ethernet1",
                "openconfig-interfaces:config": { "name": "Ethernet1", "description": "uplink" },
                "openconfig-if-ethernet:ethernet": {
                    "openconfig-vlan:switched-vlan": { "config": { "access-vlan": 10 } }
                }
            })
        );
    }

    #[test]
    fn test_emit_keys_sorted() {
        let mut intf = Interface::new("Ethernet1");
        intf.set_description("x");
        let doc = emit_json(&intf).unwrap();
        let config = doc.find("openconfig-interfaces:config").unwrap();
        let name = doc.find("openconfig-interfaces:name").unwrap();
        assert!(config < name);
    }

    #[test]
    fn test_emit_vlan_config_root() {
        let config = SwitchedVlanConfig {
            trunk_vlans: vec![TrunkVlan::Id(10), TrunkVlan::Id(20)],
            vendor_interface_mode: Some(InterfaceMode::Trunk),
            ..Default::default()
        };
        let doc: Value = serde_json::from_str(&emit_json(&config).unwrap()).unwrap();
        assert_eq!(
            doc,
            json!({
                "openconfig-vlan:trunk-vlans": [10, 20],
                "arista-vlan-augments:interface-mode": "TRUNK"
            })
        );
    }

    #[test]
    fn test_emit_ipv4_root() {
        let mut ipv4 = Ipv4::default();
        ipv4.set_enabled(true);
        ipv4.push_address(Address::new("10.0.0.1", 24));
        let doc: Value = serde_json::from_str(&emit_json(&ipv4).unwrap()).unwrap();
        assert_eq!(
            doc,
            json!({
                "openconfig-if-ip:config": { "enabled": true },
                "openconfig-if-ip:addresses": {
                    "address": [{ "ip": "10.0.0.1", "config": { "ip": "10.0.0.1", "prefix-length": 24 } }]
                }
            })
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let mut intf = Interface::new("Ethernet1");
        intf.set_description("core link");
        let sub = intf.subinterface_mut(0);
        sub.ipv4_mut().set_enabled(true);
        sub.ipv4_mut().push_address(Address::new("192.0.2.1", 31));

        let parsed: Interface = parse_json(&emit_json(&intf).unwrap()).unwrap();
        assert_eq!(parsed, intf);
    }

    #[test]
    fn test_parse_fully_qualified_device_document() {
        let doc = json!({
            "openconfig-interfaces:config": {
                "openconfig-interfaces:description": "from device",
                "openconfig-interfaces:mtu": 9214
            },
            "openconfig-if-ethernet:ethernet": {
                "openconfig-vlan:switched-vlan": {
                    "openconfig-vlan:config": {
                        "openconfig-vlan:access-vlan": 30,
                        "openconfig-vlan:interface-mode": "ACCESS"
                    }
                }
            }
        });
        let intf: Interface = parse_json(&doc.to_string()).unwrap();
        assert_eq!(intf.description(), Some("from device"));
        let vlan = intf.switched_vlan_config().unwrap();
        assert_eq!(vlan.access_vlan, Some(30));
        assert_eq!(vlan.mode(), Some(InterfaceMode::Access));
    }

    #[test]
    fn test_trunk_vlan_expand() {
        assert_eq!(TrunkVlan::Id(5).expand().unwrap(), vec![5]);
        assert_eq!(
            TrunkVlan::Range("100..103".to_string()).expand().unwrap(),
            vec![100, 101, 102, 103]
        );
        assert!(TrunkVlan::Range("20..10".to_string()).expand().is_err());
        assert!(TrunkVlan::Range("abc".to_string()).expand().is_err());
    }

    #[test]
    fn test_trunk_vlan_union_decode() {
        let config: SwitchedVlanConfig =
            parse_json(r#"{"trunk-vlans": [10, "20..22"]}"#).unwrap();
        assert_eq!(config.trunk_vlan_ids().unwrap(), vec![10, 20, 21, 22]);
    }

    #[test]
    fn test_subinterface_mut_reuses_entry() {
        let mut intf = Interface::new("Ethernet1");
        intf.subinterface_mut(0).ipv4_mut().set_enabled(false);
        intf.subinterface_mut(0).ipv4_mut().set_enabled(true);
        assert_eq!(intf.subinterfaces.as_ref().unwrap().subinterface.len(), 1);
        assert_eq!(intf.ipv4().unwrap().enabled(), Some(true));
    }
}
