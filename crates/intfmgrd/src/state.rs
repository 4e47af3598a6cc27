//! Observed-state decoding
//!
//! A get on the interface path may come back as one full document, as leaf
//! updates under a prefix, or as a document rooted above the interface. Every
//! update is grafted into an interface-rooted fragment, checked against the
//! subtree model on its own, then merged into the accumulated tree.

use gnmi_cfgmgr_common::{CfgMgrError, CfgMgrResult, GetResponse, GnmiPath, PathElem};
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::InterfaceSpec;
use crate::yang::{self, Interface};

/// List key leaves, used to line up list entries when merging fragments
const LIST_KEYS: [&str; 3] = ["name", "index", "ip"];

/// Decode a get response into the interface subtree rooted at `interface_path`
pub fn decode(interface_path: &GnmiPath, resp: &GetResponse) -> CfgMgrResult<Interface> {
    let mut acc = Value::Object(Map::new());

    for notification in &resp.notifications {
        for update in &notification.updates {
            let full = notification.full_path(update);
            let path = full.to_string();

            let val: Value = serde_json::from_str(&update.val)
                .map_err(|e| CfgMgrError::decode(&path, e.to_string()))?;
            let fragment = yang::unqualify(graft(interface_path, &full, val)?);

            yang::from_value::<Interface>(fragment.clone())
                .map_err(|e| CfgMgrError::decode(&path, e.to_string()))?;

            debug!(path = %path, "Merging update");
            merge(&mut acc, fragment);
        }
    }

    yang::from_value(acc)
        .map_err(|e| CfgMgrError::decode(interface_path.to_string(), e.to_string()))
}

/// Observed attributes of `interface`
///
/// Name and switchport are not read back and are carried over from `recorded`.
pub fn observe(interface: &Interface, recorded: &InterfaceSpec) -> CfgMgrResult<InterfaceSpec> {
    let mut observed = InterfaceSpec {
        name: recorded.name.clone(),
        switchport: recorded.switchport,
        description: interface.description().map(str::to_string),
        access_vlan: None,
        trunk_vlans: Vec::new(),
        ipv4_address: None,
    };

    if let Some(vlan) = interface.switched_vlan_config() {
        observed.access_vlan = vlan.access_vlan;
        observed.trunk_vlans = vlan
            .trunk_vlan_ids()
            .map_err(|e| CfgMgrError::decode(&recorded.name, e))?;
    }

    observed.ipv4_address = interface
        .ipv4()
        .and_then(|ipv4| ipv4.address_list().first())
        .map(|addr| match addr.prefix_length() {
            Some(len) => format!("{}/{}", addr.ip, len),
            None => addr.ip.clone(),
        });

    Ok(observed)
}

/// Turn an update at `full` into a document rooted at `interface_path`
fn graft(interface_path: &GnmiPath, full: &GnmiPath, val: Value) -> CfgMgrResult<Value> {
    if let Some(suffix) = full.strip_prefix(interface_path) {
        let mut value = val;
        for elem in suffix.iter().rev() {
            value = wrap(elem, value, full)?;
        }
        return Ok(value);
    }

    if let Some(below) = interface_path.strip_prefix(full) {
        // Document rooted above the interface: walk down to our entry
        let mut value = yang::unqualify(val);
        for elem in below {
            value = match descend(elem, value) {
                Some(v) => v,
                None => return Ok(Value::Object(Map::new())),
            };
        }
        return Ok(value);
    }

    Err(CfgMgrError::decode(
        full.to_string(),
        format!("update lies outside {}", interface_path),
    ))
}

fn wrap(elem: &PathElem, value: Value, full: &GnmiPath) -> CfgMgrResult<Value> {
    let mut node = Map::new();
    if elem.keys.is_empty() {
        node.insert(elem.name.clone(), value);
        return Ok(Value::Object(node));
    }

    let mut entry = match value {
        Value::Object(members) => members,
        _ => {
            return Err(CfgMgrError::decode(
                full.to_string(),
                format!("list entry {} is not an object", elem),
            ))
        }
    };
    for (k, v) in &elem.keys {
        entry.insert(k.clone(), key_value(v));
    }
    node.insert(elem.name.clone(), Value::Array(vec![Value::Object(entry)]));
    Ok(Value::Object(node))
}

fn descend(elem: &PathElem, value: Value) -> Option<Value> {
    let Value::Object(mut members) = value else {
        return None;
    };
    let child = members.remove(unqualified(&elem.name))?;
    if elem.keys.is_empty() {
        return Some(child);
    }

    let Value::Array(entries) = child else {
        return None;
    };
    entries.into_iter().find(|entry| {
        elem.keys
            .iter()
            .all(|(k, v)| entry.get(k).is_some_and(|e| *e == key_value(v)))
    })
}

fn unqualified(name: &str) -> &str {
    match name.split_once(':') {
        Some((module, local)) if module.starts_with("openconfig-") => local,
        _ => name,
    }
}

/// Key values travel as strings in paths but are typed in documents
fn key_value(raw: &str) -> Value {
    match raw.parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Deep-merge `src` into `dst`, later values winning
///
/// List entries are matched by their key leaf; leaf-lists are replaced.
fn merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                match dst.get_mut(&k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        dst.insert(k, v);
                    }
                }
            }
        }
        (Value::Array(dst), Value::Array(src)) if is_list(dst.as_slice()) && is_list(&src) => {
            for entry in src {
                match dst.iter_mut().find(|e| same_entry(e, &entry)) {
                    Some(existing) => merge(existing, entry),
                    None => dst.push(entry),
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

fn is_list(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

fn same_entry(a: &Value, b: &Value) -> bool {
    LIST_KEYS
        .iter()
        .find_map(|k| Some((a.get(*k)?, b.get(*k)?)))
        .is_some_and(|(x, y)| x == y)
}
