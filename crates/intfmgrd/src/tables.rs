//! Path table and schema name constants

use gnmi_cfgmgr_common::{CfgMgrError, CfgMgrResult, GnmiPath};
use std::fmt;
use std::str::FromStr;

/// Placeholder substituted with the interface name
pub const NAME_PLACEHOLDER: &str = "%s";

// OpenConfig path templates
pub const DESCRIPTION_PATH: &str = "/interfaces/interface[name=%s]/config/description";
pub const VLAN_PATH: &str = "/interfaces/interface[name=%s]/ethernet/switched-vlan/config";
pub const IPV4_PATH: &str =
    "/interfaces/interface[name=%s]/subinterfaces/subinterface[index=0]/ipv4";
pub const GLOBAL_PATH: &str = "/interfaces/interface[name=%s]";

// YANG module names used for RFC 7951 qualification
pub mod modules {
    pub const INTERFACES: &str = "openconfig-interfaces";
    pub const VLAN: &str = "openconfig-vlan";
    pub const IP: &str = "openconfig-if-ip";
}

/// Subinterface carrying the interface's own addressing
pub const SUBINTERFACE_INDEX: u32 = 0;

/// Logical attribute group, each addressed by one path template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrGroup {
    /// `config/description`
    Description,
    /// `ethernet/switched-vlan/config`
    Vlan,
    /// `subinterfaces/subinterface[index=0]/ipv4`
    Ipv4,
    /// The whole interface
    Global,
}

impl AttrGroup {
    /// All groups, in table order
    pub const ALL: [AttrGroup; 4] = [
        AttrGroup::Description,
        AttrGroup::Vlan,
        AttrGroup::Ipv4,
        AttrGroup::Global,
    ];

    /// Group key as used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrGroup::Description => "description",
            AttrGroup::Vlan => "vlan",
            AttrGroup::Ipv4 => "ipv4",
            AttrGroup::Global => "global",
        }
    }

    fn index(&self) -> usize {
        match self {
            AttrGroup::Description => 0,
            AttrGroup::Vlan => 1,
            AttrGroup::Ipv4 => 2,
            AttrGroup::Global => 3,
        }
    }
}

impl fmt::Display for AttrGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttrGroup {
    type Err = CfgMgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttrGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| CfgMgrError::UnknownGroup(s.to_string()))
    }
}

/// Immutable group → path template lookup
///
/// Built once at startup and shared by reference with the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    templates: [String; 4],
}

impl PathTable {
    /// The OpenConfig interface templates
    pub fn openconfig() -> Self {
        Self {
            templates: [
                DESCRIPTION_PATH.to_string(),
                VLAN_PATH.to_string(),
                IPV4_PATH.to_string(),
                GLOBAL_PATH.to_string(),
            ],
        }
    }

    /// Build a table from custom templates
    ///
    /// Every group must appear exactly once, every template must carry exactly
    /// one placeholder and resolve to a parsable path.
    pub fn from_templates<I, S>(entries: I) -> CfgMgrResult<Self>
    where
        I: IntoIterator<Item = (AttrGroup, S)>,
        S: Into<String>,
    {
        let mut slots: [Option<String>; 4] = Default::default();

        for (group, template) in entries {
            let template = template.into();
            if template.matches(NAME_PLACEHOLDER).count() != 1 {
                return Err(CfgMgrError::invalid_config(
                    group.as_str(),
                    format!("template '{}' must contain exactly one '%s'", template),
                ));
            }
            GnmiPath::parse(&template.replacen(NAME_PLACEHOLDER, "probe", 1))?;

            let slot = &mut slots[group.index()];
            if slot.is_some() {
                return Err(CfgMgrError::invalid_config(
                    group.as_str(),
                    "template given more than once",
                ));
            }
            *slot = Some(template);
        }

        let mut templates: [String; 4] = Default::default();
        for group in AttrGroup::ALL {
            templates[group.index()] = slots[group.index()]
                .take()
                .ok_or_else(|| CfgMgrError::invalid_config(group.as_str(), "missing template"))?;
        }
        Ok(Self { templates })
    }

    /// Raw template for a group
    pub fn template(&self, group: AttrGroup) -> &str {
        &self.templates[group.index()]
    }

    /// Substitute the interface name into the group's template
    pub fn resolve(&self, group: AttrGroup, name: &str) -> String {
        self.template(group).replacen(NAME_PLACEHOLDER, name, 1)
    }

    /// Resolve and parse into a structured path
    pub fn resolve_path(&self, group: AttrGroup, name: &str) -> CfgMgrResult<GnmiPath> {
        GnmiPath::parse(&self.resolve(group, name))
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::openconfig()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_openconfig() {
        let table = PathTable::openconfig();
        assert_eq!(
            table.resolve(AttrGroup::Description, "Ethernet1"),
            "/interfaces/interface[name=Ethernet1]/config/description"
        );
        assert_eq!(
            table.resolve(AttrGroup::Vlan, "Ethernet1"),
            "/interfaces/interface[name=Ethernet1]/ethernet/switched-vlan/config"
        );
        assert_eq!(
            table.resolve(AttrGroup::Ipv4, "Ethernet1"),
            "/interfaces/interface[name=Ethernet1]/subinterfaces/subinterface[index=0]/ipv4"
        );
        assert_eq!(
            table.resolve(AttrGroup::Global, "Ethernet1"),
            "/interfaces/interface[name=Ethernet1]"
        );
    }

    #[test]
    fn test_resolve_path_with_slash_in_name() {
        let table = PathTable::default();
        let path = table.resolve_path(AttrGroup::Global, "Ethernet1/1").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.elems()[1].key("name"), Some("Ethernet1/1"));
    }

    #[test]
    fn test_group_from_str() {
        assert_eq!("vlan".parse::<AttrGroup>().unwrap(), AttrGroup::Vlan);
        assert_eq!("global".parse::<AttrGroup>().unwrap(), AttrGroup::Global);
        assert!(matches!(
            "mtu".parse::<AttrGroup>(),
            Err(CfgMgrError::UnknownGroup(_))
        ));
    }

    #[test]
    fn test_from_templates() {
        let table = PathTable::from_templates(
            AttrGroup::ALL.map(|g| (g, PathTable::openconfig().template(g).to_string())),
        )
        .unwrap();
        assert_eq!(table, PathTable::openconfig());
    }

    #[test]
    fn test_from_templates_rejects_bad_input() {
        // Missing group
        assert!(PathTable::from_templates([(AttrGroup::Description, DESCRIPTION_PATH)]).is_err());

        // No placeholder
        let mut entries: Vec<(AttrGroup, String)> = AttrGroup::ALL
            .iter()
            .map(|g| (*g, PathTable::openconfig().template(*g).to_string()))
            .collect();
        entries[0].1 = "/interfaces/interface[name=Ethernet1]/config/description".to_string();
        assert!(PathTable::from_templates(entries.clone()).is_err());

        // Duplicate group
        entries[0].1 = DESCRIPTION_PATH.to_string();
        entries.push((AttrGroup::Vlan, VLAN_PATH.to_string()));
        assert!(PathTable::from_templates(entries).is_err());
    }
}
