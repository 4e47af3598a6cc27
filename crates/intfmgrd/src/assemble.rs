//! Interface subtree assembly from declared attributes

use gnmi_cfgmgr_common::{CfgMgrError, CfgMgrResult};
use ipnet::Ipv4Net;

use crate::tables::SUBINTERFACE_INDEX;
use crate::types::InterfaceSpec;
use crate::yang::{Address, Interface, InterfaceMode, Subinterface, SwitchedVlanConfig, TrunkVlan};

/// Build the full interface subtree for `spec`
///
/// Fields that do not belong to the declared mode are ignored here;
/// [`InterfaceSpec::validate`] is what rejects them.
pub fn assemble(spec: &InterfaceSpec) -> CfgMgrResult<Interface> {
    let mut intf = Interface::new(&spec.name);

    if let Some(description) = &spec.description {
        intf.set_description(description);
    }

    let sub = intf.subinterface_mut(SUBINTERFACE_INDEX);
    if spec.switchport {
        sub.ipv4_mut().set_enabled(false);

        let vlan = build_switched_vlan(spec);
        if !vlan.is_empty() {
            *intf.switched_vlan_config_mut() = vlan;
        }
    } else {
        sub.ipv4_mut().set_enabled(true);
        if let Some(cidr) = &spec.ipv4_address {
            assign_ipv4_address(sub, cidr)?;
        }
    }

    Ok(intf)
}

/// Add the single address entry for `cidr` to the subinterface's IPv4 node
///
/// The entry key is the host address as written (`10.0.0.1` for
/// `10.0.0.1/24`), not the network address.
pub fn assign_ipv4_address(sub: &mut Subinterface, cidr: &str) -> CfgMgrResult<()> {
    let net: Ipv4Net = cidr.trim().parse().map_err(|e| {
        CfgMgrError::invalid_config("ipv4_address", format!("'{}' is not an IPv4 CIDR: {}", cidr, e))
    })?;

    sub.ipv4_mut()
        .push_address(Address::new(net.addr().to_string(), net.prefix_len()));
    Ok(())
}

/// Build the switched-vlan config from the declared VLANs
///
/// Access is applied first and trunk second, so a declaration carrying both
/// ends up labelled `TRUNK`.
pub fn build_switched_vlan(spec: &InterfaceSpec) -> SwitchedVlanConfig {
    let mut config = SwitchedVlanConfig::default();

    if let Some(vlan) = spec.access_vlan {
        config.access_vlan = Some(vlan);
        config.vendor_interface_mode = Some(InterfaceMode::Access);
    }

    if !spec.trunk_vlans.is_empty() {
        config.trunk_vlans = spec.trunk_vlans.iter().copied().map(TrunkVlan::Id).collect();
        config.vendor_interface_mode = Some(InterfaceMode::Trunk);
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_switchport_disables_ipv4() {
        let spec = InterfaceSpec::switchport("Ethernet1").with_access_vlan(10);
        let intf = assemble(&spec).unwrap();

        let ipv4 = intf.ipv4().unwrap();
        assert_eq!(ipv4.enabled(), Some(false));
        assert!(ipv4.address_list().is_empty());
    }

    #[test]
    fn test_switchport_ignores_declared_address() {
        let mut spec = InterfaceSpec::switchport("Ethernet1");
        spec.ipv4_address = Some("10.0.0.1/24".to_string());
        let intf = assemble(&spec).unwrap();
        assert!(intf.ipv4().unwrap().address_list().is_empty());
    }

    #[test]
    fn test_routed_has_no_vlans() {
        let mut spec = InterfaceSpec::routed("Ethernet2").with_ipv4_address("10.0.0.1/24");
        spec.access_vlan = Some(10);
        spec.trunk_vlans = vec![20];
        let intf = assemble(&spec).unwrap();

        assert!(intf.switched_vlan_config().is_none());
        assert!(intf.ethernet.is_none());
        assert_eq!(intf.ipv4().unwrap().enabled(), Some(true));
    }

    #[test]
    fn test_assign_ipv4_address() {
        let mut sub = Subinterface::new(0);
        assign_ipv4_address(&mut sub, "10.0.0.1/24").unwrap();

        let addrs = sub.ipv4.as_ref().unwrap().address_list();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].ip, "10.0.0.1");
        assert_eq!(addrs[0].prefix_length(), Some(24));
        assert_eq!(addrs[0].config.as_ref().unwrap().ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_assign_ipv4_address_rejects_malformed() {
        let mut sub = Subinterface::new(0);
        for bad in ["not-an-ip", "10.0.0.1", "10.0.0.1/33", "2001:db8::1/64"] {
            let err = assign_ipv4_address(&mut sub, bad).unwrap_err();
            assert!(matches!(err, CfgMgrError::InvalidConfig { .. }), "{}", bad);
        }
        assert!(sub.ipv4.is_none());
    }

    #[test]
    fn test_assemble_malformed_cidr_fails() {
        let spec = InterfaceSpec::routed("Ethernet2").with_ipv4_address("not-an-ip");
        assert!(assemble(&spec).is_err());
    }

    #[test]
    fn test_build_switched_vlan_labels() {
        let access = build_switched_vlan(&InterfaceSpec::switchport("e").with_access_vlan(10));
        assert_eq!(access.access_vlan, Some(10));
        assert_eq!(access.mode(), Some(InterfaceMode::Access));

        let trunk = build_switched_vlan(&InterfaceSpec::switchport("e").with_trunk_vlans([10, 20, 30]));
        assert_eq!(trunk.trunk_vlan_ids().unwrap(), vec![10, 20, 30]);
        assert_eq!(trunk.mode(), Some(InterfaceMode::Trunk));

        let both = build_switched_vlan(
            &InterfaceSpec::switchport("e")
                .with_access_vlan(5)
                .with_trunk_vlans([6]),
        );
        assert_eq!(both.access_vlan, Some(5));
        assert_eq!(both.mode(), Some(InterfaceMode::Trunk));

        assert!(build_switched_vlan(&InterfaceSpec::switchport("e")).is_empty());
    }

    #[test]
    fn test_assemble_sets_names_and_description() {
        let spec = InterfaceSpec::switchport("Ethernet1").with_description("to spine-1");
        let intf = assemble(&spec).unwrap();
        assert_eq!(intf.name.as_deref(), Some("Ethernet1"));
        assert_eq!(intf.config.as_ref().unwrap().name.as_deref(), Some("Ethernet1"));
        assert_eq!(intf.description(), Some("to spine-1"));
        assert_eq!(
            intf.subinterface(0).unwrap().config.as_ref().unwrap().index,
            Some(0)
        );
    }
}
