//! Interface lifecycle integration tests
//!
//! Drives the manager through create/read/update/delete against the
//! recording mock transport and checks the set operations it emits.

use std::sync::Arc;
use std::time::Duration;

use gnmi_cfgmgr_common::{
    CancellationToken, CfgMgrError, LifecycleState, OpKind, ResourceMgr,
};
use gnmi_cfgmgr_test::{
    documents, interface_path, interface_response, path, MockTransport, NotificationBuilder,
    OpVerifier,
};
use gnmi_intfmgrd::assemble::assemble;
use gnmi_intfmgrd::yang::emit_json;
use gnmi_intfmgrd::{IntfMgr, InterfaceResource, InterfaceSpec};
use pretty_assertions::assert_eq;
use serde_json::json;

const GLOBAL: &str = "/interfaces/interface[name=Ethernet1]";
const DESC: &str = "/interfaces/interface[name=Ethernet1]/config/description";
const VLAN: &str = "/interfaces/interface[name=Ethernet1]/ethernet/switched-vlan/config";
const IPV4: &str = "/interfaces/interface[name=Ethernet1]/subinterfaces/subinterface[index=0]/ipv4";

fn setup() -> (Arc<MockTransport>, IntfMgr<MockTransport>, CancellationToken) {
    let mock = Arc::new(MockTransport::new());
    let mgr = IntfMgr::new(mock.clone());
    (mock, mgr, CancellationToken::new())
}

/// Create a switchport
///
/// Scenario:
/// 1. Create Ethernet1 as an access port
/// 2. Verify a single update at the interface path
/// 3. Verify the record is present and refreshed from the device
#[tokio::test]
async fn test_create_switchport() {
    let (mock, mgr, ctx) = setup();
    let desired = InterfaceSpec::switchport("Ethernet1")
        .with_description("server")
        .with_access_vlan(10);
    mock.push_response(interface_response(
        "Ethernet1",
        &documents::access("Ethernet1", "server", 10),
    ));

    let mut resource = InterfaceResource::new("Ethernet1");
    let refresh = mgr
        .create(&ctx, &mut resource, desired.clone())
        .await
        .expect("create failed");

    assert!(!refresh.is_stale());
    assert_eq!(resource.id.as_deref(), Some("Ethernet1"));
    assert_eq!(resource.state, LifecycleState::Present);
    assert_eq!(resource.attrs, desired);

    let verifier = OpVerifier::new(mock.applied());
    verifier
        .assert_sequence(&[(OpKind::Update, GLOBAL)])
        .expect("expected one update");

    let doc = verifier
        .payload_json(OpKind::Update, GLOBAL)
        .expect("payload");
    let sub = &doc["openconfig-interfaces:subinterfaces"]["subinterface"][0];
    assert_eq!(sub["openconfig-if-ip:ipv4"]["config"]["enabled"], json!(false));
    assert!(sub["openconfig-if-ip:ipv4"].get("addresses").is_none());
    assert_eq!(
        doc["openconfig-if-ethernet:ethernet"]["openconfig-vlan:switched-vlan"]["config"]
            ["access-vlan"],
        json!(10)
    );

    assert_eq!(mock.get_requests(), vec![vec![interface_path("Ethernet1")]]);
}

/// Create a routed port
///
/// Scenario:
/// 1. Create Ethernet1 as a routed port with 10.0.0.1/24
/// 2. Verify the address entry carries the host address and prefix length
/// 3. Verify no VLAN branch was emitted
#[tokio::test]
async fn test_create_routed_port() {
    let (mock, mgr, ctx) = setup();
    let desired = InterfaceSpec::routed("Ethernet1").with_ipv4_address("10.0.0.1/24");

    let mut resource = InterfaceResource::new("Ethernet1");
    mgr.create(&ctx, &mut resource, desired)
        .await
        .expect("create failed");

    let doc = OpVerifier::new(mock.applied())
        .payload_json(OpKind::Update, GLOBAL)
        .expect("payload");
    let ipv4 = &doc["openconfig-interfaces:subinterfaces"]["subinterface"][0]["openconfig-if-ip:ipv4"];
    assert_eq!(ipv4["config"]["enabled"], json!(true));
    assert_eq!(
        ipv4["addresses"]["address"],
        json!([{ "ip": "10.0.0.1", "config": { "ip": "10.0.0.1", "prefix-length": 24 } }])
    );
    assert!(doc.get("openconfig-if-ethernet:ethernet").is_none());
}

#[tokio::test]
async fn test_create_malformed_cidr_sends_nothing() {
    let (mock, mgr, ctx) = setup();
    let desired = InterfaceSpec::routed("Ethernet1").with_ipv4_address("not-an-ip");

    let mut resource = InterfaceResource::new("Ethernet1");
    let err = mgr
        .create(&ctx, &mut resource, desired)
        .await
        .expect_err("malformed CIDR accepted");

    assert!(matches!(err, CfgMgrError::InvalidConfig { .. }));
    assert!(mock.applied().is_empty());
    assert_eq!(resource.state, LifecycleState::Absent);
    assert_eq!(resource.id, None);
}

#[tokio::test]
async fn test_create_transport_failure_stays_absent() {
    let (mock, mgr, ctx) = setup();
    mock.fail_set_on(Some(OpKind::Update), "Ethernet1", "connection refused");

    let mut resource = InterfaceResource::new("Ethernet1");
    let err = mgr
        .create(&ctx, &mut resource, InterfaceSpec::switchport("Ethernet1"))
        .await
        .expect_err("create should fail");

    assert!(matches!(err, CfgMgrError::Transport { .. }));
    assert!(err.is_retryable());
    assert_eq!(resource.state, LifecycleState::Absent);
    assert_eq!(resource.id, None);
    assert!(mock.get_requests().is_empty());
}

#[tokio::test]
async fn test_create_read_failure_is_stale_refresh() {
    let (mock, mgr, ctx) = setup();
    mock.fail_get("timeout");

    let desired = InterfaceSpec::switchport("Ethernet1").with_trunk_vlans([10, 20]);
    let mut resource = InterfaceResource::new("Ethernet1");
    let refresh = mgr
        .create(&ctx, &mut resource, desired.clone())
        .await
        .expect("create itself succeeded");

    assert!(refresh.is_stale());
    assert_eq!(resource.state, LifecycleState::Present);
    assert_eq!(resource.attrs, desired);
    assert_eq!(mock.applied().len(), 1);
}

/// Round trip through the device document
///
/// The document the manager writes, read back from the device, yields the
/// declared attributes again.
#[tokio::test]
async fn test_read_round_trips_declared_attributes() {
    for desired in [
        InterfaceSpec::switchport("Ethernet1")
            .with_description("rack 4 / \"uplink\" é")
            .with_access_vlan(10)
            .with_trunk_vlans([20, 30]),
        InterfaceSpec::routed("Ethernet1")
            .with_description("p2p")
            .with_ipv4_address("192.0.2.1/31"),
    ] {
        let (mock, mgr, ctx) = setup();
        let doc = emit_json(&assemble(&desired).expect("assemble")).expect("emit");
        mock.push_response(
            NotificationBuilder::new()
                .raw_update(interface_path("Ethernet1"), doc)
                .into_response(),
        );

        let mut resource = InterfaceResource::present(InterfaceSpec {
            description: None,
            ..desired.clone()
        });
        mgr.read(&ctx, &mut resource).await.expect("read failed");
        assert_eq!(resource.attrs, desired);
    }
}

#[tokio::test]
async fn test_read_trunk_ranges() {
    let (mock, mgr, ctx) = setup();
    mock.push_response(interface_response(
        "Ethernet1",
        &documents::trunk("Ethernet1", json!([5, "100..102"])),
    ));

    let mut resource = InterfaceResource::present(InterfaceSpec::switchport("Ethernet1"));
    mgr.read(&ctx, &mut resource).await.expect("read failed");
    assert_eq!(resource.attrs.trunk_vlans, vec![5, 100, 101, 102]);
}

#[tokio::test]
async fn test_read_prefixed_leaf_updates() {
    let (mock, mgr, ctx) = setup();
    mock.push_response(
        NotificationBuilder::with_prefix(interface_path("Ethernet1"))
            .update(path("config/description"), &json!("from device"))
            .update(
                path("subinterfaces/subinterface[index=0]/ipv4/addresses/address[ip=10.1.1.1]/config"),
                &json!({ "ip": "10.1.1.1", "prefix-length": 30 }),
            )
            .into_response(),
    );

    let mut resource = InterfaceResource::present(InterfaceSpec::routed("Ethernet1"));
    mgr.read(&ctx, &mut resource).await.expect("read failed");

    assert_eq!(resource.attrs.description.as_deref(), Some("from device"));
    assert_eq!(resource.attrs.ipv4_address.as_deref(), Some("10.1.1.1/30"));
}

#[tokio::test]
async fn test_read_decode_failure_leaves_record() {
    let (mock, mgr, ctx) = setup();
    mock.push_response(
        NotificationBuilder::with_prefix(interface_path("Ethernet1"))
            .update(path("config/description"), &json!("new"))
            .raw_update(path("ethernet/switched-vlan/config"), "{not json")
            .into_response(),
    );

    let recorded = InterfaceSpec::switchport("Ethernet1")
        .with_description("old")
        .with_access_vlan(10);
    let mut resource = InterfaceResource::present(recorded.clone());
    let err = mgr
        .read(&ctx, &mut resource)
        .await
        .expect_err("decode should fail");

    assert!(matches!(err, CfgMgrError::Decode { .. }));
    assert_eq!(resource.attrs, recorded);
}

#[tokio::test]
async fn test_read_without_id() {
    let (mock, mgr, ctx) = setup();
    let mut resource = InterfaceResource::new("Ethernet1");
    assert!(matches!(
        mgr.read(&ctx, &mut resource).await,
        Err(CfgMgrError::MissingId)
    ));
    assert!(mock.get_requests().is_empty());
}

/// IPv4 change is a delete followed by a replace
#[tokio::test]
async fn test_update_ipv4_deletes_then_replaces() {
    let (mock, mgr, ctx) = setup();
    let mut resource = InterfaceResource::present(
        InterfaceSpec::routed("Ethernet1").with_ipv4_address("10.0.0.1/24"),
    );
    let desired = InterfaceSpec::routed("Ethernet1").with_ipv4_address("10.0.0.2/24");
    mock.push_response(interface_response(
        "Ethernet1",
        &json!({
            "openconfig-interfaces:subinterfaces": {
                "subinterface": [{
                    "index": 0,
                    "openconfig-if-ip:ipv4": {
                        "addresses": { "address": [{
                            "ip": "10.0.0.2",
                            "config": { "ip": "10.0.0.2", "prefix-length": 24 }
                        }] }
                    }
                }]
            }
        }),
    ));

    mgr.update(&ctx, &mut resource, desired.clone())
        .await
        .expect("update failed");

    assert_eq!(mock.set_calls().len(), 2);
    let verifier = OpVerifier::new(mock.applied());
    verifier
        .assert_sequence(&[(OpKind::Delete, IPV4), (OpKind::Replace, IPV4)])
        .expect("delete then replace");

    let ipv4 = verifier.payload_json(OpKind::Replace, IPV4).expect("payload");
    assert_eq!(ipv4["openconfig-if-ip:config"]["enabled"], json!(true));
    assert_eq!(
        ipv4["openconfig-if-ip:addresses"]["address"][0]["ip"],
        json!("10.0.0.2")
    );
    assert_eq!(resource.attrs, desired);
}

/// Trunk VLAN change is one replace carrying every VLAN
#[tokio::test]
async fn test_update_trunk_vlans() {
    let (mock, mgr, ctx) = setup();
    let mut resource =
        InterfaceResource::present(InterfaceSpec::switchport("Ethernet1").with_trunk_vlans([10]));
    let desired = InterfaceSpec::switchport("Ethernet1").with_trunk_vlans([10, 20, 30]);

    mgr.update(&ctx, &mut resource, desired)
        .await
        .expect("update failed");

    let verifier = OpVerifier::new(mock.applied());
    verifier
        .assert_sequence(&[(OpKind::Replace, VLAN)])
        .expect("one replace");
    let config = verifier.payload_json(OpKind::Replace, VLAN).expect("payload");
    assert_eq!(config["openconfig-vlan:trunk-vlans"], json!([10, 20, 30]));
    assert_eq!(config["arista-vlan-augments:interface-mode"], json!("TRUNK"));
}

#[tokio::test]
async fn test_update_access_vlan_removed_deletes_vlan_path() {
    let (mock, mgr, ctx) = setup();
    let mut resource =
        InterfaceResource::present(InterfaceSpec::switchport("Ethernet1").with_access_vlan(10));

    mgr.update(&ctx, &mut resource, InterfaceSpec::switchport("Ethernet1"))
        .await
        .expect("update failed");

    OpVerifier::new(mock.applied())
        .assert_sequence(&[(OpKind::Delete, VLAN)])
        .expect("vlan delete");
}

#[tokio::test]
async fn test_update_description_only_touches_description() {
    let (mock, mgr, ctx) = setup();
    let prior = InterfaceSpec::switchport("Ethernet1")
        .with_description("old")
        .with_access_vlan(10);
    let mut resource = InterfaceResource::present(prior.clone());
    let desired = prior.with_description("new");

    mgr.update(&ctx, &mut resource, desired)
        .await
        .expect("update failed");

    let verifier = OpVerifier::new(mock.applied());
    verifier
        .assert_sequence(&[(OpKind::Replace, DESC)])
        .expect("one replace");
    assert_eq!(verifier.ops()[0].val.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_update_group_order() {
    let (mock, mgr, ctx) = setup();
    let mut resource = InterfaceResource::present(InterfaceSpec::routed("Ethernet1"));
    let desired = InterfaceSpec::routed("Ethernet1")
        .with_description("core")
        .with_ipv4_address("10.0.0.1/31");

    mgr.update(&ctx, &mut resource, desired)
        .await
        .expect("update failed");

    OpVerifier::new(mock.applied())
        .assert_sequence(&[
            (OpKind::Replace, DESC),
            (OpKind::Delete, IPV4),
            (OpKind::Replace, IPV4),
        ])
        .expect("description before ipv4");
}

#[tokio::test]
async fn test_update_partial_failure_commits_applied_groups() {
    let (mock, mgr, ctx) = setup();
    mock.fail_set_on(Some(OpKind::Replace), "switched-vlan", "rejected");

    let prior = InterfaceSpec::switchport("Ethernet1").with_description("old");
    let mut resource = InterfaceResource::present(prior);
    let desired = InterfaceSpec::switchport("Ethernet1")
        .with_description("new")
        .with_access_vlan(10);

    let err = mgr
        .update(&ctx, &mut resource, desired)
        .await
        .expect_err("vlan replace should fail");

    assert!(matches!(err, CfgMgrError::Transport { ref path, .. } if path == VLAN));
    assert_eq!(resource.attrs.description.as_deref(), Some("new"));
    assert_eq!(resource.attrs.access_vlan, None);
    assert_eq!(resource.state, LifecycleState::Present);
}

#[tokio::test]
async fn test_update_rejects_immutable_and_invalid() {
    let (mock, mgr, ctx) = setup();
    let mut resource = InterfaceResource::present(InterfaceSpec::switchport("Ethernet1"));

    let err = mgr
        .update(&ctx, &mut resource, InterfaceSpec::routed("Ethernet1"))
        .await
        .expect_err("switchport is immutable");
    assert!(matches!(err, CfgMgrError::ImmutableField { .. }));

    let err = mgr
        .update(
            &ctx,
            &mut resource,
            InterfaceSpec::switchport("Ethernet1").with_ipv4_address("10.0.0.1/24"),
        )
        .await
        .expect_err("address on a switchport");
    assert!(matches!(err, CfgMgrError::InvalidConfig { .. }));

    assert!(mock.applied().is_empty());
}

#[tokio::test]
async fn test_update_read_failure_is_stale_refresh() {
    let (mock, mgr, ctx) = setup();
    mock.fail_get("unreachable");
    let mut resource = InterfaceResource::present(InterfaceSpec::switchport("Ethernet1"));

    let refresh = mgr
        .update(
            &ctx,
            &mut resource,
            InterfaceSpec::switchport("Ethernet1").with_description("x"),
        )
        .await
        .expect("update applied");

    assert!(refresh.is_stale());
    assert!(refresh.stale_reason().is_some());
    assert_eq!(mock.applied().len(), 1);
}

/// Delete removes each attribute group
#[tokio::test]
async fn test_delete() {
    let (mock, mgr, ctx) = setup();
    let mut resource = InterfaceResource::present(InterfaceSpec::switchport("Ethernet1"));

    mgr.delete(&ctx, &mut resource).await.expect("delete failed");

    let verifier = OpVerifier::new(mock.applied());
    verifier.assert_count(3).expect("three deletes");
    verifier
        .assert_path_set(OpKind::Delete, &[DESC, VLAN, IPV4])
        .expect("group paths");
    verifier
        .assert_no_op(OpKind::Delete, GLOBAL)
        .expect("interface itself is kept");
    assert_eq!(resource.id, None);
    assert_eq!(resource.state, LifecycleState::Absent);
}

#[tokio::test]
async fn test_delete_failure_names_group() {
    let (mock, mgr, ctx) = setup();
    mock.fail_set_on(Some(OpKind::Delete), "switched-vlan", "busy");
    let mut resource = InterfaceResource::present(InterfaceSpec::switchport("Ethernet1"));

    let err = mgr
        .delete(&ctx, &mut resource)
        .await
        .expect_err("vlan delete should fail");

    match &err {
        CfgMgrError::PartialDelete { group, path, .. } => {
            assert_eq!(group, "vlan");
            assert_eq!(path, VLAN);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
    assert_eq!(resource.state, LifecycleState::Deleting);
    assert_eq!(resource.id.as_deref(), Some("Ethernet1"));

    // Re-running delete after the device recovers finishes the job
    mock.clear_set_failures();
    mgr.delete(&ctx, &mut resource).await.expect("retry failed");
    assert_eq!(resource.state, LifecycleState::Absent);
}

#[tokio::test]
async fn test_cancelled_before_call() {
    let (mock, mgr, ctx) = setup();
    ctx.cancel();

    let mut resource = InterfaceResource::new("Ethernet1");
    let err = mgr
        .create(&ctx, &mut resource, InterfaceSpec::switchport("Ethernet1"))
        .await
        .expect_err("cancelled");

    assert!(matches!(err, CfgMgrError::Cancelled { .. }));
    assert!(mock.applied().is_empty());
    assert_eq!(resource.state, LifecycleState::Absent);
}

#[tokio::test]
async fn test_cancelled_in_flight() {
    let mock = Arc::new(MockTransport::new().with_set_delay(Duration::from_secs(30)));
    let mgr = IntfMgr::new(mock.clone());
    let ctx = CancellationToken::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let mut resource = InterfaceResource::present(InterfaceSpec::switchport("Ethernet1"));
    let err = mgr
        .delete(&ctx, &mut resource)
        .await
        .expect_err("cancelled");

    match err {
        CfgMgrError::PartialDelete { source, .. } => {
            assert!(matches!(*source, CfgMgrError::Cancelled { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(mock.applied().is_empty());
}
