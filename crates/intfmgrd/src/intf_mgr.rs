//! Interface Manager - Core implementation

use async_trait::async_trait;
use gnmi_cfgmgr_common::{
    cancellable, CancellationToken, CfgMgrError, CfgMgrResult, GnmiTransport, LifecycleState,
    OpKind, Refresh, ResourceMgr, SetOperation,
};
use std::slice;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::assemble::{assemble, assign_ipv4_address, build_switched_vlan};
use crate::operations::{build, Payload};
use crate::state;
use crate::tables::{AttrGroup, PathTable, SUBINTERFACE_INDEX};
use crate::types::{InterfaceResource, InterfaceSpec};
use crate::yang::Subinterface;

/// Groups removed on delete, in order
const DELETE_ORDER: [AttrGroup; 3] = [AttrGroup::Description, AttrGroup::Vlan, AttrGroup::Ipv4];

/// Operations for one attribute group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlan {
    pub group: AttrGroup,
    pub ops: Vec<SetOperation>,
}

/// Interface Manager
///
/// Reconciles one declared interface at a time against a device session.
/// Every set operation goes out in its own request, so a failure always
/// points at exactly one operation and path.
pub struct IntfMgr<T: GnmiTransport> {
    transport: Arc<T>,
    paths: Arc<PathTable>,
}

impl<T: GnmiTransport> IntfMgr<T> {
    /// Create a manager using the OpenConfig path table
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_paths(transport, Arc::new(PathTable::openconfig()))
    }

    /// Create a manager with a custom path table
    pub fn with_paths(transport: Arc<T>, paths: Arc<PathTable>) -> Self {
        info!("IntfMgr initialized");
        Self { transport, paths }
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    /// Compute the per-group operations that move `prior` to `desired`
    ///
    /// Groups come out in application order: description, ipv4, vlan.
    /// Groups that did not change, or that do not apply to the port mode,
    /// are left out.
    pub fn plan_update(
        &self,
        prior: &InterfaceSpec,
        desired: &InterfaceSpec,
    ) -> CfgMgrResult<Vec<GroupPlan>> {
        check_immutable(prior, desired)?;

        let name = &desired.name;
        let mut plan = Vec::new();

        if prior.description != desired.description {
            let path = self.paths.resolve(AttrGroup::Description, name);
            let val = desired.description.clone().unwrap_or_default();
            plan.push(GroupPlan {
                group: AttrGroup::Description,
                ops: vec![build(OpKind::Replace, &path, Payload::Raw(val))?],
            });
        }

        if !desired.switchport && prior.ipv4_address != desired.ipv4_address {
            let path = self.paths.resolve(AttrGroup::Ipv4, name);
            let mut sub = Subinterface::new(SUBINTERFACE_INDEX);
            sub.ipv4_mut().set_enabled(true);
            if let Some(cidr) = &desired.ipv4_address {
                assign_ipv4_address(&mut sub, cidr)?;
            }

            // Replace alone keeps the old address as a secondary on some
            // devices, so clear the node first.
            let ipv4 = sub.ipv4_mut();
            plan.push(GroupPlan {
                group: AttrGroup::Ipv4,
                ops: vec![
                    build(OpKind::Delete, &path, Payload::Absent)?,
                    build(OpKind::Replace, &path, Payload::Node(&*ipv4))?,
                ],
            });
        }

        if desired.switchport && desired.vlan_changed(prior) {
            let path = self.paths.resolve(AttrGroup::Vlan, name);
            let config = build_switched_vlan(desired);
            let op = if config.is_empty() {
                build(OpKind::Delete, &path, Payload::Absent)?
            } else {
                build(OpKind::Replace, &path, Payload::Node(&config))?
            };
            plan.push(GroupPlan {
                group: AttrGroup::Vlan,
                ops: vec![op],
            });
        }

        Ok(plan)
    }

    async fn apply(&self, ctx: &CancellationToken, op: &SetOperation) -> CfgMgrResult<()> {
        let path = op.path.to_string();
        debug!(kind = %op.kind, path = %path, "Sending set");
        cancellable(
            ctx,
            op.kind.as_str(),
            &path,
            self.transport.set(ctx, slice::from_ref(op)),
        )
        .await
    }

    async fn refresh(&self, ctx: &CancellationToken, resource: &mut InterfaceResource) -> Refresh {
        let refresh = Refresh::from(self.read_interface(ctx, resource).await);
        if let Some(e) = refresh.stale_reason() {
            warn!(interface = %resource.attrs.name, error = %e, "Observed state may be stale");
        }
        refresh
    }

    #[instrument(skip(self, ctx, resource, desired), fields(interface = %desired.name))]
    async fn create_interface(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
        desired: InterfaceSpec,
    ) -> CfgMgrResult<Refresh> {
        desired.validate()?;
        let intf = assemble(&desired)?;
        let path = self.paths.resolve(AttrGroup::Global, &desired.name);
        let op = build(OpKind::Update, &path, Payload::Node(&intf))?;

        resource.state = LifecycleState::Creating;
        if let Err(e) = self.apply(ctx, &op).await {
            resource.state = LifecycleState::Absent;
            return Err(e);
        }

        info!("Created interface");
        resource.id = Some(desired.name.clone());
        resource.attrs = desired;
        resource.state = LifecycleState::Present;

        Ok(self.refresh(ctx, resource).await)
    }

    #[instrument(skip(self, ctx, resource), fields(interface = %resource.attrs.name))]
    async fn read_interface(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
    ) -> CfgMgrResult<()> {
        let name = resource.require_id()?.to_string();
        let path = self.paths.resolve_path(AttrGroup::Global, &name)?;
        let path_str = path.to_string();

        debug!(path = %path_str, "Sending get");
        let resp = cancellable(
            ctx,
            "get",
            &path_str,
            self.transport.get(ctx, slice::from_ref(&path)),
        )
        .await?;

        let intf = state::decode(&path, &resp)?;
        let observed = state::observe(&intf, &resource.attrs)?;

        resource.attrs = observed;
        resource.state = LifecycleState::Present;
        Ok(())
    }

    #[instrument(skip(self, ctx, resource, desired), fields(interface = %desired.name))]
    async fn update_interface(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
        desired: InterfaceSpec,
    ) -> CfgMgrResult<Refresh> {
        resource.require_id()?;
        check_immutable(&resource.attrs, &desired)?;
        desired.validate()?;
        let plan = self.plan_update(&resource.attrs, &desired)?;

        resource.state = LifecycleState::Updating;
        for step in &plan {
            for op in &step.ops {
                if let Err(e) = self.apply(ctx, op).await {
                    warn!(group = %step.group, error = %e, "Update stopped");
                    resource.state = LifecycleState::Present;
                    return Err(e);
                }
            }
            commit_group(&mut resource.attrs, &desired, step.group);
            debug!(group = %step.group, "Group applied");
        }
        resource.state = LifecycleState::Present;

        Ok(self.refresh(ctx, resource).await)
    }

    #[instrument(skip(self, ctx, resource), fields(interface = %resource.attrs.name))]
    async fn delete_interface(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
    ) -> CfgMgrResult<()> {
        let name = resource.require_id()?.to_string();

        resource.state = LifecycleState::Deleting;
        for group in DELETE_ORDER {
            let path = self.paths.resolve(group, &name);
            let op = build(OpKind::Delete, &path, Payload::Absent)?;
            if let Err(e) = self.apply(ctx, &op).await {
                warn!(group = %group, path = %path, error = %e, "Delete stopped part-way");
                return Err(CfgMgrError::PartialDelete {
                    group: group.to_string(),
                    path,
                    source: Box::new(e),
                });
            }
        }

        info!("Deleted interface");
        resource.id = None;
        resource.state = LifecycleState::Absent;
        Ok(())
    }
}

fn check_immutable(prior: &InterfaceSpec, desired: &InterfaceSpec) -> CfgMgrResult<()> {
    if prior.name != desired.name {
        return Err(CfgMgrError::ImmutableField {
            field: "name".to_string(),
        });
    }
    if prior.switchport != desired.switchport {
        return Err(CfgMgrError::ImmutableField {
            field: "switchport".to_string(),
        });
    }
    Ok(())
}

/// Record a group's declared values once the device has accepted them
fn commit_group(attrs: &mut InterfaceSpec, desired: &InterfaceSpec, group: AttrGroup) {
    match group {
        AttrGroup::Description => attrs.description = desired.description.clone(),
        AttrGroup::Ipv4 => attrs.ipv4_address = desired.ipv4_address.clone(),
        AttrGroup::Vlan => {
            attrs.access_vlan = desired.access_vlan;
            attrs.trunk_vlans = desired.trunk_vlans.clone();
        }
        AttrGroup::Global => {}
    }
}

#[async_trait]
impl<T: GnmiTransport> ResourceMgr for IntfMgr<T> {
    type Spec = InterfaceSpec;
    type Resource = InterfaceResource;

    fn resource_type(&self) -> &str {
        "interface"
    }

    async fn create(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
        desired: InterfaceSpec,
    ) -> CfgMgrResult<Refresh> {
        self.create_interface(ctx, resource, desired).await
    }

    async fn read(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
    ) -> CfgMgrResult<()> {
        self.read_interface(ctx, resource).await
    }

    async fn update(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
        desired: InterfaceSpec,
    ) -> CfgMgrResult<Refresh> {
        self.update_interface(ctx, resource, desired).await
    }

    async fn delete(
        &self,
        ctx: &CancellationToken,
        resource: &mut InterfaceResource,
    ) -> CfgMgrResult<()> {
        self.delete_interface(ctx, resource).await
    }
}
