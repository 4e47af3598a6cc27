//! Set-operation builder

use gnmi_cfgmgr_common::{CfgMgrError, CfgMgrResult, GnmiPath, OpKind, SetOperation};

use crate::yang::{emit_json, YangNode};

/// Value attached to a set operation
pub enum Payload<'a> {
    /// Subtree serialized to RFC 7951 JSON
    Node(&'a dyn YangNode),
    /// Pre-serialized value, attached as-is
    Raw(String),
    /// No value
    Absent,
}

impl std::fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Node(node) => write!(f, "Node({})", node.module()),
            Payload::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
            Payload::Absent => f.write_str("Absent"),
        }
    }
}

/// Build one set operation on `path`
///
/// Deletes never carry a value. An empty serialized value is dropped, so a
/// replace with an empty raw string clears the target leaf.
pub fn build(kind: OpKind, path: &str, payload: Payload<'_>) -> CfgMgrResult<SetOperation> {
    let target = GnmiPath::parse(path)?;
    let op = SetOperation::new(kind, target);

    if kind == OpKind::Delete {
        return Ok(op);
    }

    let val = match payload {
        Payload::Node(node) => emit_json(node).map_err(|source| CfgMgrError::Serialization {
            path: path.to_string(),
            source,
        })?,
        Payload::Raw(raw) => raw,
        Payload::Absent => String::new(),
    };

    if val.is_empty() {
        Ok(op)
    } else {
        Ok(op.with_val(val))
    }
}
