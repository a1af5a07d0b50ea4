//! Visual column groups.
//!
//! A group is a named cluster of leaf ids rendered under a shared header in
//! the grid. Membership invariants live here so that every caller that
//! removes a schema field goes through the same pruning.

use serde::{Deserialize, Serialize};

use crate::ids::{FieldId, GroupId};

/// A named cluster of leaf columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualGroup {
    pub id: GroupId,
    pub name: String,
    pub member_ids: Vec<FieldId>,
}

impl VisualGroup {
    pub fn new(name: impl Into<String>, member_ids: Vec<FieldId>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            member_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}

/// Drop a removed field from every group and delete groups left empty.
pub fn prune_groups(groups: &mut Vec<VisualGroup>, removed: &FieldId) {
    for group in groups.iter_mut() {
        group.member_ids.retain(|member| member != removed);
    }
    groups.retain(|group| !group.is_empty());
}

/// Move a leaf into `target`, removing it from every other group first.
///
/// A leaf belongs to at most one group; assigning to an unknown group id is
/// a no-op beyond the removal.
pub fn assign_to_group(groups: &mut Vec<VisualGroup>, leaf: &FieldId, target: &GroupId) {
    for group in groups.iter_mut() {
        group.member_ids.retain(|member| member != leaf);
    }
    if let Some(group) = groups.iter_mut().find(|group| &group.id == target)
        && !group.member_ids.contains(leaf)
    {
        group.member_ids.push(leaf.clone());
    }
    groups.retain(|group| !group.is_empty());
}
