//! Column projection: flattened leaves plus visual group headers.

use dex_jobs::ExtractionJob;
use dex_model::{FieldId, FlatLeaf, GroupId, SchemaField, VisualGroup, flatten};

use crate::width::{self, header_width, sampled_width};

/// One grid column. `manual` marks a user drag-resize, which pins the width
/// against the heuristic until the projection is rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub leaf: FlatLeaf,
    pub width: u16,
    pub manual: bool,
}

impl GridColumn {
    pub fn set_manual_width(&mut self, width: u16) {
        self.width = width::clamp_width(width);
        self.manual = true;
    }

    /// Double-click auto-fit: back to the header-derived width.
    pub fn auto_fit(&mut self) {
        self.width = header_width(&self.leaf.name);
        self.manual = false;
    }
}

/// The grid's column model for one schema: leaves in declaration order plus
/// the group headers that span them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridProjection {
    pub columns: Vec<GridColumn>,
    pub groups: Vec<VisualGroup>,
}

impl GridProjection {
    /// Build the projection, sizing every column against the sampled jobs.
    ///
    /// Group membership is filtered to leaves that still exist; a leaf kept
    /// by more than one group stays in the first and is dropped from the
    /// rest, and groups left without members disappear.
    pub fn project(
        fields: &[SchemaField],
        groups: &[VisualGroup],
        jobs: &[ExtractionJob],
    ) -> Self {
        let columns: Vec<GridColumn> = flatten(fields)
            .into_iter()
            .map(|leaf| GridColumn {
                width: sampled_width(&leaf, jobs),
                manual: false,
                leaf,
            })
            .collect();

        let mut claimed: Vec<FieldId> = Vec::new();
        let mut groups: Vec<VisualGroup> = groups.to_vec();
        for group in &mut groups {
            group.member_ids.retain(|member| {
                let live = columns.iter().any(|column| &column.leaf.id == member);
                let free = !claimed.contains(member);
                if live && free {
                    claimed.push(member.clone());
                }
                live && free
            });
        }
        groups.retain(|group| !group.is_empty());

        Self { columns, groups }
    }

    pub fn column(&self, id: &FieldId) -> Option<&GridColumn> {
        self.columns.iter().find(|column| &column.leaf.id == id)
    }

    pub fn column_mut(&mut self, id: &FieldId) -> Option<&mut GridColumn> {
        self.columns.iter_mut().find(|column| &column.leaf.id == id)
    }

    /// The group header a leaf renders under, if any.
    pub fn group_of(&self, id: &FieldId) -> Option<&VisualGroup> {
        self.groups
            .iter()
            .find(|group| group.member_ids.contains(id))
    }

    pub fn group(&self, id: &GroupId) -> Option<&VisualGroup> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Total pixel width of the row, ungrouped and grouped columns alike.
    pub fn total_width(&self) -> u32 {
        self.columns
            .iter()
            .map(|column| u32::from(column.width))
            .sum()
    }
}
