//! Schema definitions: one field tree plus the jobs submitted against it.

use serde::{Deserialize, Serialize};

use dex_model::{
    FieldId, JobId, Result, SchemaField, SchemaId, VisualGroup, prune_groups, remove_field,
    update_field,
};

use crate::job::ExtractionJob;

/// One schema tree, its jobs and its visual column groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub id: SchemaId,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
    #[serde(default)]
    pub jobs: Vec<ExtractionJob>,
    #[serde(default)]
    pub visual_groups: Vec<VisualGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl SchemaDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SchemaId::new(),
            name: name.into(),
            fields: Vec::new(),
            jobs: Vec::new(),
            visual_groups: Vec::new(),
            template_id: None,
        }
    }

    /// Append a top-level field.
    pub fn add_field(&mut self, field: SchemaField) {
        self.fields.push(field);
    }

    /// Edit a field anywhere in the tree; stale ids are a no-op.
    pub fn update_field(&mut self, id: &FieldId, edit: impl FnOnce(&mut SchemaField)) -> bool {
        update_field(&mut self.fields, id, edit)
    }

    /// Remove a field and strip it from every visual group. Groups left
    /// empty are deleted.
    pub fn remove_field(&mut self, id: &FieldId) -> Result<bool> {
        let removed = remove_field(&mut self.fields, id)?;
        if removed {
            prune_groups(&mut self.visual_groups, id);
        }
        Ok(removed)
    }

    pub fn add_job(&mut self, job: ExtractionJob) {
        self.jobs.push(job);
    }

    pub fn job(&self, id: &JobId) -> Option<&ExtractionJob> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn job_mut(&mut self, id: &JobId) -> Option<&mut ExtractionJob> {
        self.jobs.iter_mut().find(|job| &job.id == id)
    }

    /// Delete a job explicitly. Jobs are never resurrected; a pipeline still
    /// in flight for this id will find nothing to update and no-op.
    pub fn delete_job(&mut self, id: &JobId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|job| &job.id != id);
        self.jobs.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_model::FieldType;

    #[test]
    fn removing_field_prunes_group_membership() {
        let mut schema = SchemaDefinition::new("Invoices");
        let total = SchemaField::number("Total");
        let tax = SchemaField::number("Tax");
        let total_id = total.id.clone();
        let tax_id = tax.id.clone();
        schema.add_field(total);
        schema.add_field(tax);
        schema
            .visual_groups
            .push(VisualGroup::new("Amounts", vec![total_id.clone(), tax_id]));

        schema.remove_field(&total_id).expect("remove");
        assert_eq!(schema.visual_groups.len(), 1);
        assert_eq!(schema.visual_groups[0].member_ids.len(), 1);
    }

    #[test]
    fn removing_last_group_member_deletes_group() {
        let mut schema = SchemaDefinition::new("Invoices");
        let total = SchemaField::number("Total");
        let total_id = total.id.clone();
        schema.add_field(total);
        schema
            .visual_groups
            .push(VisualGroup::new("Amounts", vec![total_id.clone()]));

        schema.remove_field(&total_id).expect("remove");
        assert!(schema.visual_groups.is_empty());
    }

    #[test]
    fn update_field_changes_type_in_place() {
        let mut schema = SchemaDefinition::new("Invoices");
        let field = SchemaField::string("Items");
        let id = field.id.clone();
        schema.add_field(field);
        assert!(schema.update_field(&id, |f| f.convert_to(FieldType::List)));
        assert_eq!(schema.fields[0].field_type(), FieldType::List);
    }

    #[test]
    fn delete_job_is_idempotent() {
        let mut schema = SchemaDefinition::new("Invoices");
        let job = ExtractionJob::new("a.pdf");
        let id = job.id.clone();
        schema.add_job(job);
        assert!(schema.delete_job(&id));
        assert!(!schema.delete_job(&id));
    }
}
