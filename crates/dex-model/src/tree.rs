//! Pure operations over the schema field tree.
//!
//! All traversal is pre-order and stable with respect to schema declaration
//! order. Mutating operations address nodes by [`FieldId`] and are total:
//! an unmatched id is a no-op, never an error, so that a UI racing a delete
//! against an edit degrades to nothing instead of failing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::field::{FieldKind, FieldType, SchemaField};
use crate::ids::FieldId;

/// One ancestor step in a [`FlatLeaf`] path, enough to re-nest a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub id: FieldId,
    pub name: String,
}

/// A leaf-level projection of a schema field, produced by [`flatten`].
///
/// Container fields of kind `list` and `table` appear as a single leaf (the
/// grid shows them as one summary cell); `object` fields are not emitted at
/// all, only their descendants are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatLeaf {
    pub id: FieldId,
    pub name: String,
    pub field_type: FieldType,
    /// Ancestor chain from the schema root, outermost first.
    pub path: Vec<PathSegment>,
    /// True when this leaf stands for a whole `list` or `table` value.
    pub container: bool,
}

/// Flatten a schema tree to its leaf projection, in declaration order.
pub fn flatten(fields: &[SchemaField]) -> Vec<FlatLeaf> {
    let mut leaves = Vec::new();
    flatten_into(fields, &[], &mut leaves);
    leaves
}

fn flatten_into(fields: &[SchemaField], path: &[PathSegment], leaves: &mut Vec<FlatLeaf>) {
    for field in fields {
        match &field.kind {
            FieldKind::Object { children } => {
                let mut child_path = path.to_vec();
                child_path.push(PathSegment {
                    id: field.id.clone(),
                    name: field.name.clone(),
                });
                flatten_into(children, &child_path, leaves);
            }
            // Lists and tables are one column each; their inner shape is
            // rendered in a detail view, not expanded into grid columns.
            FieldKind::List { .. } | FieldKind::Table { .. } => leaves.push(FlatLeaf {
                id: field.id.clone(),
                name: field.name.clone(),
                field_type: field.field_type(),
                path: path.to_vec(),
                container: true,
            }),
            _ => leaves.push(FlatLeaf {
                id: field.id.clone(),
                name: field.name.clone(),
                field_type: field.field_type(),
                path: path.to_vec(),
                container: false,
            }),
        }
    }
}

/// Find a field anywhere in the tree by id.
pub fn find_field<'a>(fields: &'a [SchemaField], id: &FieldId) -> Option<&'a SchemaField> {
    for field in fields {
        if &field.id == id {
            return Some(field);
        }
        let nested = match &field.kind {
            FieldKind::Object { children } => find_field(children, id),
            FieldKind::List { item } => {
                if &item.id == id {
                    Some(item.as_ref())
                } else {
                    find_field(child_slice(item), id)
                }
            }
            FieldKind::Table { columns } => find_field(columns, id),
            _ => None,
        };
        if nested.is_some() {
            return nested;
        }
    }
    None
}

/// The children of a node viewed as a slice, for read-only traversal of a
/// list's item shape.
fn child_slice(item: &SchemaField) -> &[SchemaField] {
    match &item.kind {
        FieldKind::Object { children } => children,
        FieldKind::Table { columns } => columns,
        FieldKind::List { item } => std::slice::from_ref(item.as_ref()),
        _ => &[],
    }
}

/// Apply `edit` to the field matching `id`, recursing through containers.
///
/// Returns true when a node was edited. An unmatched id leaves the tree
/// untouched and returns false.
pub fn update_field(
    fields: &mut Vec<SchemaField>,
    id: &FieldId,
    edit: impl FnOnce(&mut SchemaField),
) -> bool {
    update_in(fields, id, &mut Some(edit))
}

fn update_in<F: FnOnce(&mut SchemaField)>(
    fields: &mut [SchemaField],
    id: &FieldId,
    edit: &mut Option<F>,
) -> bool {
    for field in fields.iter_mut() {
        if &field.id == id {
            if let Some(edit) = edit.take() {
                edit(field);
            }
            return true;
        }
        let found = match &mut field.kind {
            FieldKind::Object { children } => update_in(children, id, edit),
            FieldKind::List { item } => {
                if &item.id == id {
                    if let Some(edit) = edit.take() {
                        edit(item);
                    }
                    true
                } else {
                    update_in(std::slice::from_mut(item.as_mut()), id, edit)
                }
            }
            FieldKind::Table { columns } => update_in(columns, id, edit),
            _ => false,
        };
        if found {
            return true;
        }
    }
    false
}

/// Remove the field matching `id` from the tree.
///
/// Returns true when a node was removed; an unmatched id is a no-op.
/// Removing a `list`'s item shape is rejected with
/// [`ModelError::ListItemRemoval`] since every list has exactly one item
/// shape.
pub fn remove_field(fields: &mut Vec<SchemaField>, id: &FieldId) -> Result<bool> {
    if let Some(index) = fields.iter().position(|field| &field.id == id) {
        fields.remove(index);
        return Ok(true);
    }
    for field in fields.iter_mut() {
        let removed = match &mut field.kind {
            FieldKind::Object { children } => remove_field(children, id)?,
            FieldKind::List { item } => {
                if &item.id == id {
                    return Err(ModelError::ListItemRemoval(id.clone()));
                }
                remove_from_item(item, id)?
            }
            FieldKind::Table { columns } => remove_field(columns, id)?,
            _ => false,
        };
        if removed {
            return Ok(true);
        }
    }
    Ok(false)
}

fn remove_from_item(item: &mut SchemaField, id: &FieldId) -> Result<bool> {
    match &mut item.kind {
        FieldKind::Object { children } => remove_field(children, id),
        FieldKind::Table { columns } => remove_field(columns, id),
        FieldKind::List { item } => {
            if &item.id == id {
                return Err(ModelError::ListItemRemoval(id.clone()));
            }
            remove_from_item(item, id)
        }
        _ => Ok(false),
    }
}

/// Translate a nested extraction payload into a flat map keyed by field id.
///
/// The payload is keyed by field *name*: the extractor only ever sees names,
/// never internal ids. Object fields recurse and merge their children into
/// the same flat map; list and table values are copied through verbatim as
/// one opaque value under the container's own id. Fields absent from the
/// payload are absent from the map, not defaulted.
pub fn flatten_results(fields: &[SchemaField], nested: &Value) -> BTreeMap<FieldId, Value> {
    let mut out = BTreeMap::new();
    collect_results(fields, nested, &mut out);
    out
}

fn collect_results(fields: &[SchemaField], nested: &Value, out: &mut BTreeMap<FieldId, Value>) {
    let Some(map) = nested.as_object() else {
        return;
    };
    for field in fields {
        let Some(value) = map.get(&field.name) else {
            continue;
        };
        match &field.kind {
            FieldKind::Object { children } => collect_results(children, value, out),
            _ => {
                out.insert(field.id.clone(), value.clone());
            }
        }
    }
}

/// Re-nest a flat result map into the payload shape described by the schema.
///
/// Inverse of [`flatten_results`] for all fields present in the map; object
/// levels with no present descendants are omitted entirely.
pub fn nest_results(fields: &[SchemaField], flat: &BTreeMap<FieldId, Value>) -> Value {
    let mut map = serde_json::Map::new();
    for field in fields {
        match &field.kind {
            FieldKind::Object { children } => {
                let nested = nest_results(children, flat);
                let non_empty = nested.as_object().is_some_and(|inner| !inner.is_empty());
                if non_empty {
                    map.insert(field.name.clone(), nested);
                }
            }
            _ => {
                if let Some(value) = flat.get(&field.id) {
                    map.insert(field.name.clone(), value.clone());
                }
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice_schema() -> Vec<SchemaField> {
        vec![
            SchemaField::string("Invoice Number"),
            SchemaField::object(
                "Vendor",
                vec![SchemaField::string("Name"), SchemaField::string("Tax Id")],
            ),
            SchemaField::list("Line Items", SchemaField::string("Description")),
            SchemaField::table(
                "Payments",
                vec![SchemaField::string("Date"), SchemaField::number("Amount")],
            ),
            SchemaField::number("Total"),
        ]
    }

    #[test]
    fn flatten_emits_leaves_in_declaration_order() {
        let fields = invoice_schema();
        let leaves = flatten(&fields);
        let names: Vec<&str> = leaves.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Invoice Number",
                "Name",
                "Tax Id",
                "Line Items",
                "Payments",
                "Total"
            ]
        );
    }

    #[test]
    fn flatten_skips_objects_but_keeps_their_path() {
        let fields = invoice_schema();
        let leaves = flatten(&fields);
        let tax_id = leaves.iter().find(|l| l.name == "Tax Id").expect("leaf");
        assert_eq!(tax_id.path.len(), 1);
        assert_eq!(tax_id.path[0].name, "Vendor");
        assert!(!tax_id.container);
    }

    #[test]
    fn flatten_emits_list_and_table_as_single_container_leaves() {
        let fields = invoice_schema();
        let leaves = flatten(&fields);
        let items = leaves.iter().find(|l| l.name == "Line Items").expect("leaf");
        assert!(items.container);
        assert_eq!(items.field_type, FieldType::List);
        // The item shape is not expanded into columns.
        assert!(!leaves.iter().any(|l| l.name == "Description"));
    }

    #[test]
    fn update_field_edits_nested_node() {
        let mut fields = invoice_schema();
        let tax_id = flatten(&fields)
            .into_iter()
            .find(|l| l.name == "Tax Id")
            .expect("leaf")
            .id;
        let edited = update_field(&mut fields, &tax_id, |field| {
            field.name = "VAT Number".to_string();
        });
        assert!(edited);
        assert!(flatten(&fields).iter().any(|l| l.name == "VAT Number"));
    }

    #[test]
    fn update_field_with_stale_id_is_noop() {
        let mut fields = invoice_schema();
        let before = fields.clone();
        let edited = update_field(&mut fields, &FieldId::from("gone"), |field| {
            field.name = "Never".to_string();
        });
        assert!(!edited);
        assert_eq!(fields, before);
    }

    #[test]
    fn update_field_reaches_list_item_shape() {
        let mut fields = invoice_schema();
        let item_id = match &fields[2].kind {
            FieldKind::List { item } => item.id.clone(),
            _ => panic!("expected list"),
        };
        let edited = update_field(&mut fields, &item_id, |field| {
            field.convert_to(FieldType::Number);
        });
        assert!(edited);
        match &fields[2].kind {
            FieldKind::List { item } => assert_eq!(item.field_type(), FieldType::Number),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn remove_field_filters_nested_node() {
        let mut fields = invoice_schema();
        let tax_id = flatten(&fields)
            .into_iter()
            .find(|l| l.name == "Tax Id")
            .expect("leaf")
            .id;
        assert!(remove_field(&mut fields, &tax_id).expect("remove"));
        assert!(!flatten(&fields).iter().any(|l| l.name == "Tax Id"));
    }

    #[test]
    fn remove_field_rejects_list_item() {
        let mut fields = invoice_schema();
        let item_id = match &fields[2].kind {
            FieldKind::List { item } => item.id.clone(),
            _ => panic!("expected list"),
        };
        let err = remove_field(&mut fields, &item_id).expect_err("must reject");
        assert!(matches!(err, ModelError::ListItemRemoval(_)));
    }

    #[test]
    fn remove_field_with_stale_id_is_noop() {
        let mut fields = invoice_schema();
        let before = fields.clone();
        assert!(!remove_field(&mut fields, &FieldId::from("gone")).expect("remove"));
        assert_eq!(fields, before);
    }

    #[test]
    fn remove_table_column_inside_list_item() {
        let column = SchemaField::string("Qty");
        let column_id = column.id.clone();
        let item = SchemaField::table("Rows", vec![SchemaField::string("Sku"), column]);
        let mut fields = vec![SchemaField::list("Batches", item)];
        assert!(remove_field(&mut fields, &column_id).expect("remove"));
    }

    #[test]
    fn flatten_results_keys_by_id_and_merges_object_children() {
        let fields = invoice_schema();
        let payload = json!({
            "Invoice Number": "INV-7",
            "Vendor": { "Name": "Acme", "Tax Id": "DE-123" },
            "Line Items": [ { "Description": "Widget" } ],
            "Total": 41.5
        });
        let flat = flatten_results(&fields, &payload);

        let leaves = flatten(&fields);
        let by_name = |name: &str| {
            leaves
                .iter()
                .find(|l| l.name == name)
                .map(|l| l.id.clone())
                .expect("leaf")
        };
        assert_eq!(flat.get(&by_name("Invoice Number")), Some(&json!("INV-7")));
        assert_eq!(flat.get(&by_name("Name")), Some(&json!("Acme")));
        assert_eq!(
            flat.get(&by_name("Line Items")),
            Some(&json!([{ "Description": "Widget" }]))
        );
        // Vendor itself has no key of its own; Payments was absent.
        assert_eq!(flat.len(), 5);
        assert!(flat.get(&fields[1].id).is_none());
        assert!(flat.get(&by_name("Payments")).is_none());
    }

    #[test]
    fn flatten_results_ignores_non_object_payload() {
        let fields = invoice_schema();
        assert!(flatten_results(&fields, &json!("oops")).is_empty());
        assert!(flatten_results(&fields, &Value::Null).is_empty());
    }

    #[test]
    fn nest_results_round_trips_present_fields() {
        let fields = invoice_schema();
        let payload = json!({
            "Invoice Number": "INV-7",
            "Vendor": { "Name": "Acme" },
            "Payments": [ { "Date": "2024-01-01", "Amount": 10 } ],
            "Total": 41.5
        });
        let flat = flatten_results(&fields, &payload);
        assert_eq!(nest_results(&fields, &flat), payload);
    }
}
