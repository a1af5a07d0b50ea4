//! Schema field tree definitions.
//!
//! A schema is an ordered forest of [`SchemaField`] nodes. Each node is either
//! a leaf (a primitive value extracted from a document) or a container
//! (`object`, `list`, `table`). The container payload lives inside
//! [`FieldKind`], so a `list` without an item shape is unrepresentable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::FieldId;

/// The payload of a schema field, tagged by `type` on the wire.
///
/// Leaf variants carry no payload; the three container variants each carry
/// exactly the nested shape that their type requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Decimal,
    Boolean,
    Date,
    Email,
    Url,
    Phone,
    Address,
    Richtext,
    /// A labeled record of named children.
    Object { children: Vec<SchemaField> },
    /// A homogeneous array; `item` describes the shape of every element.
    List { item: Box<SchemaField> },
    /// Rows sharing a column schema.
    Table { columns: Vec<SchemaField> },
}

impl FieldKind {
    /// The `type` tag for this kind.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::String => FieldType::String,
            FieldKind::Number => FieldType::Number,
            FieldKind::Decimal => FieldType::Decimal,
            FieldKind::Boolean => FieldType::Boolean,
            FieldKind::Date => FieldType::Date,
            FieldKind::Email => FieldType::Email,
            FieldKind::Url => FieldType::Url,
            FieldKind::Phone => FieldType::Phone,
            FieldKind::Address => FieldType::Address,
            FieldKind::Richtext => FieldType::Richtext,
            FieldKind::Object { .. } => FieldType::Object,
            FieldKind::List { .. } => FieldType::List,
            FieldKind::Table { .. } => FieldType::Table,
        }
    }

    /// True for `object`, `list` and `table`.
    pub fn is_container(&self) -> bool {
        self.field_type().is_container()
    }
}

/// The `type` discriminant of a field, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Decimal,
    Boolean,
    Date,
    Email,
    Url,
    Phone,
    Address,
    Richtext,
    Object,
    List,
    Table,
}

impl FieldType {
    /// True for the structured kinds whose value is nested rather than atomic.
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::List | FieldType::Table)
    }

    /// The canonical lowercase tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Phone => "phone",
            FieldType::Address => "address",
            FieldType::Richtext => "richtext",
            FieldType::Object => "object",
            FieldType::List => "list",
            FieldType::Table => "table",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "decimal" => Ok(FieldType::Decimal),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            "email" => Ok(FieldType::Email),
            "url" => Ok(FieldType::Url),
            "phone" => Ok(FieldType::Phone),
            "address" => Ok(FieldType::Address),
            "richtext" => Ok(FieldType::Richtext),
            "object" => Ok(FieldType::Object),
            "list" => Ok(FieldType::List),
            "table" => Ok(FieldType::Table),
            _ => Err(format!("Unknown field type: {}", s)),
        }
    }
}

/// Optional validation constraints on a leaf field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// How a transformation field computes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationType {
    /// Arithmetic formula over `{Column Name}` tokens.
    Calculation,
    /// `amount x rate`, rounded to a configured number of decimals.
    CurrencyConversion,
    /// Placeholder classifier writing a string into the result slot.
    Classification,
    /// Delegated call to an opaque external model.
    ExternalModel,
}

impl TransformationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationType::Calculation => "calculation",
            TransformationType::CurrencyConversion => "currency_conversion",
            TransformationType::Classification => "classification",
            TransformationType::ExternalModel => "external_model",
        }
    }
}

impl fmt::Display for TransformationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a transformation draws its input from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationSource {
    /// The whole submitted document.
    #[default]
    Document,
    /// A single resolved column value.
    Column,
}

/// Transformation attributes carried by a leaf field.
///
/// The `config` payload is opaque at the model layer; the transformation
/// engine interprets it per [`TransformationType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub transformation_type: TransformationType,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub source: TransformationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column_id: Option<FieldId>,
}

impl Transformation {
    pub fn new(transformation_type: TransformationType, config: Value) -> Self {
        Self {
            transformation_type,
            config,
            source: TransformationSource::default(),
            source_column_id: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: TransformationSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_source_column(mut self, id: FieldId) -> Self {
        self.source = TransformationSource::Column;
        self.source_column_id = Some(id);
        self
    }
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: FieldId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text hint passed through to the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_instructions: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl SchemaField {
    /// Create a field of the given type with a fresh id.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: FieldId::new(),
            name: name.into(),
            description: None,
            extraction_instructions: None,
            required: false,
            constraints: None,
            transformation: None,
            kind: default_kind(field_type),
        }
    }

    /// Convenience constructor for a string leaf.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Convenience constructor for a number leaf.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Convenience constructor for an object with the given children.
    pub fn object(name: impl Into<String>, children: Vec<SchemaField>) -> Self {
        let mut field = Self::new(name, FieldType::Object);
        field.kind = FieldKind::Object { children };
        field
    }

    /// Convenience constructor for a list with the given item shape.
    pub fn list(name: impl Into<String>, item: SchemaField) -> Self {
        let mut field = Self::new(name, FieldType::List);
        field.kind = FieldKind::List {
            item: Box::new(item),
        };
        field
    }

    /// Convenience constructor for a table with the given columns.
    pub fn table(name: impl Into<String>, columns: Vec<SchemaField>) -> Self {
        let mut field = Self::new(name, FieldType::Table);
        field.kind = FieldKind::Table { columns };
        field
    }

    #[must_use]
    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = Some(transformation);
        self
    }

    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// True when this leaf computes its value instead of extracting it.
    pub fn is_transformation(&self) -> bool {
        self.transformation.is_some()
    }

    /// Change the field's type, keeping exactly one container payload.
    ///
    /// Converting between container kinds drops the old payload and installs
    /// the default for the new kind; a list gets a default string item.
    /// Converting to a container kind clears any transformation, since
    /// transformations apply to leaves only. Converting to the current type
    /// is a no-op.
    pub fn convert_to(&mut self, field_type: FieldType) {
        if self.field_type() == field_type {
            return;
        }
        self.kind = default_kind(field_type);
        if field_type.is_container() {
            self.transformation = None;
        }
    }
}

/// The default payload for a freshly created or converted field.
fn default_kind(field_type: FieldType) -> FieldKind {
    match field_type {
        FieldType::String => FieldKind::String,
        FieldType::Number => FieldKind::Number,
        FieldType::Decimal => FieldKind::Decimal,
        FieldType::Boolean => FieldKind::Boolean,
        FieldType::Date => FieldKind::Date,
        FieldType::Email => FieldKind::Email,
        FieldType::Url => FieldKind::Url,
        FieldType::Phone => FieldKind::Phone,
        FieldType::Address => FieldKind::Address,
        FieldType::Richtext => FieldKind::Richtext,
        FieldType::Object => FieldKind::Object {
            children: Vec::new(),
        },
        FieldType::List => FieldKind::List {
            item: Box::new(SchemaField::string("Item")),
        },
        FieldType::Table => FieldKind::Table {
            columns: Vec::new(),
        },
    }
}
