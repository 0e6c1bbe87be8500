//! Record validation
//!
//! An [`EntitySchema`] describes one logical record type as an ordered list of
//! [`FieldSpec`]s. Parsing raw JSON through it produces a [`Record`]: declared
//! fields are type-checked, absent fields receive their defaults, and keys the
//! schema does not know about are stripped (unless the schema is
//! [`passthrough`](EntitySchema::passthrough)).
//!
//! A [`KeySchema`] is the subset of fields that addresses a record in storage.
//!
//! ```rust,ignore
//! use dmvc_core::schema::{EntitySchema, FieldSpec, KeySchema};
//!
//! let todo = EntitySchema::new(vec![
//!     FieldSpec::string("todo"),
//!     FieldSpec::literal("kind", "todo").default_value("todo"),
//!     FieldSpec::string("title"),
//!     FieldSpec::boolean("done").default_value(false),
//! ]);
//! let key = KeySchema::new(vec![
//!     FieldSpec::string("todo"),
//!     FieldSpec::literal("kind", "todo").default_value("todo"),
//! ]);
//! ```

pub mod field;

pub use field::{FieldSpec, FieldType};

use crate::error::{FieldIssue, SchemaError, ValidationError};
use field::kind_of;
use serde_json::Value;

/// A validated record: field name to JSON value
pub type Record = serde_json::Map<String, Value>;

/// Build a record from `(field, value)` pairs
pub fn record<const N: usize>(pairs: [(&str, Value); N]) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Structural definition of a record's fields and validation rules
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    fields: Vec<FieldSpec>,
    passthrough: bool,
}

impl EntitySchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields, passthrough: false }
    }

    /// Keep undeclared keys instead of stripping them
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a full record, applying defaults for absent fields
    pub fn parse(&self, input: &Value) -> Result<Record, ValidationError> {
        self.parse_with(input, false)
    }

    /// Validate a partial record: every field optional, no defaults applied
    pub fn parse_partial(&self, input: &Value) -> Result<Record, ValidationError> {
        self.parse_with(input, true)
    }

    fn parse_with(&self, input: &Value, partial: bool) -> Result<Record, ValidationError> {
        let Some(obj) = input.as_object() else {
            return Err(ValidationError::single("", format!("Expected object, received {}", kind_of(input))));
        };

        let mut out = Record::new();
        let mut issues = Vec::new();

        for spec in &self.fields {
            match obj.get(&spec.name) {
                Some(Value::Null) if spec.nullable => {
                    out.insert(spec.name.clone(), Value::Null);
                }
                Some(value) if !value.is_null() && spec.ty.accepts(value) => {
                    out.insert(spec.name.clone(), value.clone());
                }
                Some(value) => {
                    issues.push(FieldIssue::new(
                        &spec.name,
                        format!("Expected {}, received {}", spec.ty, kind_of(value)),
                    ));
                }
                None if partial => {}
                None => {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.clone(), default.clone());
                    } else if spec.required {
                        issues.push(FieldIssue::new(&spec.name, "Required"));
                    }
                }
            }
        }

        if self.passthrough {
            for (k, v) in obj {
                if self.field(k).is_none() {
                    out.insert(k.clone(), v.clone());
                }
            }
        }

        if issues.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Convert string filter values to the declared field types.
    ///
    /// Values that are unknown or that do not parse are left as strings.
    pub fn coerce_facets(&self, facets: Record) -> Record {
        facets
            .into_iter()
            .map(|(name, value)| {
                let coerced = match (&value, self.field(&name)) {
                    (Value::String(raw), Some(spec)) => spec.ty.coerce_str(raw),
                    _ => None,
                };
                (name, coerced.unwrap_or(value))
            })
            .collect()
    }
}

/// Subset of an entity's fields that uniquely addresses a record
#[derive(Debug, Clone, PartialEq)]
pub struct KeySchema(EntitySchema);

impl KeySchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self(EntitySchema::new(fields))
    }

    /// Key field names in declaration order
    pub fn key_names(&self) -> Vec<String> {
        self.0.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_composite(&self) -> bool {
        self.0.fields.len() > 1
    }

    /// Extract and validate the key portion of a record (defaults applied)
    pub fn parse(&self, input: &Value) -> Result<Record, ValidationError> {
        self.0.parse(input)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        self.0.fields()
    }

    /// Ensure every key field is declared by `entity` with a compatible type
    pub fn check_against(&self, entity: &EntitySchema) -> Result<(), SchemaError> {
        if self.0.fields.is_empty() {
            return Err(SchemaError::EmptyKey);
        }
        for key in &self.0.fields {
            let Some(decl) = entity.field(&key.name) else {
                return Err(SchemaError::MissingKeyField(key.name.clone()));
            };
            if !key.ty.compatible_with(&decl.ty) {
                return Err(SchemaError::IncompatibleKeyField {
                    field: key.name.clone(),
                    key_type: key.ty.to_string(),
                    entity_type: decl.ty.to_string(),
                });
            }
        }
        Ok(())
    }
}
