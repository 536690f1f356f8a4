//! Attributes: the building block every type is made of.

use super::types::{DataType, Object, Primitive};
use crate::error::Provenance;
use serde_json::Value;
use std::collections::BTreeMap;

/// Generator hints: key to ordered values.
pub type Metadata = BTreeMap<String, Vec<String>>;

/// Metadata key flagging an attribute as read-only.
pub const READ_ONLY: &str = "read-only";

/// Formats accepted by the `format` validation.
pub const KNOWN_FORMATS: &[&str] = &[
    "date", "date-time", "email", "hostname", "ipv4", "ipv6", "ip", "uri", "mac", "cidr",
    "regexp", "json", "rfc1123",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub values: Vec<Value>,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub required: Vec<String>,
}

impl Validation {
    pub fn is_empty(&self) -> bool {
        *self == Validation::default()
    }

    /// Fill every unset constraint from `parent`.
    pub fn inherit(&mut self, parent: &Validation) {
        if self.values.is_empty() {
            self.values = parent.values.clone();
        }
        if self.format.is_none() {
            self.format = parent.format.clone();
        }
        if self.pattern.is_none() {
            self.pattern = parent.pattern.clone();
        }
        if self.minimum.is_none() {
            self.minimum = parent.minimum;
        }
        if self.maximum.is_none() {
            self.maximum = parent.maximum;
        }
        if self.min_length.is_none() {
            self.min_length = parent.min_length;
        }
        if self.max_length.is_none() {
            self.max_length = parent.max_length;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub data_type: DataType,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub validation: Validation,
    pub metadata: Metadata,
    /// View used when the attribute's media type is rendered.
    pub view: Option<String>,
    pub prov: Option<Provenance>,
}

impl Attribute {
    pub fn new(data_type: DataType) -> Self {
        Attribute {
            data_type,
            description: None,
            default: None,
            example: None,
            validation: Validation::default(),
            metadata: Metadata::new(),
            view: None,
            prov: None,
        }
    }

    pub fn object(object: Object) -> Self {
        Attribute::new(DataType::Object(object))
    }

    pub fn primitive(p: Primitive) -> Self {
        Attribute::new(DataType::Primitive(p))
    }

    /// The inline object of this attribute, if it is one. User type
    /// references are not followed; see `Design::to_object`.
    pub fn as_object(&self) -> Option<&Object> {
        match &self.data_type {
            DataType::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match &mut self.data_type {
            DataType::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.metadata.contains_key(READ_ONLY)
    }

    pub fn set_read_only(&mut self) {
        self.metadata
            .entry(READ_ONLY.to_owned())
            .or_insert_with(|| vec!["true".to_owned()]);
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.validation.required.iter().any(|r| r == name)
    }
}
