//! Type variants of the design model.

use super::attribute::Attribute;
use super::media::MediaInfo;
use crate::error::Provenance;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Handle of a user or media type in the design arena. Two references to
/// the same type always carry the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Integer,
    Number,
    String,
    DateTime,
    Uuid,
    Any,
    File,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Integer,
        Primitive::Number,
        Primitive::String,
        Primitive::DateTime,
        Primitive::Uuid,
        Primitive::Any,
        Primitive::File,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Integer => "Integer",
            Primitive::Number => "Number",
            Primitive::String => "String",
            Primitive::DateTime => "DateTime",
            Primitive::Uuid => "UUID",
            Primitive::Any => "Any",
            Primitive::File => "File",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Primitive::Integer | Primitive::Number)
    }

    /// Whether values of this primitive are carried as JSON strings.
    pub fn is_stringy(self) -> bool {
        matches!(
            self,
            Primitive::String | Primitive::DateTime | Primitive::Uuid | Primitive::File
        )
    }

    /// Whether `value` is a valid instance of this primitive.
    pub fn is_compatible(self, value: &Value) -> bool {
        match self {
            Primitive::Boolean => value.is_boolean(),
            Primitive::Integer => value.is_i64() || value.is_u64(),
            Primitive::Number => value.is_number(),
            Primitive::String | Primitive::File => value.is_string(),
            Primitive::DateTime => value.as_str().is_some_and(|s| {
                time::OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
                    .is_ok()
            }),
            Primitive::Uuid => value
                .as_str()
                .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
            Primitive::Any => true,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named attributes of an object type. Keys are kept sorted so output is
/// deterministic.
pub type Object = BTreeMap<String, Attribute>;

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Primitive(Primitive),
    Object(Object),
    Array(Box<Attribute>),
    Hash {
        key: Box<Attribute>,
        elem: Box<Attribute>,
    },
    /// Reference to a user or media type in the arena.
    User(TypeId),
}

impl DataType {
    pub fn array_of(elem: DataType) -> DataType {
        DataType::Array(Box::new(Attribute::new(elem)))
    }

    pub fn hash_of(key: DataType, elem: DataType) -> DataType {
        DataType::Hash {
            key: Box::new(Attribute::new(key)),
            elem: Box::new(Attribute::new(elem)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DataType::Primitive(_) => "primitive",
            DataType::Object(_) => "object",
            DataType::Array(_) => "array",
            DataType::Hash { .. } => "hash",
            DataType::User(_) => "user type",
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            DataType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<TypeId> {
        match self {
            DataType::User(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Primitive> for DataType {
    fn from(p: Primitive) -> Self {
        DataType::Primitive(p)
    }
}

impl From<TypeId> for DataType {
    fn from(id: TypeId) -> Self {
        DataType::User(id)
    }
}

/// A named type. Media types are user types with media information.
#[derive(Debug, Clone, PartialEq)]
pub struct UserType {
    pub name: String,
    pub attribute: Attribute,
    /// Base type properties are inherited from during finalize.
    pub reference: Option<TypeId>,
    pub media: Option<MediaInfo>,
    pub prov: Option<Provenance>,
}

impl UserType {
    pub fn new(name: impl Into<String>, attribute: Attribute) -> Self {
        UserType {
            name: name.into(),
            attribute,
            reference: None,
            media: None,
            prov: None,
        }
    }

    pub fn is_media(&self) -> bool {
        self.media.is_some()
    }
}

/// Type argument of a declaration: a name to look up or a concrete type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Primitive name, type name, media type name or identifier.
    Named(String),
    Type(DataType),
    Array(Box<TypeRef>),
    Hash(Box<TypeRef>, Box<TypeRef>),
    Id(TypeId),
}

pub fn array_of(elem: impl Into<TypeRef>) -> TypeRef {
    TypeRef::Array(Box::new(elem.into()))
}

pub fn hash_of(key: impl Into<TypeRef>, elem: impl Into<TypeRef>) -> TypeRef {
    TypeRef::Hash(Box::new(key.into()), Box::new(elem.into()))
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Named(name.to_owned())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Named(name)
    }
}

impl From<Primitive> for TypeRef {
    fn from(p: Primitive) -> Self {
        TypeRef::Type(DataType::Primitive(p))
    }
}

impl From<DataType> for TypeRef {
    fn from(dt: DataType) -> Self {
        TypeRef::Type(dt)
    }
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        TypeRef::Id(id)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(n) => write!(f, "{:?}", n),
            TypeRef::Type(dt) => f.write_str(dt.kind()),
            TypeRef::Array(e) => write!(f, "array of {}", e),
            TypeRef::Hash(k, e) => write!(f, "hash of {} to {}", k, e),
            TypeRef::Id(id) => write!(f, "type {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitive_names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("Bottle"), None);
    }

    #[test]
    fn compatibility_checks() {
        assert!(Primitive::Integer.is_compatible(&json!(3)));
        assert!(!Primitive::Integer.is_compatible(&json!(3.5)));
        assert!(Primitive::Number.is_compatible(&json!(3.5)));
        assert!(Primitive::DateTime.is_compatible(&json!("2016-01-02T15:04:05Z")));
        assert!(!Primitive::DateTime.is_compatible(&json!("yesterday")));
        assert!(Primitive::Uuid.is_compatible(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8")));
        assert!(!Primitive::Uuid.is_compatible(&json!("nope")));
        assert!(Primitive::Any.is_compatible(&json!({"a": 1})));
        assert!(!Primitive::Boolean.is_compatible(&json!("true")));
    }
}
