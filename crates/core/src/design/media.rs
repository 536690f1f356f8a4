//! Media type information: identifiers, views and links.

use super::attribute::Attribute;
use crate::error::Provenance;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_VIEW: &str = "default";
/// View links are rendered with unless they name one.
pub const LINK_VIEW: &str = "link";
/// Name of the view attribute standing for all links.
pub const LINKS_ATTRIBUTE: &str = "links";

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub identifier: String,
    pub content_type: Option<String>,
    pub views: BTreeMap<String, View>,
    pub links: BTreeMap<String, Link>,
}

impl MediaInfo {
    pub fn new(identifier: impl Into<String>) -> Self {
        MediaInfo {
            identifier: identifier.into(),
            content_type: None,
            views: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn is_collection(&self) -> bool {
        Identifier::parse(&self.identifier)
            .map(|id| id.params.get("type").map(String::as_str) == Some("collection"))
            .unwrap_or(false)
    }
}

/// A named subset of a media type's attributes. The attribute is an object
/// whose entries copy the full type's attributes, possibly with a view
/// override.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub attribute: Attribute,
    pub prov: Option<Provenance>,
}

/// Reference to the media type of an attribute, rendered through a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Name of the linked attribute.
    pub name: String,
    pub view: Option<String>,
    pub description: Option<String>,
    pub prov: Option<Provenance>,
}

impl Link {
    pub fn view_name(&self) -> &str {
        self.view.as_deref().unwrap_or(LINK_VIEW)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("invalid media type identifier {0:?}: expected type/subtype")]
    MissingSlash(String),
    #[error("invalid media type identifier {0:?}: bad character in {1:?}")]
    BadToken(String, String),
    #[error("invalid media type identifier {0:?}: malformed parameter {1:?}")]
    BadParameter(String, String),
}

/// A parsed MIME style identifier: `type/subtype; key=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub base: String,
    pub params: BTreeMap<String, String>,
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c)
        })
}

impl Identifier {
    pub fn parse(input: &str) -> Result<Identifier, IdentifierError> {
        let mut parts = input.split(';');
        let base = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let Some((major, minor)) = base.split_once('/') else {
            return Err(IdentifierError::MissingSlash(input.to_owned()));
        };
        for token in [major, minor] {
            if !is_token(token) {
                return Err(IdentifierError::BadToken(input.to_owned(), token.to_owned()));
            }
        }

        let mut params = BTreeMap::new();
        for raw in parts {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let Some((key, value)) = raw.split_once('=') else {
                return Err(IdentifierError::BadParameter(input.to_owned(), raw.to_owned()));
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');
            if !is_token(&key) || value.is_empty() {
                return Err(IdentifierError::BadParameter(input.to_owned(), raw.to_owned()));
            }
            params.insert(key, value.to_owned());
        }
        Ok(Identifier { base, params })
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Identifier {
        self.params.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn without_param(mut self, key: &str) -> Identifier {
        self.params.remove(key);
        self
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for (k, v) in &self.params {
            if is_token(v) {
                write!(f, "; {}={}", k, v)?;
            } else {
                write!(f, "; {}={:?}", k, v)?;
            }
        }
        Ok(())
    }
}

/// Identifier used as registry key: lowercased, parameters normalized and
/// the `+json` structured syntax suffix dropped. Unparseable identifiers
/// are returned unchanged.
pub fn canonical_identifier(identifier: &str) -> String {
    match Identifier::parse(identifier) {
        Ok(mut id) => {
            if let Some(stripped) = id.base.strip_suffix("+json") {
                id.base = stripped.to_owned();
            }
            id.to_string()
        }
        Err(_) => identifier.to_owned(),
    }
}

/// Type name inferred from an identifier:
/// `application/vnd.goa.bottle+json` gives `Bottle`.
pub fn default_type_name(identifier: &str) -> String {
    let base = identifier.split(';').next().unwrap_or_default().trim();
    let last = base.rsplit('/').next().unwrap_or(base);
    let last = last.rsplit('.').next().unwrap_or(last);
    let last = last.split('+').next().unwrap_or(last);
    camel_case(last)
}

pub(crate) fn camel_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect()
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
