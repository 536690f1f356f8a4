//! API, resource, action and security definitions.

use super::attribute::Attribute;
use super::types::TypeId;
use crate::error::Provenance;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemeId(pub(crate) usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiDefinition {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub host: Option<String>,
    pub schemes: Vec<String>,
    pub base_path: Option<String>,
    pub base_params: Option<Attribute>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub security: Option<SecurityRef>,
    /// Responses every action gets unless it declares its own.
    pub responses: BTreeMap<String, Response>,
    pub prov: Option<Provenance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub description: Option<String>,
    pub base_path: String,
    pub parent: Option<String>,
    pub canonical_action: Option<String>,
    pub default_media: Option<TypeId>,
    pub params: Option<Attribute>,
    pub security: Option<SecurityRef>,
    pub responses: BTreeMap<String, Response>,
    /// Actions in declaration order.
    pub actions: Vec<Action>,
    pub prov: Option<Provenance>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Resource {
            name: name.into(),
            description: None,
            base_path: String::new(),
            parent: None,
            canonical_action: None,
            default_media: None,
            params: None,
            security: None,
            responses: BTreeMap::new(),
            actions: Vec::new(),
            prov: None,
        }
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub description: Option<String>,
    pub routes: Vec<Route>,
    pub params: Option<Attribute>,
    pub payload: Option<Attribute>,
    pub payload_optional: bool,
    pub responses: BTreeMap<String, Response>,
    pub security: Option<SecurityRef>,
    /// Explicitly opted out of security.
    pub no_security: bool,
    pub prov: Option<Provenance>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Action {
            name: name.into(),
            description: None,
            routes: Vec::new(),
            params: None,
            payload: None,
            payload_optional: false,
            responses: BTreeMap::new(),
            security: None,
            no_security: false,
            prov: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub verb: Verb,
    /// Relative to the resource path unless it starts with `//`.
    pub path: String,
    pub prov: Option<Provenance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub name: String,
    pub status: Option<u16>,
    pub description: Option<String>,
    /// Media type identifier or type name.
    pub media_type: Option<String>,
    pub view: Option<String>,
    pub headers: Option<Attribute>,
    pub prov: Option<Provenance>,
}

impl Response {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Response {
            status: standard_status(&name),
            name,
            description: None,
            media_type: None,
            view: None,
            headers: None,
            prov: None,
        }
    }
}

/// Status of the predefined response templates.
pub fn standard_status(name: &str) -> Option<u16> {
    Some(match name {
        "OK" => 200,
        "Created" => 201,
        "Accepted" => 202,
        "NoContent" => 204,
        "MovedPermanently" => 301,
        "Found" => 302,
        "NotModified" => 304,
        "BadRequest" => 400,
        "Unauthorized" => 401,
        "Forbidden" => 403,
        "NotFound" => 404,
        "Conflict" => 409,
        "UnprocessableEntity" => 422,
        "InternalServerError" => 500,
        "ServiceUnavailable" => 503,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityKind {
    Basic,
    ApiKey,
    OAuth2,
    Jwt,
    None,
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecurityKind::Basic => "basic",
            SecurityKind::ApiKey => "api-key",
            SecurityKind::OAuth2 => "oauth2",
            SecurityKind::Jwt => "jwt",
            SecurityKind::None => "none",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyLocation {
    Header,
    Query,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityScheme {
    pub name: String,
    pub kind: SecurityKind,
    pub description: Option<String>,
    pub key_name: Option<String>,
    pub key_location: Option<KeyLocation>,
    pub token_url: Option<String>,
    pub authorization_url: Option<String>,
    pub scopes: BTreeMap<String, String>,
    pub prov: Option<Provenance>,
}

impl SecurityScheme {
    pub fn new(name: impl Into<String>, kind: SecurityKind) -> Self {
        SecurityScheme {
            name: name.into(),
            kind,
            description: None,
            key_name: None,
            key_location: None,
            token_url: None,
            authorization_url: None,
            scopes: BTreeMap::new(),
            prov: None,
        }
    }
}

/// Security requirement: a scheme name and the scopes it demands.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityRef {
    pub scheme: String,
    pub scopes: Vec<String>,
    pub prov: Option<Provenance>,
}

/// Names of the `:name` and `*name` wildcards of a path, in order.
pub fn path_wildcards(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|seg| seg.strip_prefix(':').or_else(|| seg.strip_prefix('*')))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Join path fragments with single slashes; no trailing slash except for
/// the root path.
pub fn join_paths(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        for seg in part.split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            out.push_str(seg);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_in_order() {
        assert_eq!(
            path_wildcards("/accounts/:accountID/bottles/*rest"),
            vec!["accountID".to_owned(), "rest".to_owned()]
        );
        assert!(path_wildcards("/plain/path").is_empty());
    }

    #[test]
    fn joins_paths() {
        assert_eq!(join_paths(&["/api/", "/bottles", ":id"]), "/api/bottles/:id");
        assert_eq!(join_paths(&["", ""]), "/");
    }

    #[test]
    fn standard_responses_get_their_status() {
        assert_eq!(Response::new("NotFound").status, Some(404));
        assert_eq!(Response::new("Teapot").status, None);
    }
}
