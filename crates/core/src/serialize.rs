//! JSON rendering of a finished design for downstream generators. Keys are
//! sorted; user and media type references render as `{"$ref": name}` so
//! cyclic designs serialize finitely.

use crate::design::{
    Action, ApiDefinition, Attribute, DataType, Design, KeyLocation, Resource, ResourceId,
    Response, SecurityRef, SecurityScheme, TypeId, Validation,
};
use serde_json::{json, Map, Value};

/// Format tag of the serialized design.
pub const FORMAT: &str = "plinth-design";
pub const FORMAT_VERSION: &str = "1.0";

pub fn serialize(design: &Design) -> Value {
    let mut out = Map::new();
    out.insert(
        "api".to_owned(),
        design.api().map_or(Value::Null, |api| serialize_api(design, api)),
    );
    out.insert("format".to_owned(), Value::String(FORMAT.to_owned()));
    out.insert(
        "media_types".to_owned(),
        Value::Array(
            design
                .media_types()
                .chain(design.generated_types().iter().copied())
                .map(|id| serialize_type(design, id))
                .collect(),
        ),
    );
    out.insert(
        "resources".to_owned(),
        Value::Array(
            design
                .resources()
                .map(|(id, r)| serialize_resource(design, id, r))
                .collect(),
        ),
    );
    out.insert(
        "schemes".to_owned(),
        Value::Array(design.schemes().iter().map(serialize_scheme).collect()),
    );
    out.insert(
        "types".to_owned(),
        Value::Array(
            design
                .user_types()
                .map(|id| serialize_type(design, id))
                .collect(),
        ),
    );
    out.insert("version".to_owned(), Value::String(FORMAT_VERSION.to_owned()));
    Value::Object(out)
}

fn opt_str(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_owned(), Value::String(v.clone()));
    }
}

pub fn serialize_type(design: &Design, id: TypeId) -> Value {
    let ut = design.user_type(id);
    let mut m = Map::new();
    m.insert("name".to_owned(), Value::String(ut.name.clone()));
    m.insert("attribute".to_owned(), serialize_attribute(design, &ut.attribute));
    if let Some(base) = ut.reference {
        m.insert(
            "reference".to_owned(),
            Value::String(design.user_type(base).name.clone()),
        );
    }
    if let Some(media) = &ut.media {
        m.insert("identifier".to_owned(), Value::String(media.identifier.clone()));
        opt_str(&mut m, "content_type", &media.content_type);
        let views: Map<String, Value> = media
            .views
            .iter()
            .map(|(name, v)| (name.clone(), serialize_attribute(design, &v.attribute)))
            .collect();
        m.insert("views".to_owned(), Value::Object(views));
        let links: Map<String, Value> = media
            .links
            .iter()
            .map(|(name, l)| {
                let mut lm = Map::new();
                lm.insert("view".to_owned(), Value::String(l.view_name().to_owned()));
                opt_str(&mut lm, "description", &l.description);
                (name.clone(), Value::Object(lm))
            })
            .collect();
        m.insert("links".to_owned(), Value::Object(links));
    }
    Value::Object(m)
}

fn serialize_data_type(design: &Design, dt: &DataType) -> Value {
    match dt {
        DataType::Primitive(p) => json!({ "kind": "primitive", "name": p.name() }),
        DataType::Object(obj) => {
            let attrs: Map<String, Value> = obj
                .iter()
                .map(|(name, a)| (name.clone(), serialize_attribute(design, a)))
                .collect();
            json!({ "kind": "object", "attributes": attrs })
        }
        DataType::Array(elem) => json!({
            "kind": "array",
            "elem": serialize_attribute(design, elem),
        }),
        DataType::Hash { key, elem } => json!({
            "kind": "hash",
            "key": serialize_attribute(design, key),
            "elem": serialize_attribute(design, elem),
        }),
        DataType::User(id) => json!({ "$ref": design.user_type(*id).name }),
    }
}

fn serialize_validation(v: &Validation) -> Value {
    let mut m = Map::new();
    if !v.values.is_empty() {
        m.insert("enum".to_owned(), Value::Array(v.values.clone()));
    }
    opt_str(&mut m, "format", &v.format);
    opt_str(&mut m, "pattern", &v.pattern);
    if let Some(min) = v.minimum {
        m.insert("minimum".to_owned(), json!(min));
    }
    if let Some(max) = v.maximum {
        m.insert("maximum".to_owned(), json!(max));
    }
    if let Some(len) = v.min_length {
        m.insert("min_length".to_owned(), json!(len));
    }
    if let Some(len) = v.max_length {
        m.insert("max_length".to_owned(), json!(len));
    }
    if !v.required.is_empty() {
        let mut required = v.required.clone();
        required.sort();
        m.insert("required".to_owned(), json!(required));
    }
    Value::Object(m)
}

pub fn serialize_attribute(design: &Design, attr: &Attribute) -> Value {
    let mut m = Map::new();
    m.insert("type".to_owned(), serialize_data_type(design, &attr.data_type));
    opt_str(&mut m, "description", &attr.description);
    if let Some(d) = &attr.default {
        m.insert("default".to_owned(), d.clone());
    }
    if let Some(e) = &attr.example {
        m.insert("example".to_owned(), e.clone());
    }
    if !attr.validation.is_empty() {
        m.insert("validation".to_owned(), serialize_validation(&attr.validation));
    }
    if !attr.metadata.is_empty() {
        m.insert("metadata".to_owned(), json!(attr.metadata));
    }
    opt_str(&mut m, "view", &attr.view);
    Value::Object(m)
}

fn serialize_security(sec: &Option<SecurityRef>) -> Option<Value> {
    sec.as_ref()
        .map(|s| json!({ "scheme": s.scheme, "scopes": s.scopes }))
}

fn serialize_response(design: &Design, resp: &Response) -> Value {
    let mut m = Map::new();
    m.insert("name".to_owned(), Value::String(resp.name.clone()));
    if let Some(status) = resp.status {
        m.insert("status".to_owned(), json!(status));
    }
    opt_str(&mut m, "description", &resp.description);
    opt_str(&mut m, "media_type", &resp.media_type);
    opt_str(&mut m, "view", &resp.view);
    if let Some(h) = &resp.headers {
        m.insert("headers".to_owned(), serialize_attribute(design, h));
    }
    Value::Object(m)
}

fn serialize_responses<'r>(
    design: &Design,
    responses: impl Iterator<Item = (&'r String, &'r Response)>,
) -> Value {
    Value::Object(
        responses
            .map(|(name, r)| (name.clone(), serialize_response(design, r)))
            .collect(),
    )
}

fn serialize_api(design: &Design, api: &ApiDefinition) -> Value {
    let mut m = Map::new();
    m.insert("name".to_owned(), Value::String(api.name.clone()));
    opt_str(&mut m, "title", &api.title);
    opt_str(&mut m, "description", &api.description);
    opt_str(&mut m, "version", &api.version);
    opt_str(&mut m, "host", &api.host);
    opt_str(&mut m, "base_path", &api.base_path);
    m.insert("schemes".to_owned(), json!(api.schemes));
    m.insert("consumes".to_owned(), json!(api.consumes));
    m.insert("produces".to_owned(), json!(api.produces));
    if let Some(sec) = serialize_security(&api.security) {
        m.insert("security".to_owned(), sec);
    }
    if let Some(p) = &api.base_params {
        m.insert("base_params".to_owned(), serialize_attribute(design, p));
    }
    m.insert(
        "responses".to_owned(),
        serialize_responses(design, api.responses.iter()),
    );
    Value::Object(m)
}

fn serialize_action(design: &Design, id: ResourceId, action: &Action) -> Value {
    let mut m = Map::new();
    m.insert("name".to_owned(), Value::String(action.name.clone()));
    opt_str(&mut m, "description", &action.description);
    let routes: Vec<Value> = action
        .routes
        .iter()
        .map(|r| {
            json!({
                "verb": r.verb.to_string(),
                "path": r.path,
                "full_path": design.route_full_path(id, r),
            })
        })
        .collect();
    m.insert("routes".to_owned(), Value::Array(routes));
    if let Some(p) = &action.params {
        m.insert("params".to_owned(), serialize_attribute(design, p));
    }
    if let Some(p) = &action.payload {
        m.insert("payload".to_owned(), serialize_attribute(design, p));
        m.insert("payload_optional".to_owned(), json!(action.payload_optional));
    }
    m.insert(
        "responses".to_owned(),
        serialize_responses(design, action.responses.iter()),
    );
    if let Some(sec) = serialize_security(&action.security) {
        m.insert("security".to_owned(), sec);
    }
    Value::Object(m)
}

fn serialize_resource(design: &Design, id: ResourceId, res: &Resource) -> Value {
    let mut m = Map::new();
    m.insert("name".to_owned(), Value::String(res.name.clone()));
    opt_str(&mut m, "description", &res.description);
    m.insert("base_path".to_owned(), Value::String(res.base_path.clone()));
    m.insert(
        "full_path".to_owned(),
        Value::String(design.resource_full_path(id)),
    );
    opt_str(&mut m, "parent", &res.parent);
    opt_str(&mut m, "canonical_action", &res.canonical_action);
    if let Some(media) = res.default_media {
        m.insert(
            "default_media".to_owned(),
            Value::String(design.user_type(media).name.clone()),
        );
    }
    if let Some(p) = &res.params {
        m.insert("params".to_owned(), serialize_attribute(design, p));
    }
    if let Some(sec) = serialize_security(&res.security) {
        m.insert("security".to_owned(), sec);
    }
    m.insert(
        "responses".to_owned(),
        serialize_responses(design, res.responses.iter()),
    );
    m.insert(
        "actions".to_owned(),
        Value::Array(
            res.actions
                .iter()
                .map(|a| serialize_action(design, id, a))
                .collect(),
        ),
    );
    Value::Object(m)
}

fn serialize_scheme(scheme: &SecurityScheme) -> Value {
    let mut m = Map::new();
    m.insert("name".to_owned(), Value::String(scheme.name.clone()));
    m.insert("kind".to_owned(), Value::String(scheme.kind.to_string()));
    opt_str(&mut m, "description", &scheme.description);
    opt_str(&mut m, "key_name", &scheme.key_name);
    if let Some(loc) = scheme.key_location {
        let loc = match loc {
            KeyLocation::Header => "header",
            KeyLocation::Query => "query",
        };
        m.insert("in".to_owned(), Value::String(loc.to_owned()));
    }
    opt_str(&mut m, "token_url", &scheme.token_url);
    opt_str(&mut m, "authorization_url", &scheme.authorization_url);
    m.insert("scopes".to_owned(), json!(scheme.scopes));
    Value::Object(m)
}
