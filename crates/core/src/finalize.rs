//! Finalize: defaulting and inheritance once the design is known to be
//! valid. Every step only fills what is unset, so running it again changes
//! nothing.

use crate::design::api::path_wildcards;
use crate::design::{Attribute, Def, Design, Object, Primitive, ResourceId, SecurityKind, TypeId};
use tracing::trace;

pub fn finalize(design: &mut Design, def: Def) {
    match def {
        Def::Api => finalize_api(design),
        Def::Type(id) => finalize_type(design, id),
        Def::Scheme(_) => {}
        Def::Resource(id) => finalize_resource(design, id),
    }
}

fn finalize_api(design: &mut Design) {
    if let Some(api) = design.api.as_mut() {
        if api.schemes.is_empty() {
            api.schemes.push("http".to_owned());
        }
    }
}

fn finalize_type(design: &mut Design, id: TypeId) {
    let Some(base) = design.user_type(id).reference else {
        return;
    };
    if base == id {
        return;
    }
    trace!(child = %design.user_type(id).name, base = %design.user_type(base).name, "inheriting");
    let parent = design.user_type(base).attribute.clone();
    design.user_type_mut(id).attribute.inherit(&parent);
}

fn finalize_resource(design: &mut Design, id: ResourceId) {
    let api = design.api.clone().unwrap_or_default();
    let res = design.resource_by_id(id).clone();
    let default_media = res
        .default_media
        .and_then(|m| design.user_type(m).media.as_ref())
        .map(|m| m.identifier.clone());

    let mut actions = res.actions.clone();
    for action in &mut actions {
        // Security: action, then resource, then API.
        action.security = if action.no_security {
            None
        } else {
            action
                .security
                .clone()
                .or_else(|| res.security.clone())
                .or_else(|| api.security.clone())
        };
        let disabled = action
            .security
            .as_ref()
            .and_then(|s| design.scheme(&s.scheme))
            .is_some_and(|s| s.kind == SecurityKind::None);
        if disabled {
            action.security = None;
            action.no_security = true;
        }

        // Wildcards without a declared parameter become string parameters.
        let mut wildcards: Vec<String> = Vec::new();
        for route in &action.routes {
            for w in path_wildcards(&design.route_full_path(id, route)) {
                if !wildcards.contains(&w) {
                    wildcards.push(w);
                }
            }
        }
        if !wildcards.is_empty() {
            let params = action
                .params
                .get_or_insert_with(|| Attribute::object(Object::new()));
            if let Some(obj) = params.as_object_mut() {
                for w in wildcards {
                    if obj.contains_key(&w) {
                        continue;
                    }
                    let inherited = [&res.params, &api.base_params]
                        .into_iter()
                        .flatten()
                        .find_map(|p| design.to_object(&p.data_type).and_then(|o| o.get(&w)))
                        .cloned();
                    let param =
                        inherited.unwrap_or_else(|| Attribute::primitive(Primitive::String));
                    obj.insert(w, param);
                }
            }
        }

        for (name, resp) in res.responses.iter().chain(api.responses.iter()) {
            action
                .responses
                .entry(name.clone())
                .or_insert_with(|| resp.clone());
        }
        if let (Some(ok), Some(media)) = (action.responses.get_mut("OK"), &default_media) {
            if ok.media_type.is_none() {
                ok.media_type = Some(media.clone());
            }
        }
    }
    design.resources[id.0].actions = actions;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{
        Action, ApiDefinition, Resource, Response, Route, SecurityRef, SecurityScheme, UserType,
        Verb,
    };

    fn design_with_resource() -> (Design, ResourceId) {
        let mut d = Design::new();
        d.api = Some(ApiDefinition {
            name: "cellar".into(),
            base_path: Some("/api".into()),
            security: Some(SecurityRef {
                scheme: "key".into(),
                scopes: vec![],
                prov: None,
            }),
            ..ApiDefinition::default()
        });
        d.schemes.push(SecurityScheme::new("key", SecurityKind::ApiKey));
        d.schemes.push(SecurityScheme::new("open", SecurityKind::None));

        let mt = d.alloc(UserType::new("Bottle", Attribute::object(Object::new())));
        d.user_type_mut(mt).media = Some(crate::design::MediaInfo::new("application/vnd.bottle"));

        let mut res = Resource::new("bottle");
        res.base_path = "/bottles".into();
        res.default_media = Some(mt);
        res.responses.insert("NotFound".into(), Response::new("NotFound"));
        let mut show = Action::new("show");
        show.routes.push(Route {
            verb: Verb::Get,
            path: "/:bottleID".into(),
            prov: None,
        });
        show.responses.insert("OK".into(), Response::new("OK"));
        res.actions.push(show);
        let mut list = Action::new("list");
        list.routes.push(Route {
            verb: Verb::Get,
            path: "".into(),
            prov: None,
        });
        list.security = Some(SecurityRef {
            scheme: "open".into(),
            scopes: vec![],
            prov: None,
        });
        res.actions.push(list);
        d.resources.push(res);
        d.resource_names.insert("bottle".into(), ResourceId(0));
        (d, ResourceId(0))
    }

    #[test]
    fn actions_get_params_security_and_responses() {
        let (mut d, id) = design_with_resource();
        finalize(&mut d, Def::Resource(id));
        let res = d.resource_by_id(id);

        let show = res.action("show").unwrap();
        let params = show.params.as_ref().unwrap().as_object().unwrap();
        assert_eq!(
            params["bottleID"].data_type,
            crate::design::DataType::Primitive(Primitive::String)
        );
        assert_eq!(show.security.as_ref().unwrap().scheme, "key");
        assert!(show.responses.contains_key("NotFound"));
        assert_eq!(
            show.responses["OK"].media_type.as_deref(),
            Some("application/vnd.bottle")
        );

        let list = res.action("list").unwrap();
        assert!(list.security.is_none());
        assert!(list.params.is_none());
    }

    #[test]
    fn finalize_is_idempotent() {
        let (mut d, id) = design_with_resource();
        finalize(&mut d, Def::Resource(id));
        finalize(&mut d, Def::Api);
        let once = d.resource_by_id(id).clone();
        let api_once = d.api().cloned();
        finalize(&mut d, Def::Resource(id));
        finalize(&mut d, Def::Api);
        assert_eq!(d.resource_by_id(id), &once);
        assert_eq!(d.api().cloned(), api_once);
        assert_eq!(d.api().unwrap().schemes, vec!["http".to_owned()]);
    }
}
