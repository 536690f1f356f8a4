use super::api::{validate_response, validate_security_ref};
use super::attribute::validate_attribute;
use crate::design::api::path_wildcards;
use crate::design::{Action, Design, Resource, ResourceId};
use crate::error::ValidationErrors;
use std::collections::HashSet;

pub(super) fn validate_resource(
    design: &Design,
    ctx: &str,
    id: ResourceId,
    verr: &mut ValidationErrors,
) {
    let res = design.resource_by_id(id);
    let prov = res.prov.as_ref();
    if res.name.is_empty() {
        verr.add(ctx, prov, "resource name cannot be empty");
    }

    let parent_ok = validate_parent(design, ctx, id, res, verr);
    if let Some(name) = &res.canonical_action {
        if res.action(name).is_none() {
            verr.add(ctx, prov, format!("unknown canonical action {:?}", name));
        }
    }

    if parent_ok {
        if let Some(pid) = res.parent.as_deref().and_then(|p| design.resource_id(p)) {
            let parent_wildcards = path_wildcards(&design.resource_full_path(pid));
            for w in path_wildcards(&res.base_path) {
                if parent_wildcards.contains(&w) {
                    verr.add(
                        ctx,
                        prov,
                        format!("base path wildcard {:?} conflicts with the parent resource path", w),
                    );
                }
            }
        }
    }

    if let Some(params) = &res.params {
        validate_attribute(design, ctx, "params", params, verr);
    }
    if let Some(sec) = &res.security {
        validate_security_ref(design, ctx, sec, verr);
    }
    for resp in res.responses.values() {
        validate_response(design, ctx, resp, verr);
    }
    for action in &res.actions {
        let actx = format!("action {:?} of {}", action.name, ctx);
        validate_action(design, &actx, id, res, action, parent_ok, verr);
    }
}

/// Returns whether the parent chain is sound, so full paths can be built.
fn validate_parent(
    design: &Design,
    ctx: &str,
    id: ResourceId,
    res: &Resource,
    verr: &mut ValidationErrors,
) -> bool {
    let prov = res.prov.as_ref();
    let Some(parent) = res.parent.as_deref() else {
        return true;
    };
    let Some(pid) = design.resource_id(parent) else {
        verr.add(ctx, prov, format!("parent resource {:?} not found", parent));
        return false;
    };

    let mut seen = HashSet::from([id]);
    let mut current = Some(pid);
    while let Some(cid) = current {
        if !seen.insert(cid) {
            verr.add(ctx, prov, "resource parent chain forms a cycle");
            return false;
        }
        current = design
            .resource_by_id(cid)
            .parent
            .as_deref()
            .and_then(|p| design.resource_id(p));
    }

    let p = design.resource_by_id(pid);
    if design.canonical_action(p).is_none() {
        verr.add(
            ctx,
            prov,
            format!("parent resource {:?} has no canonical action", parent),
        );
        return false;
    }
    true
}

fn validate_action(
    design: &Design,
    ctx: &str,
    id: ResourceId,
    res: &Resource,
    action: &Action,
    paths_ok: bool,
    verr: &mut ValidationErrors,
) {
    let prov = action.prov.as_ref();
    if action.routes.is_empty() {
        verr.add(ctx, prov, "action has no route");
    }

    let resource_wildcards = if paths_ok {
        path_wildcards(&design.resource_full_path(id))
    } else {
        Vec::new()
    };
    for route in &action.routes {
        let rprov = route.prov.as_ref().or(prov);
        if !route.path.is_empty() && !route.path.starts_with('/') {
            verr.add(ctx, rprov, format!("route path {:?} must start with /", route.path));
        }
        let absolute = route.path.starts_with("//");
        let mut seen = HashSet::new();
        for w in path_wildcards(&route.path) {
            if !seen.insert(w.clone()) {
                verr.add(
                    ctx,
                    rprov,
                    format!("wildcard {:?} appears more than once in route {:?}", w, route.path),
                );
            } else if !absolute && resource_wildcards.contains(&w) {
                verr.add(
                    ctx,
                    rprov,
                    format!("route wildcard {:?} conflicts with the resource base path", w),
                );
            }
        }
        if !paths_ok {
            continue;
        }
        let full = design.route_full_path(id, route);
        let mut checked = HashSet::new();
        for w in path_wildcards(&full) {
            if !checked.insert(w.clone()) {
                continue;
            }
            let declared = [&action.params, &res.params]
                .into_iter()
                .flatten()
                .find_map(|p| design.to_object(&p.data_type).and_then(|o| o.get(&w)));
            if let Some(param) = declared {
                if !design.is_primitive(&param.data_type) {
                    verr.add(
                        ctx,
                        rprov,
                        format!("path parameter {:?} must be a primitive", w),
                    );
                }
            }
        }
    }

    if let Some(params) = &action.params {
        validate_attribute(design, ctx, "params", params, verr);
    }
    if let Some(payload) = &action.payload {
        validate_attribute(design, ctx, "payload", payload, verr);
    }
    if let Some(sec) = &action.security {
        validate_security_ref(design, ctx, sec, verr);
    }
    for resp in action.responses.values() {
        validate_response(design, ctx, resp, verr);
    }
}
