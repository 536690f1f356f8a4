//! Resource, action and response builders.

use super::api::security_ref;
use super::attribute::{build_attribute, AttributeDsl};
use crate::design::{
    Action, DataType, Design, Object, Resource, ResourceId, Response, Route, TypeRef, Verb,
};
use crate::engine::Scope;
use crate::error::Provenance;

fn params_type() -> Option<TypeRef> {
    Some(TypeRef::Type(DataType::Object(Object::new())))
}

/// Build response `name` detached and run `body` on it.
pub(crate) fn build_response(
    scope: &mut Scope<'_, Design>,
    name: &str,
    prov: Provenance,
    body: impl FnOnce(&mut ResponseDsl<'_, '_>),
) -> Response {
    let mut response = Response::new(name);
    response.prov = Some(prov);
    scope.within(format!("response {:?}", name), |s| {
        body(&mut ResponseDsl {
            scope: s,
            response: &mut response,
        });
    });
    response
}

pub struct ResponseDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    response: &'s mut Response,
}

impl<'s, 'a> ResponseDsl<'s, 'a> {
    pub fn status(&mut self, status: u16) {
        self.response.status = Some(status);
    }

    pub fn description(&mut self, text: &str) {
        self.response.description = Some(text.to_owned());
    }

    /// Media type identifier or type name of the response body.
    pub fn media(&mut self, media: &str) {
        self.response.media_type = Some(media.to_owned());
    }

    pub fn media_view(&mut self, media: &str, view: &str) {
        self.response.media_type = Some(media.to_owned());
        self.response.view = Some(view.to_owned());
    }

    #[track_caller]
    pub fn headers(&mut self, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let headers = build_attribute(self.scope, "headers", params_type(), prov, body);
        self.response.headers = Some(headers);
    }
}

pub struct ResourceDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    id: ResourceId,
}

impl<'s, 'a> ResourceDsl<'s, 'a> {
    pub(crate) fn new(scope: &'s mut Scope<'a, Design>, id: ResourceId) -> Self {
        ResourceDsl { scope, id }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn scope(&mut self) -> &mut Scope<'a, Design> {
        self.scope
    }

    fn resource(&mut self) -> &mut Resource {
        &mut self.scope.world_mut().resources[self.id.0]
    }

    pub fn description(&mut self, text: &str) {
        self.resource().description = Some(text.to_owned());
    }

    pub fn base_path(&mut self, path: &str) {
        self.resource().base_path = path.to_owned();
    }

    pub fn parent(&mut self, name: &str) {
        self.resource().parent = Some(name.to_owned());
    }

    pub fn canonical_action_name(&mut self, name: &str) {
        self.resource().canonical_action = Some(name.to_owned());
    }

    /// Media type of `OK` responses that name none.
    #[track_caller]
    pub fn default_media(&mut self, media: impl Into<TypeRef>) {
        let prov = Provenance::caller();
        let design = self.scope.world();
        match design.resolve(&media.into()) {
            Ok(DataType::User(mid)) if design.user_type(mid).is_media() => {
                self.resource().default_media = Some(mid);
            }
            Ok(other) => {
                let msg = format!(
                    "default media must be a media type, got {}",
                    design.type_name(&other)
                );
                self.scope.report_at(&prov, msg);
            }
            Err(msg) => self.scope.report_at(&prov, msg),
        }
    }

    #[track_caller]
    pub fn params(&mut self, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let params = build_attribute(self.scope, "params", params_type(), prov, body);
        self.resource().params = Some(params);
    }

    #[track_caller]
    pub fn security(&mut self, scheme: &str, scopes: &[&str]) {
        let sec = security_ref(scheme, scopes, Provenance::caller());
        self.resource().security = Some(sec);
    }

    #[track_caller]
    pub fn response(&mut self, name: &str, body: impl FnOnce(&mut ResponseDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let resp = build_response(self.scope, name, prov.clone(), body);
        if self.resource().responses.contains_key(name) {
            self.scope
                .report_at(&prov, format!("response {:?} is already defined", name));
            return;
        }
        self.resource().responses.insert(name.to_owned(), resp);
    }

    #[track_caller]
    pub fn action(&mut self, name: &str, body: impl FnOnce(&mut ActionDsl<'_, '_>)) {
        let prov = Provenance::caller();
        if self.resource().action(name).is_some() {
            self.scope
                .report_at(&prov, format!("action {:?} is already defined", name));
            return;
        }
        let mut action = Action::new(name);
        action.prov = Some(prov);
        self.scope.within(format!("action {:?}", name), |s| {
            body(&mut ActionDsl {
                scope: s,
                action: &mut action,
            });
        });
        self.resource().actions.push(action);
    }

    /// Runs once the resource body returned: `show` becomes the canonical
    /// action when none was named.
    pub(crate) fn finish(&mut self) {
        let res = self.resource();
        if res.canonical_action.is_none() && res.action("show").is_some() {
            res.canonical_action = Some("show".to_owned());
        }
    }
}

pub struct ActionDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    action: &'s mut Action,
}

impl<'s, 'a> ActionDsl<'s, 'a> {
    pub fn scope(&mut self) -> &mut Scope<'a, Design> {
        self.scope
    }

    pub fn description(&mut self, text: &str) {
        self.action.description = Some(text.to_owned());
    }

    #[track_caller]
    pub fn routing(&mut self, verb: Verb, path: &str) {
        let prov = Provenance::caller();
        self.action.routes.push(Route {
            verb,
            path: path.to_owned(),
            prov: Some(prov),
        });
    }

    #[track_caller]
    pub fn get(&mut self, path: &str) {
        self.routing(Verb::Get, path);
    }

    #[track_caller]
    pub fn post(&mut self, path: &str) {
        self.routing(Verb::Post, path);
    }

    #[track_caller]
    pub fn put(&mut self, path: &str) {
        self.routing(Verb::Put, path);
    }

    #[track_caller]
    pub fn patch(&mut self, path: &str) {
        self.routing(Verb::Patch, path);
    }

    #[track_caller]
    pub fn delete(&mut self, path: &str) {
        self.routing(Verb::Delete, path);
    }

    #[track_caller]
    pub fn params(&mut self, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let params = build_attribute(self.scope, "params", params_type(), prov, body);
        self.action.params = Some(params);
    }

    #[track_caller]
    pub fn payload(&mut self, ty: impl Into<TypeRef>) {
        let prov = Provenance::caller();
        self.set_payload(ty.into(), false, prov);
    }

    #[track_caller]
    pub fn optional_payload(&mut self, ty: impl Into<TypeRef>) {
        let prov = Provenance::caller();
        self.set_payload(ty.into(), true, prov);
    }

    fn set_payload(&mut self, ty: TypeRef, optional: bool, prov: Provenance) {
        let payload = build_attribute(self.scope, "payload", Some(ty), prov, |_| {});
        self.action.payload = Some(payload);
        self.action.payload_optional = optional;
    }

    #[track_caller]
    pub fn response(&mut self, name: &str) {
        let prov = Provenance::caller();
        self.add_response(name, prov, |_| {});
    }

    #[track_caller]
    pub fn response_with(&mut self, name: &str, body: impl FnOnce(&mut ResponseDsl<'_, '_>)) {
        let prov = Provenance::caller();
        self.add_response(name, prov, body);
    }

    fn add_response(
        &mut self,
        name: &str,
        prov: Provenance,
        body: impl FnOnce(&mut ResponseDsl<'_, '_>),
    ) {
        if self.action.responses.contains_key(name) {
            self.scope
                .report_at(&prov, format!("response {:?} is already defined", name));
            return;
        }
        let resp = build_response(self.scope, name, prov, body);
        self.action.responses.insert(name.to_owned(), resp);
    }

    #[track_caller]
    pub fn security(&mut self, scheme: &str, scopes: &[&str]) {
        self.action.security = Some(security_ref(scheme, scopes, Provenance::caller()));
        self.action.no_security = false;
    }

    pub fn no_security(&mut self) {
        self.action.security = None;
        self.action.no_security = true;
    }
}
