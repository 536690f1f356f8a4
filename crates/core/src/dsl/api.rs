//! API and security scheme builders.

use super::attribute::{build_attribute, AttributeDsl};
use super::resource::{build_response, ResponseDsl};
use crate::design::{
    ApiDefinition, DataType, Design, KeyLocation, Object, SchemeId, SecurityKind, SecurityRef,
    SecurityScheme, TypeRef,
};
use crate::engine::Scope;
use crate::error::Provenance;

pub(crate) fn security_ref(scheme: &str, scopes: &[&str], prov: Provenance) -> SecurityRef {
    SecurityRef {
        scheme: scheme.to_owned(),
        scopes: scopes.iter().map(|s| (*s).to_owned()).collect(),
        prov: Some(prov),
    }
}

pub struct ApiDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
}

impl<'s, 'a> ApiDsl<'s, 'a> {
    pub(crate) fn new(scope: &'s mut Scope<'a, Design>) -> Self {
        ApiDsl { scope }
    }

    pub fn scope(&mut self) -> &mut Scope<'a, Design> {
        self.scope
    }

    fn with_api(&mut self, f: impl FnOnce(&mut ApiDefinition)) {
        if let Some(api) = self.scope.world_mut().api.as_mut() {
            f(api);
        }
    }

    pub fn title(&mut self, title: &str) {
        self.with_api(|a| a.title = Some(title.to_owned()));
    }

    pub fn description(&mut self, text: &str) {
        self.with_api(|a| a.description = Some(text.to_owned()));
    }

    pub fn version(&mut self, version: &str) {
        self.with_api(|a| a.version = Some(version.to_owned()));
    }

    pub fn host(&mut self, host: &str) {
        self.with_api(|a| a.host = Some(host.to_owned()));
    }

    pub fn scheme(&mut self, scheme: &str) {
        self.with_api(|a| {
            if !a.schemes.iter().any(|s| s == scheme) {
                a.schemes.push(scheme.to_owned());
            }
        });
    }

    pub fn base_path(&mut self, path: &str) {
        self.with_api(|a| a.base_path = Some(path.to_owned()));
    }

    /// Parameters of the base path wildcards.
    #[track_caller]
    pub fn base_params(&mut self, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let ty = TypeRef::Type(DataType::Object(Object::new()));
        let params = build_attribute(self.scope, "base params", Some(ty), prov, body);
        self.with_api(|a| a.base_params = Some(params));
    }

    pub fn consumes(&mut self, mime: &str) {
        self.with_api(|a| a.consumes.push(mime.to_owned()));
    }

    pub fn produces(&mut self, mime: &str) {
        self.with_api(|a| a.produces.push(mime.to_owned()));
    }

    #[track_caller]
    pub fn security(&mut self, scheme: &str, scopes: &[&str]) {
        let sec = security_ref(scheme, scopes, Provenance::caller());
        self.with_api(|a| a.security = Some(sec));
    }

    /// Response template applied to every action that lacks it.
    #[track_caller]
    pub fn response(&mut self, name: &str, body: impl FnOnce(&mut ResponseDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let resp = build_response(self.scope, name, prov.clone(), body);
        let exists = self
            .scope
            .world()
            .api
            .as_ref()
            .is_some_and(|a| a.responses.contains_key(name));
        if exists {
            self.scope
                .report_at(&prov, format!("response {:?} is already defined", name));
            return;
        }
        self.with_api(|a| {
            a.responses.insert(name.to_owned(), resp);
        });
    }
}

pub struct SchemeDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    id: SchemeId,
}

impl<'s, 'a> SchemeDsl<'s, 'a> {
    pub(crate) fn new(scope: &'s mut Scope<'a, Design>, id: SchemeId) -> Self {
        SchemeDsl { scope, id }
    }

    fn scheme(&mut self) -> &mut SecurityScheme {
        &mut self.scope.world_mut().schemes[self.id.0]
    }

    fn kind(&self) -> SecurityKind {
        self.scope.world().schemes[self.id.0].kind
    }

    fn allow(&mut self, what: &str, kinds: &[SecurityKind], prov: &Provenance) -> bool {
        let kind = self.kind();
        if kinds.contains(&kind) {
            return true;
        }
        self.scope
            .report_at(prov, format!("{} is not valid in a {} security scheme", what, kind));
        false
    }

    pub fn description(&mut self, text: &str) {
        self.scheme().description = Some(text.to_owned());
    }

    #[track_caller]
    pub fn in_header(&mut self, name: &str) {
        let prov = Provenance::caller();
        self.set_key(name, KeyLocation::Header, "in_header", &prov);
    }

    #[track_caller]
    pub fn in_query(&mut self, name: &str) {
        let prov = Provenance::caller();
        self.set_key(name, KeyLocation::Query, "in_query", &prov);
    }

    fn set_key(&mut self, name: &str, location: KeyLocation, what: &str, prov: &Provenance) {
        if self.allow(what, &[SecurityKind::ApiKey, SecurityKind::Jwt], prov) {
            let scheme = self.scheme();
            scheme.key_name = Some(name.to_owned());
            scheme.key_location = Some(location);
        }
    }

    #[track_caller]
    pub fn token_url(&mut self, url: &str) {
        let prov = Provenance::caller();
        if self.allow("token_url", &[SecurityKind::OAuth2, SecurityKind::Jwt], &prov) {
            self.scheme().token_url = Some(url.to_owned());
        }
    }

    #[track_caller]
    pub fn authorization_url(&mut self, url: &str) {
        let prov = Provenance::caller();
        if self.allow("authorization_url", &[SecurityKind::OAuth2], &prov) {
            self.scheme().authorization_url = Some(url.to_owned());
        }
    }

    #[track_caller]
    pub fn scope(&mut self, name: &str, description: &str) {
        let prov = Provenance::caller();
        if self.allow("scope", &[SecurityKind::OAuth2, SecurityKind::Jwt], &prov) {
            self.scheme()
                .scopes
                .insert(name.to_owned(), description.to_owned());
        }
    }
}
