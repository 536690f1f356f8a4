//! Declaration builders.
//!
//! Top-level declarations (`api`, `type_`, `media_type`, `resource`,
//! `security_scheme`) register a definition and store its body; the engine
//! runs the body during the run pass. Everything nested inside a body
//! (attributes, views, actions, responses) is built immediately.

mod api;
mod attribute;
mod resource;
mod types;

pub use api::{ApiDsl, SchemeDsl};
pub use attribute::AttributeDsl;
pub use resource::{ActionDsl, ResourceDsl, ResponseDsl};
pub use types::{TypeDsl, ViewDsl};

use crate::design::media::{canonical_identifier, default_type_name};
use crate::design::{
    ApiDefinition, Attribute, Body, DataType, Def, Design, Identifier, MediaInfo, Object,
    Primitive, Resource, ResourceId, SchemeId, SecurityKind, SecurityScheme, TypeId, TypeRef,
    UserType,
};
use crate::engine::Scope;
use crate::error::Provenance;
use tracing::trace;

/// Run the stored body of `def`, at most once.
pub(crate) fn run_body(scope: &mut Scope<'_, Design>, def: Def) {
    let Some(body) = scope.world_mut().bodies.remove(&def) else {
        return;
    };
    match (def, body) {
        (Def::Api, Body::Api(f)) => f(&mut ApiDsl::new(scope)),
        (Def::Type(id), Body::Type(f)) => f(&mut TypeDsl::new(scope, id)),
        (Def::Scheme(id), Body::Scheme(f)) => f(&mut SchemeDsl::new(scope, id)),
        (Def::Resource(id), Body::Resource(f)) => {
            let mut dsl = ResourceDsl::new(scope, id);
            f(&mut dsl);
            dsl.finish();
        }
        (def, _) => trace!(?def, "body does not match its definition"),
    }
}

impl Scope<'_, Design> {
    #[track_caller]
    pub fn api(&mut self, name: &str, body: impl FnOnce(&mut ApiDsl<'_, '_>) + 'static) {
        let prov = Provenance::caller();
        if self.world().api.is_some() {
            self.report_at(&prov, "multiple API definitions");
            return;
        }
        let design = self.world_mut();
        design.api = Some(ApiDefinition {
            name: name.to_owned(),
            prov: Some(prov),
            ..ApiDefinition::default()
        });
        design.bodies.insert(Def::Api, Body::Api(Box::new(body)));
    }

    /// Declare user type `name`. Its attributes are declared by `body`.
    #[track_caller]
    pub fn type_(&mut self, name: &str, body: impl FnOnce(&mut TypeDsl<'_, '_>) + 'static) -> TypeId {
        let prov = Provenance::caller();
        if let Some(existing) = self.world().find_type(name) {
            self.report_at(&prov, format!("type {:?} is already defined", name));
            return existing;
        }
        let mut attribute = Attribute::object(Object::new());
        attribute.prov = Some(prov.clone());
        let mut ut = UserType::new(name, attribute);
        ut.prov = Some(prov);

        let design = self.world_mut();
        let id = design.alloc(ut);
        design.declared.push(id);
        design.type_names.insert(name.to_owned(), id);
        design.bodies.insert(Def::Type(id), Body::Type(Box::new(body)));
        id
    }

    /// Declare a media type. Its type name defaults to the camel-cased last
    /// segment of the identifier.
    #[track_caller]
    pub fn media_type(
        &mut self,
        identifier: &str,
        body: impl FnOnce(&mut TypeDsl<'_, '_>) + 'static,
    ) -> TypeId {
        let prov = Provenance::caller();
        if let Err(err) = Identifier::parse(identifier) {
            self.report_at(&prov, err.to_string());
        }
        let canonical = canonical_identifier(identifier);
        if let Some(&existing) = self.world().media_ids.get(&canonical) {
            self.report_at(&prov, format!("media type {:?} is already defined", identifier));
            return existing;
        }
        let mut attribute = Attribute::object(Object::new());
        attribute.prov = Some(prov.clone());
        let mut ut = UserType::new(default_type_name(identifier), attribute);
        ut.media = Some(MediaInfo::new(identifier));
        ut.prov = Some(prov);

        let design = self.world_mut();
        let id = design.alloc(ut);
        design.declared.push(id);
        design.media_ids.insert(canonical, id);
        design.bodies.insert(Def::Type(id), Body::Type(Box::new(body)));
        id
    }

    /// The collection media type of `elem`, created on first use. Its views
    /// mirror the element's views once the element has been declared.
    #[track_caller]
    pub fn collection_of(&mut self, elem: impl Into<TypeRef>) -> TypeRef {
        let prov = Provenance::caller();
        let fallback = TypeRef::Type(DataType::Primitive(Primitive::Any));
        let eid = match self.world().resolve(&elem.into()) {
            Ok(DataType::User(eid)) if self.world().user_type(eid).is_media() => eid,
            Ok(other) => {
                let msg = format!(
                    "collection_of requires a media type, got {}",
                    self.world().type_name(&other)
                );
                self.report_at(&prov, msg);
                return fallback;
            }
            Err(msg) => {
                self.report_at(&prov, msg);
                return fallback;
            }
        };

        let elem_type = self.world().user_type(eid);
        let elem_identifier = elem_type
            .media
            .as_ref()
            .map(|m| m.identifier.clone())
            .unwrap_or_default();
        let identifier = match Identifier::parse(&elem_identifier) {
            Ok(id) => id.with_param("type", "collection").to_string(),
            Err(_) => format!("{}; type=collection", elem_identifier),
        };
        let canonical = canonical_identifier(&identifier);
        if let Some(&existing) = self.world().media_ids.get(&canonical) {
            return TypeRef::Id(existing);
        }
        let name = format!("{}Collection", elem_type.name);

        let mut ut = UserType::new(name, Attribute::new(DataType::array_of(DataType::User(eid))));
        ut.media = Some(MediaInfo::new(identifier));
        ut.prov = Some(prov);
        let design = self.world_mut();
        let id = design.alloc(ut);
        design.generated.push(id);
        design.media_ids.insert(canonical, id);
        let body = move |t: &mut TypeDsl<'_, '_>| t.derive_collection_views(eid);
        design.bodies.insert(Def::Type(id), Body::Type(Box::new(body)));
        TypeRef::Id(id)
    }

    #[track_caller]
    pub fn resource(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut ResourceDsl<'_, '_>) + 'static,
    ) -> ResourceId {
        let prov = Provenance::caller();
        if let Some(existing) = self.world().resource_id(name) {
            self.report_at(&prov, format!("resource {:?} is already defined", name));
            return existing;
        }
        let mut res = Resource::new(name);
        res.prov = Some(prov);
        let design = self.world_mut();
        let id = ResourceId(design.resources.len());
        design.resources.push(res);
        design.resource_names.insert(name.to_owned(), id);
        design.bodies.insert(Def::Resource(id), Body::Resource(Box::new(body)));
        id
    }

    #[track_caller]
    pub fn security_scheme(
        &mut self,
        name: &str,
        kind: SecurityKind,
        body: impl FnOnce(&mut SchemeDsl<'_, '_>) + 'static,
    ) -> SchemeId {
        let prov = Provenance::caller();
        if let Some(pos) = self.world().schemes.iter().position(|s| s.name == name) {
            self.report_at(&prov, format!("security scheme {:?} is already defined", name));
            return SchemeId(pos);
        }
        let mut scheme = SecurityScheme::new(name, kind);
        scheme.prov = Some(prov);
        let design = self.world_mut();
        let id = SchemeId(design.schemes.len());
        design.schemes.push(scheme);
        design.bodies.insert(Def::Scheme(id), Body::Scheme(Box::new(body)));
        id
    }
}
