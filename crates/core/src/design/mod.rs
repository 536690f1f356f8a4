//! The design: an arena of types plus the API, resources and security
//! schemes that reference them, and the workspace glue that lets the engine
//! run, validate and finalize it.

pub mod api;
pub mod attribute;
pub mod media;
mod roots;
pub mod types;

pub use api::{
    Action, ApiDefinition, KeyLocation, Resource, ResourceId, Response, Route, SchemeId,
    SecurityKind, SecurityRef, SecurityScheme, Verb,
};
pub use attribute::{Attribute, Metadata, Validation};
pub use media::{Identifier, IdentifierError, Link, MediaInfo, View};
pub use roots::{ApiRoot, GeneratedRoot, DESIGN_ROOT, GENERATED_ROOT};
pub use types::{array_of, hash_of, DataType, Object, Primitive, TypeId, TypeRef, UserType};

use crate::dsl::{ApiDsl, ResourceDsl, SchemeDsl, TypeDsl};
use crate::engine::{Dsl, Scope, Workspace};
use crate::error::{Provenance, ValidationErrors};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

/// A definition the engine schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Def {
    Api,
    Type(TypeId),
    Scheme(SchemeId),
    Resource(ResourceId),
}

/// A declaration body not yet run.
pub(crate) enum Body {
    Api(Box<dyn FnOnce(&mut ApiDsl<'_, '_>)>),
    Type(Box<dyn FnOnce(&mut TypeDsl<'_, '_>)>),
    Scheme(Box<dyn FnOnce(&mut SchemeDsl<'_, '_>)>),
    Resource(Box<dyn FnOnce(&mut ResourceDsl<'_, '_>)>),
}

#[derive(Default)]
pub struct Design {
    pub(crate) api: Option<ApiDefinition>,
    pub(crate) arena: Vec<UserType>,
    /// Declared user and media types in declaration order.
    pub(crate) declared: Vec<TypeId>,
    /// Collection media types created by `collection_of`.
    pub(crate) generated: Vec<TypeId>,
    pub(crate) type_names: BTreeMap<String, TypeId>,
    /// Canonical identifier to media type, declared and generated.
    pub(crate) media_ids: BTreeMap<String, TypeId>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) resource_names: BTreeMap<String, ResourceId>,
    pub(crate) schemes: Vec<SecurityScheme>,
    pub(crate) bodies: HashMap<Def, Body>,
}

impl Design {
    pub fn new() -> Self {
        Design::default()
    }

    // ── Registries ───────────────────────────────────────────────────────────

    pub fn api(&self) -> Option<&ApiDefinition> {
        self.api.as_ref()
    }

    pub fn user_type(&self, id: TypeId) -> &UserType {
        &self.arena[id.0]
    }

    pub fn user_type_mut(&mut self, id: TypeId) -> &mut UserType {
        &mut self.arena[id.0]
    }

    pub fn type_count(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn alloc(&mut self, ut: UserType) -> TypeId {
        self.arena.push(ut);
        TypeId(self.arena.len() - 1)
    }

    /// Drop arena slots from `len` on. Only unregistered types (failed
    /// projections) may live there.
    pub(crate) fn truncate_types(&mut self, len: usize) {
        self.arena.truncate(len);
    }

    /// Declared user types (not media types), in declaration order.
    pub fn user_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.declared
            .iter()
            .copied()
            .filter(|&id| !self.user_type(id).is_media())
    }

    /// Declared media types, in declaration order.
    pub fn media_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.declared
            .iter()
            .copied()
            .filter(|&id| self.user_type(id).is_media())
    }

    pub fn generated_types(&self) -> &[TypeId] {
        &self.generated
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i), r))
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resource_names.get(name).map(|&id| self.resource_by_id(id))
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_names.get(name).copied()
    }

    pub fn resource_by_id(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn schemes(&self) -> &[SecurityScheme] {
        &self.schemes
    }

    pub fn scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.schemes.iter().find(|s| s.name == name)
    }

    /// User type or media type with the given type name.
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied().or_else(|| {
            self.media_ids
                .values()
                .copied()
                .find(|&id| self.user_type(id).name == name)
        })
    }

    /// Media type by identifier (any spelling with the same canonical
    /// form) or by type name.
    pub fn find_media_type(&self, id_or_name: &str) -> Option<TypeId> {
        self.media_ids
            .get(&media::canonical_identifier(id_or_name))
            .copied()
            .or_else(|| {
                self.media_ids
                    .values()
                    .copied()
                    .find(|&id| self.user_type(id).name == id_or_name)
            })
    }

    /// Resolve a type argument.
    pub fn resolve(&self, r: &TypeRef) -> Result<DataType, String> {
        Ok(match r {
            TypeRef::Named(name) => {
                if let Some(p) = Primitive::from_name(name) {
                    DataType::Primitive(p)
                } else if let Some(id) = self.find_type(name).or_else(|| self.find_media_type(name)) {
                    DataType::User(id)
                } else {
                    return Err(format!("unknown type {:?}", name));
                }
            }
            TypeRef::Type(dt) => dt.clone(),
            TypeRef::Array(elem) => DataType::array_of(self.resolve(elem)?),
            TypeRef::Hash(key, elem) => DataType::hash_of(self.resolve(key)?, self.resolve(elem)?),
            TypeRef::Id(id) => {
                if id.0 >= self.arena.len() {
                    return Err(format!("unknown type {}", id));
                }
                DataType::User(*id)
            }
        })
    }

    // ── Structural queries ───────────────────────────────────────────────────

    /// Follow user type references down to a structural type.
    pub fn underlying<'d>(&'d self, dt: &'d DataType) -> &'d DataType {
        let mut current = dt;
        // A chain longer than the arena loops.
        for _ in 0..=self.arena.len() {
            match current {
                DataType::User(id) => current = &self.user_type(*id).attribute.data_type,
                _ => return current,
            }
        }
        current
    }

    pub fn is_object(&self, dt: &DataType) -> bool {
        matches!(self.underlying(dt), DataType::Object(_))
    }

    pub fn is_array(&self, dt: &DataType) -> bool {
        matches!(self.underlying(dt), DataType::Array(_))
    }

    pub fn is_hash(&self, dt: &DataType) -> bool {
        matches!(self.underlying(dt), DataType::Hash { .. })
    }

    pub fn is_primitive(&self, dt: &DataType) -> bool {
        matches!(self.underlying(dt), DataType::Primitive(_))
    }

    pub fn is_media(&self, dt: &DataType) -> bool {
        dt.as_user().is_some_and(|id| self.user_type(id).is_media())
    }

    pub fn to_object<'d>(&'d self, dt: &'d DataType) -> Option<&'d Object> {
        match self.underlying(dt) {
            DataType::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn to_array<'d>(&'d self, dt: &'d DataType) -> Option<&'d Attribute> {
        match self.underlying(dt) {
            DataType::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn to_hash<'d>(&'d self, dt: &'d DataType) -> Option<(&'d Attribute, &'d Attribute)> {
        match self.underlying(dt) {
            DataType::Hash { key, elem } => Some((key, elem)),
            _ => None,
        }
    }

    pub fn type_name(&self, dt: &DataType) -> String {
        match dt {
            DataType::Primitive(p) => p.name().to_owned(),
            DataType::Object(_) => "Object".to_owned(),
            DataType::Array(_) => "Array".to_owned(),
            DataType::Hash { .. } => "Hash".to_owned(),
            DataType::User(id) => self.user_type(*id).name.clone(),
        }
    }

    /// Required names of `attr` merged with those of its user type.
    pub fn all_required(&self, attr: &Attribute) -> Vec<String> {
        let mut required = attr.validation.required.clone();
        let mut current = &attr.data_type;
        let mut seen = HashSet::new();
        while let DataType::User(id) = current {
            if !seen.insert(*id) {
                break;
            }
            let inner = &self.user_type(*id).attribute;
            for name in &inner.validation.required {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
            current = &inner.data_type;
        }
        required
    }

    pub fn canonical_action<'d>(&'d self, resource: &'d Resource) -> Option<&'d Action> {
        resource
            .canonical_action
            .as_deref()
            .and_then(|name| resource.action(name))
    }

    /// Full path of a resource: the parent's canonical route (or the API
    /// base path) joined with the resource base path. A base path starting
    /// with `//` is absolute.
    pub fn resource_full_path(&self, id: ResourceId) -> String {
        let mut seen = HashSet::new();
        self.resource_path_guarded(id, &mut seen)
    }

    fn resource_path_guarded(&self, id: ResourceId, seen: &mut HashSet<ResourceId>) -> String {
        let res = self.resource_by_id(id);
        if res.base_path.starts_with("//") || !seen.insert(id) {
            return api::join_paths(&[&res.base_path]);
        }
        let base = match res.parent.as_deref() {
            Some(parent) => self
                .resource_id(parent)
                .and_then(|pid| {
                    let p = self.resource_by_id(pid);
                    let route = self.canonical_action(p)?.routes.first()?;
                    Some(self.route_path_guarded(pid, route, seen))
                })
                .unwrap_or_default(),
            None => self
                .api
                .as_ref()
                .and_then(|a| a.base_path.clone())
                .unwrap_or_default(),
        };
        api::join_paths(&[&base, &res.base_path])
    }

    /// Full path of a route of an action of resource `id`.
    pub fn route_full_path(&self, id: ResourceId, route: &Route) -> String {
        let mut seen = HashSet::new();
        self.route_path_guarded(id, route, &mut seen)
    }

    fn route_path_guarded(
        &self,
        id: ResourceId,
        route: &Route,
        seen: &mut HashSet<ResourceId>,
    ) -> String {
        if let Some(abs) = route.path.strip_prefix("//") {
            return api::join_paths(&[abs]);
        }
        let base = self.resource_path_guarded(id, seen);
        api::join_paths(&[&base, &route.path])
    }

    /// Resources ordered parents first.
    pub(crate) fn resources_parent_first(&self) -> Vec<ResourceId> {
        let depth = |id: ResourceId| {
            let mut d = 0;
            let mut seen = HashSet::new();
            let mut current = self.resource_by_id(id);
            while let Some(pid) = current.parent.as_deref().and_then(|p| self.resource_id(p)) {
                if !seen.insert(pid) {
                    break;
                }
                d += 1;
                current = self.resource_by_id(pid);
            }
            d
        };
        let mut ids: Vec<ResourceId> = (0..self.resources.len()).map(ResourceId).collect();
        ids.sort_by_key(|&id| depth(id));
        ids
    }

    // ── Type operations ──────────────────────────────────────────────────────

    pub fn duplicate(&mut self, id: TypeId) -> TypeId {
        crate::ops::Duplicator::new(self).user_type(id)
    }

    pub fn duplicate_type(&mut self, dt: &DataType) -> DataType {
        crate::ops::Duplicator::new(self).data_type(dt)
    }

    pub fn duplicate_attribute(&mut self, attr: &Attribute) -> Attribute {
        crate::ops::Duplicator::new(self).attribute(attr)
    }

    /// Project media type `id` through `view` with a fresh cache.
    pub fn project(
        &mut self,
        id: TypeId,
        view: &str,
    ) -> Result<crate::ops::Projection, crate::ops::ProjectError> {
        crate::ops::Projector::new(self).project(id, view)
    }
}

impl Workspace for Design {
    type Def = Def;

    fn context(&self, def: Def) -> String {
        match def {
            Def::Api => format!(
                "API {:?}",
                self.api.as_ref().map(|a| a.name.as_str()).unwrap_or_default()
            ),
            Def::Type(id) => {
                let ut = self.user_type(id);
                match &ut.media {
                    Some(m) => format!("media type {:?}", m.identifier),
                    None => format!("type {:?}", ut.name),
                }
            }
            Def::Scheme(id) => format!("security scheme {:?}", self.schemes[id.0].name),
            Def::Resource(id) => format!("resource {:?}", self.resource_by_id(id).name),
        }
    }

    fn provenance(&self, def: Def) -> Option<Provenance> {
        match def {
            Def::Api => self.api.as_ref().and_then(|a| a.prov.clone()),
            Def::Type(id) => self.user_type(id).prov.clone(),
            Def::Scheme(id) => self.schemes[id.0].prov.clone(),
            Def::Resource(id) => self.resource_by_id(id).prov.clone(),
        }
    }

    fn dsl(&self, def: Def) -> Option<Dsl<Self>> {
        if !self.bodies.contains_key(&def) {
            return None;
        }
        let dsl: Dsl<Self> = Rc::new(move |s: &mut Scope<'_, Design>| crate::dsl::run_body(s, def));
        Some(dsl)
    }

    fn validate(&self, def: Def) -> Result<(), ValidationErrors> {
        crate::validate::validate(self, def)
    }

    fn finalize(&mut self, def: Def) {
        crate::finalize::finalize(self, def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design_with_pair() -> (Design, TypeId, TypeId) {
        let mut d = Design::new();
        let a = d.alloc(UserType::new("A", Attribute::object(Object::new())));
        let b = d.alloc(UserType::new("B", Attribute::new(DataType::User(a))));
        d.type_names.insert("A".into(), a);
        d.type_names.insert("B".into(), b);
        (d, a, b)
    }

    #[test]
    fn resolves_names() {
        let (d, a, _) = design_with_pair();
        assert_eq!(
            d.resolve(&"Integer".into()),
            Ok(DataType::Primitive(Primitive::Integer))
        );
        assert_eq!(d.resolve(&"A".into()), Ok(DataType::User(a)));
        assert_eq!(
            d.resolve(&array_of("A")),
            Ok(DataType::array_of(DataType::User(a)))
        );
        assert_eq!(d.resolve(&"C".into()), Err("unknown type \"C\"".to_owned()));
    }

    #[test]
    fn queries_follow_user_types() {
        let (d, _, b) = design_with_pair();
        let dt = DataType::User(b);
        assert!(d.is_object(&dt));
        assert!(d.to_object(&dt).is_some());
        assert!(!d.is_array(&dt));
        assert_eq!(d.type_name(&dt), "B");
    }

    #[test]
    fn self_referencing_alias_terminates() {
        let mut d = Design::new();
        let id = d.alloc(UserType::new("Loop", Attribute::primitive(Primitive::Any)));
        d.user_type_mut(id).attribute.data_type = DataType::User(id);
        assert!(!d.is_object(&DataType::User(id)));
    }

    #[test]
    fn resource_paths_chain_through_parents() {
        let mut d = Design::new();
        d.api = Some(ApiDefinition {
            name: "cellar".into(),
            base_path: Some("/cellar".into()),
            ..ApiDefinition::default()
        });
        let mut account = Resource::new("account");
        account.base_path = "/accounts".into();
        account.canonical_action = Some("show".into());
        let mut show = Action::new("show");
        show.routes.push(Route {
            verb: Verb::Get,
            path: "/:accountID".into(),
            prov: None,
        });
        account.actions.push(show);
        let mut bottle = Resource::new("bottle");
        bottle.base_path = "bottles".into();
        bottle.parent = Some("account".into());
        d.resources.push(bottle);
        d.resources.push(account);
        d.resource_names.insert("bottle".into(), ResourceId(0));
        d.resource_names.insert("account".into(), ResourceId(1));

        assert_eq!(
            d.resource_full_path(ResourceId(0)),
            "/cellar/accounts/:accountID/bottles"
        );
        assert_eq!(d.resources_parent_first(), vec![ResourceId(1), ResourceId(0)]);
    }
}
