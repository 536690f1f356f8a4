//! User type and media type builders.

use super::attribute::{build_attribute, insert_child, AttributeDsl};
use crate::design::media::LINKS_ATTRIBUTE;
use crate::design::{
    Attribute, DataType, Def, Design, Link, Object, TypeId, TypeRef, UserType, View,
};
use crate::engine::{Scope, Workspace};
use crate::error::Provenance;
use serde_json::Value;

pub struct TypeDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    id: TypeId,
}

impl<'s, 'a> TypeDsl<'s, 'a> {
    pub(crate) fn new(scope: &'s mut Scope<'a, Design>, id: TypeId) -> Self {
        TypeDsl { scope, id }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn scope(&mut self) -> &mut Scope<'a, Design> {
        self.scope
    }

    fn user_type(&mut self) -> &mut UserType {
        self.scope.world_mut().user_type_mut(self.id)
    }

    fn is_media(&self) -> bool {
        self.scope.world().user_type(self.id).is_media()
    }

    fn require_media(&mut self, what: &str, prov: &Provenance) -> bool {
        if !self.is_media() {
            self.scope
                .report_at(prov, format!("{} is only valid in a media type", what));
            return false;
        }
        true
    }

    fn add(&mut self, name: &str, attr: Attribute, prov: &Provenance) {
        let object = self.user_type().attribute.as_object_mut();
        if let Err(msg) = insert_child(object, name, attr) {
            self.scope.report_at(prov, msg);
        }
    }

    pub fn description(&mut self, text: &str) {
        self.user_type().attribute.description = Some(text.to_owned());
    }

    /// Rename a media type.
    #[track_caller]
    pub fn type_name(&mut self, name: &str) {
        let prov = Provenance::caller();
        if self.require_media("type_name", &prov) {
            self.user_type().name = name.to_owned();
        }
    }

    /// Base type unset properties are inherited from. The base type's body
    /// runs first if it has not yet.
    #[track_caller]
    pub fn reference(&mut self, ty: impl Into<TypeRef>) {
        let prov = Provenance::caller();
        let rid = match self.scope.world().resolve(&ty.into()) {
            Ok(DataType::User(rid)) => rid,
            Ok(other) => {
                let msg = format!("reference must be a user or media type, got {}", other.kind());
                self.scope.report_at(&prov, msg);
                return;
            }
            Err(msg) => {
                self.scope.report_at(&prov, msg);
                return;
            }
        };
        self.user_type().reference = Some(rid);
        let def = Def::Type(rid);
        if let Some(dsl) = self.scope.world().dsl(def) {
            self.scope.execute(&dsl, def);
        }
    }

    #[track_caller]
    pub fn attribute(&mut self, name: &str, ty: impl Into<TypeRef>) {
        let prov = Provenance::caller();
        let attr = build_attribute(self.scope, name, Some(ty.into()), prov.clone(), |_| {});
        self.add(name, attr, &prov);
    }

    #[track_caller]
    pub fn attribute_with(
        &mut self,
        name: &str,
        ty: impl Into<TypeRef>,
        body: impl FnOnce(&mut AttributeDsl<'_, '_>),
    ) {
        let prov = Provenance::caller();
        let attr = build_attribute(self.scope, name, Some(ty.into()), prov.clone(), body);
        self.add(name, attr, &prov);
    }

    /// Attribute without an explicit type: an object when `body` declares
    /// children, a string otherwise.
    #[track_caller]
    pub fn member(&mut self, name: &str, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let attr = build_attribute(self.scope, name, None, prov.clone(), body);
        self.add(name, attr, &prov);
    }

    #[track_caller]
    pub fn object(&mut self, name: &str, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let ty = TypeRef::Type(DataType::Object(Object::new()));
        let attr = build_attribute(self.scope, name, Some(ty), prov.clone(), body);
        self.add(name, attr, &prov);
    }

    /// Copy attribute `name` of the reference type.
    #[track_caller]
    pub fn reference_attribute(&mut self, name: &str) {
        let prov = Provenance::caller();
        let design = self.scope.world();
        let found = match design.user_type(self.id).reference {
            None => Err("reference_attribute requires a reference type".to_owned()),
            Some(rid) => {
                let base = design.user_type(rid);
                design
                    .to_object(&base.attribute.data_type)
                    .and_then(|o| o.get(name))
                    .cloned()
                    .ok_or_else(|| {
                        format!("attribute {:?} not found in reference {:?}", name, base.name)
                    })
            }
        };
        match found {
            Ok(mut attr) => {
                attr.prov = Some(prov.clone());
                self.add(name, attr, &prov);
            }
            Err(msg) => self.scope.report_at(&prov, msg),
        }
    }

    pub fn required(&mut self, names: &[&str]) {
        let validation = &mut self.user_type().attribute.validation;
        for name in names {
            if !validation.required.iter().any(|r| r == name) {
                validation.required.push((*name).to_owned());
            }
        }
    }

    pub fn metadata(&mut self, key: &str, values: &[&str]) {
        self.user_type()
            .attribute
            .metadata
            .entry(key.to_owned())
            .or_default()
            .extend(values.iter().map(|v| (*v).to_owned()));
    }

    pub fn example(&mut self, value: impl Into<Value>) {
        self.user_type().attribute.example = Some(value.into());
    }

    #[track_caller]
    pub fn content_type(&mut self, content_type: &str) {
        let prov = Provenance::caller();
        if self.require_media("content_type", &prov) {
            if let Some(media) = self.user_type().media.as_mut() {
                media.content_type = Some(content_type.to_owned());
            }
        }
    }

    #[track_caller]
    pub fn view(&mut self, name: &str, body: impl FnOnce(&mut ViewDsl<'_, '_>)) {
        let prov = Provenance::caller();
        if !self.require_media("view", &prov) {
            return;
        }
        let exists = self
            .scope
            .world()
            .user_type(self.id)
            .media
            .as_ref()
            .is_some_and(|m| m.views.contains_key(name));
        if exists {
            self.scope
                .report_at(&prov, format!("view {:?} is already defined", name));
            return;
        }

        let mut object = Object::new();
        let id = self.id;
        self.scope.within(format!("view {:?}", name), |s| {
            body(&mut ViewDsl {
                scope: s,
                id,
                object: &mut object,
            });
        });
        let mut attribute = Attribute::object(object);
        attribute.prov = Some(prov.clone());
        let view = View {
            name: name.to_owned(),
            attribute,
            prov: Some(prov),
        };
        if let Some(media) = self.user_type().media.as_mut() {
            media.views.insert(name.to_owned(), view);
        }
    }

    #[track_caller]
    pub fn link(&mut self, name: &str) {
        let prov = Provenance::caller();
        self.add_link(name, None, prov);
    }

    /// Link rendered through `view` instead of the default link view.
    #[track_caller]
    pub fn link_view(&mut self, name: &str, view: &str) {
        let prov = Provenance::caller();
        self.add_link(name, Some(view.to_owned()), prov);
    }

    fn add_link(&mut self, name: &str, view: Option<String>, prov: Provenance) {
        if !self.require_media("link", &prov) {
            return;
        }
        let Some(media) = self.user_type().media.as_mut() else {
            return;
        };
        if media.links.contains_key(name) {
            self.scope
                .report_at(&prov, format!("link {:?} is already defined", name));
            return;
        }
        media.links.insert(
            name.to_owned(),
            Link {
                name: name.to_owned(),
                view,
                description: None,
                prov: Some(prov),
            },
        );
    }

    #[track_caller]
    pub fn collection_of(&mut self, elem: impl Into<TypeRef>) -> TypeRef {
        self.scope.collection_of(elem)
    }

    /// Body of a generated collection: one array view per element view.
    pub(crate) fn derive_collection_views(&mut self, elem: TypeId) {
        let design = self.scope.world();
        let elem_type = design.user_type(elem);
        let name = format!("{}Collection", elem_type.name);
        let view_names: Vec<String> = elem_type
            .media
            .as_ref()
            .map(|m| m.views.keys().cloned().collect())
            .unwrap_or_default();

        let ut = self.user_type();
        ut.name = name;
        let prov = ut.prov.clone();
        if let Some(media) = ut.media.as_mut() {
            for view in view_names {
                let mut item = Attribute::new(DataType::User(elem));
                item.view = Some(view.clone());
                let mut attribute = Attribute::new(DataType::Array(Box::new(item)));
                attribute.prov = prov.clone();
                media.views.insert(
                    view.clone(),
                    View {
                        name: view,
                        attribute,
                        prov: prov.clone(),
                    },
                );
            }
        }
    }
}

/// Builds the attribute list of a view.
pub struct ViewDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    id: TypeId,
    object: &'s mut Object,
}

impl<'s, 'a> ViewDsl<'s, 'a> {
    #[track_caller]
    pub fn attribute(&mut self, name: &str) {
        let prov = Provenance::caller();
        self.add(name, None, prov);
    }

    /// Attribute rendered through a view of its own media type.
    #[track_caller]
    pub fn attribute_view(&mut self, name: &str, view: &str) {
        let prov = Provenance::caller();
        self.add(name, Some(view.to_owned()), prov);
    }

    fn add(&mut self, name: &str, view: Option<String>, prov: Provenance) {
        let design = self.scope.world();
        let full = design.user_type(self.id);
        let source = if name == LINKS_ATTRIBUTE {
            Some(Attribute::object(Object::new()))
        } else {
            design
                .to_object(&full.attribute.data_type)
                .and_then(|o| o.get(name))
                .cloned()
        };
        let Some(mut attr) = source else {
            let msg = format!("unknown attribute {:?} in media type {:?}", name, full.name);
            self.scope.report_at(&prov, msg);
            return;
        };
        if view.is_some() {
            attr.view = view;
        }
        attr.prov = Some(prov.clone());
        if let Err(msg) = insert_child(Some(&mut *self.object), name, attr) {
            self.scope.report_at(&prov, msg);
        }
    }
}
