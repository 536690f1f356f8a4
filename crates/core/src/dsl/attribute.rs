//! Attribute builder.

use crate::design::{Attribute, DataType, Design, Object, Primitive, TypeRef};
use crate::engine::Scope;
use crate::error::Provenance;
use serde_json::Value;

/// Builds one attribute. Attributes have no workspace handle of their own:
/// they are built detached, inside their parent's callback, and attached
/// when their body returns.
pub struct AttributeDsl<'s, 'a> {
    scope: &'s mut Scope<'a, Design>,
    attr: &'s mut Attribute,
}

/// Build attribute `name` of type `ty` and run `body` on it. Without a type
/// the attribute is an object when the body declares children and a string
/// otherwise.
pub(crate) fn build_attribute(
    scope: &mut Scope<'_, Design>,
    name: &str,
    ty: Option<TypeRef>,
    prov: Provenance,
    body: impl FnOnce(&mut AttributeDsl<'_, '_>),
) -> Attribute {
    let explicit = ty.is_some();
    let data_type = match ty {
        Some(ty) => match scope.world().resolve(&ty) {
            Ok(dt) => dt,
            Err(msg) => {
                scope.report_at(&prov, msg);
                DataType::Primitive(Primitive::Any)
            }
        },
        None => DataType::Object(Object::new()),
    };
    let mut attr = Attribute::new(data_type);
    attr.prov = Some(prov);
    scope.within(format!("attribute {:?}", name), |s| {
        body(&mut AttributeDsl {
            scope: s,
            attr: &mut attr,
        });
    });
    if !explicit && attr.as_object().is_some_and(Object::is_empty) {
        attr.data_type = DataType::Primitive(Primitive::String);
    }
    attr
}

/// Add `child` to `object`, refusing duplicates and non-object parents.
pub(crate) fn insert_child(
    object: Option<&mut Object>,
    name: &str,
    child: Attribute,
) -> Result<(), String> {
    match object {
        Some(obj) if obj.contains_key(name) => Err(format!("attribute {:?} is already defined", name)),
        Some(obj) => {
            obj.insert(name.to_owned(), child);
            Ok(())
        }
        None => Err(format!(
            "cannot add attribute {:?}: parent is not an object",
            name
        )),
    }
}

impl<'s, 'a> AttributeDsl<'s, 'a> {
    pub fn scope(&mut self) -> &mut Scope<'a, Design> {
        self.scope
    }

    fn add(&mut self, name: &str, child: Attribute, prov: &Provenance) {
        if let Err(msg) = insert_child(self.attr.as_object_mut(), name, child) {
            self.scope.report_at(prov, msg);
        }
    }

    /// Child attribute without an explicit type.
    #[track_caller]
    pub fn member(&mut self, name: &str, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let child = build_attribute(self.scope, name, None, prov.clone(), body);
        self.add(name, child, &prov);
    }

    #[track_caller]
    pub fn attribute(&mut self, name: &str, ty: impl Into<TypeRef>) {
        let prov = Provenance::caller();
        let child = build_attribute(self.scope, name, Some(ty.into()), prov.clone(), |_| {});
        self.add(name, child, &prov);
    }

    #[track_caller]
    pub fn attribute_with(
        &mut self,
        name: &str,
        ty: impl Into<TypeRef>,
        body: impl FnOnce(&mut AttributeDsl<'_, '_>),
    ) {
        let prov = Provenance::caller();
        let child = build_attribute(self.scope, name, Some(ty.into()), prov.clone(), body);
        self.add(name, child, &prov);
    }

    /// Inline object child.
    #[track_caller]
    pub fn object(&mut self, name: &str, body: impl FnOnce(&mut AttributeDsl<'_, '_>)) {
        let prov = Provenance::caller();
        let ty = TypeRef::Type(DataType::Object(Object::new()));
        let child = build_attribute(self.scope, name, Some(ty), prov.clone(), body);
        self.add(name, child, &prov);
    }

    pub fn description(&mut self, text: &str) {
        self.attr.description = Some(text.to_owned());
    }

    pub fn default(&mut self, value: impl Into<Value>) {
        self.attr.default = Some(value.into());
    }

    pub fn example(&mut self, value: impl Into<Value>) {
        self.attr.example = Some(value.into());
    }

    pub fn enum_values<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) {
        self.attr.validation.values = values.into_iter().map(Into::into).collect();
    }

    pub fn format(&mut self, format: &str) {
        self.attr.validation.format = Some(format.to_owned());
    }

    pub fn pattern(&mut self, pattern: &str) {
        self.attr.validation.pattern = Some(pattern.to_owned());
    }

    pub fn minimum(&mut self, min: f64) {
        self.attr.validation.minimum = Some(min);
    }

    pub fn maximum(&mut self, max: f64) {
        self.attr.validation.maximum = Some(max);
    }

    pub fn min_length(&mut self, len: usize) {
        self.attr.validation.min_length = Some(len);
    }

    pub fn max_length(&mut self, len: usize) {
        self.attr.validation.max_length = Some(len);
    }

    pub fn required(&mut self, names: &[&str]) {
        for name in names {
            if !self.attr.is_required(name) {
                self.attr.validation.required.push((*name).to_owned());
            }
        }
    }

    pub fn metadata(&mut self, key: &str, values: &[&str]) {
        self.attr
            .metadata
            .entry(key.to_owned())
            .or_default()
            .extend(values.iter().map(|v| (*v).to_owned()));
    }

    pub fn read_only(&mut self) {
        self.attr.set_read_only();
    }

    /// View used to render this attribute when its type is a media type.
    pub fn view(&mut self, name: &str) {
        self.attr.view = Some(name.to_owned());
    }
}
