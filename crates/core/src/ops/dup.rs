//! Deep duplication of types.

use crate::design::{Attribute, DataType, Design, MediaInfo, TypeId, UserType, View};
use std::collections::HashMap;

/// Copies types into fresh arena slots. User types already copied during
/// the lifetime of the duplicator are reused, so shared and cyclic
/// references in the source map onto the same copies.
pub struct Duplicator<'d> {
    design: &'d mut Design,
    seen: HashMap<TypeId, TypeId>,
}

impl<'d> Duplicator<'d> {
    pub fn new(design: &'d mut Design) -> Self {
        Duplicator {
            design,
            seen: HashMap::new(),
        }
    }

    pub fn user_type(&mut self, id: TypeId) -> TypeId {
        if let Some(&copy) = self.seen.get(&id) {
            return copy;
        }
        let source = self.design.user_type(id).clone();
        // Placeholder first: the source may reach itself.
        let copy = self.design.alloc(UserType::new(
            source.name.clone(),
            Attribute::new(DataType::Object(Default::default())),
        ));
        self.seen.insert(id, copy);

        let attribute = self.attribute(&source.attribute);
        let media = source.media.as_ref().map(|m| self.media(m));
        let target = self.design.user_type_mut(copy);
        target.attribute = attribute;
        target.reference = source.reference;
        target.media = media;
        target.prov = source.prov;
        copy
    }

    fn media(&mut self, media: &MediaInfo) -> MediaInfo {
        let views = media
            .views
            .iter()
            .map(|(name, view)| {
                let copy = View {
                    name: view.name.clone(),
                    attribute: self.attribute(&view.attribute),
                    prov: view.prov.clone(),
                };
                (name.clone(), copy)
            })
            .collect();
        MediaInfo {
            identifier: media.identifier.clone(),
            content_type: media.content_type.clone(),
            views,
            links: media.links.clone(),
        }
    }

    pub fn data_type(&mut self, dt: &DataType) -> DataType {
        match dt {
            DataType::Primitive(p) => DataType::Primitive(*p),
            DataType::Object(obj) => DataType::Object(
                obj.iter()
                    .map(|(name, attr)| (name.clone(), self.attribute(attr)))
                    .collect(),
            ),
            DataType::Array(elem) => DataType::Array(Box::new(self.attribute(elem))),
            DataType::Hash { key, elem } => DataType::Hash {
                key: Box::new(self.attribute(key)),
                elem: Box::new(self.attribute(elem)),
            },
            DataType::User(id) => DataType::User(self.user_type(*id)),
        }
    }

    pub fn attribute(&mut self, attr: &Attribute) -> Attribute {
        Attribute {
            data_type: self.data_type(&attr.data_type),
            description: attr.description.clone(),
            default: attr.default.clone(),
            example: attr.example.clone(),
            validation: attr.validation.clone(),
            metadata: attr.metadata.clone(),
            view: attr.view.clone(),
            prov: attr.prov.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::design::{Attribute, DataType, Design, MediaInfo, Object, Primitive, UserType};

    fn media_pair() -> (Design, crate::design::TypeId, crate::design::TypeId) {
        let mut d = Design::new();
        let a = d.alloc(UserType::new("A", Attribute::object(Object::new())));
        let b = d.alloc(UserType::new("B", Attribute::object(Object::new())));
        d.user_type_mut(a).media = Some(MediaInfo::new("application/vnd.a"));
        d.user_type_mut(b).media = Some(MediaInfo::new("application/vnd.b"));
        let mut to_b = Object::new();
        to_b.insert("b".into(), Attribute::new(DataType::User(b)));
        to_b.insert("n".into(), Attribute::primitive(Primitive::Integer));
        d.user_type_mut(a).attribute = Attribute::object(to_b);
        let mut to_a = Object::new();
        to_a.insert("a".into(), Attribute::new(DataType::User(a)));
        d.user_type_mut(b).attribute = Attribute::object(to_a);
        (d, a, b)
    }

    fn field(d: &Design, id: crate::design::TypeId, name: &str) -> DataType {
        d.user_type(id).attribute.as_object().unwrap()[name]
            .data_type
            .clone()
    }

    #[test]
    fn duplicate_preserves_cycles() {
        let (mut d, a, b) = media_pair();
        let a2 = d.duplicate(a);
        assert_ne!(a2, a);
        let DataType::User(b2) = field(&d, a2, "b") else {
            panic!("b is not a user type");
        };
        assert_ne!(b2, b);
        assert_eq!(field(&d, b2, "a"), DataType::User(a2));
        assert_eq!(d.user_type(a2).name, "A");
        assert_eq!(
            d.user_type(a2).media.as_ref().unwrap().identifier,
            "application/vnd.a"
        );
    }

    #[test]
    fn copies_are_independent() {
        let (mut d, a, _) = media_pair();
        let a2 = d.duplicate(a);
        d.user_type_mut(a2)
            .attribute
            .as_object_mut()
            .unwrap()
            .get_mut("n")
            .unwrap()
            .default = Some(3.into());
        let original = &d.user_type(a).attribute.as_object().unwrap()["n"];
        assert!(original.default.is_none());
    }

    #[test]
    fn primitives_are_returned_unchanged() {
        let mut d = Design::new();
        let before = d.type_count();
        let dt = d.duplicate_type(&DataType::Primitive(Primitive::String));
        assert_eq!(dt, DataType::Primitive(Primitive::String));
        assert_eq!(d.type_count(), before);
    }

    #[test]
    fn attribute_duplicate_keeps_validation_and_metadata() {
        let mut d = Design::new();
        let mut attr = Attribute::primitive(Primitive::String);
        attr.validation.pattern = Some("^a".into());
        attr.set_read_only();
        attr.example = Some("abc".into());
        let copy = d.duplicate_attribute(&attr);
        assert_eq!(copy, attr);
    }
}
