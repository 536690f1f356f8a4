use super::attribute::validate_attribute;
use crate::design::media::{DEFAULT_VIEW, LINKS_ATTRIBUTE};
use crate::design::{DataType, Design, Identifier, TypeId, UserType};
use crate::error::ValidationErrors;

pub(super) fn validate_type(design: &Design, ctx: &str, id: TypeId, verr: &mut ValidationErrors) {
    let ut = design.user_type(id);
    let prov = ut.prov.as_ref();
    if ut.name.is_empty() {
        verr.add(ctx, prov, "type name cannot be empty");
    }
    validate_attribute(design, ctx, "", &ut.attribute, verr);
    if ut.is_media() {
        validate_media(design, ctx, ut, verr);
    }
}

/// Media type a data type renders as: the type itself or the element of
/// an array.
fn rendered_media(design: &Design, dt: &DataType) -> Option<TypeId> {
    let id = match dt {
        DataType::User(id) => *id,
        DataType::Array(elem) => elem.data_type.as_user()?,
        _ => return None,
    };
    design.user_type(id).is_media().then_some(id)
}

fn has_view(design: &Design, id: TypeId, view: &str) -> bool {
    design
        .user_type(id)
        .media
        .as_ref()
        .is_some_and(|m| m.views.contains_key(view))
}

fn validate_media(design: &Design, ctx: &str, ut: &UserType, verr: &mut ValidationErrors) {
    let Some(media) = ut.media.as_ref() else {
        return;
    };
    let prov = ut.prov.as_ref();
    if let Err(err) = Identifier::parse(&media.identifier) {
        verr.add(ctx, prov, err.to_string());
    }

    if media.is_collection() {
        let elem_is_media = design
            .to_array(&ut.attribute.data_type)
            .and_then(|elem| elem.data_type.as_user())
            .is_some_and(|e| design.user_type(e).is_media());
        if !elem_is_media {
            verr.add(ctx, prov, "collection media type must be an array of media types");
        }
        return;
    }

    if !media.views.contains_key(DEFAULT_VIEW) {
        verr.add(ctx, prov, "media type must define a default view");
    }

    let full = design.to_object(&ut.attribute.data_type);
    for view in media.views.values() {
        let vprov = view.prov.as_ref().or(prov);
        let Some(entries) = view.attribute.as_object() else {
            continue;
        };
        if entries.is_empty() {
            verr.add(ctx, vprov, format!("view {:?} has no attributes", view.name));
        }
        for (name, entry) in entries {
            if name == LINKS_ATTRIBUTE {
                if media.links.is_empty() {
                    verr.add(
                        ctx,
                        vprov,
                        format!("view {:?} renders links but the media type defines none", view.name),
                    );
                }
                continue;
            }
            let Some(full_attr) = full.and_then(|o| o.get(name)) else {
                verr.add(
                    ctx,
                    vprov,
                    format!("view {:?} uses unknown attribute {:?}", view.name, name),
                );
                continue;
            };
            let Some(nested_view) = entry.view.as_deref() else {
                continue;
            };
            match rendered_media(design, &full_attr.data_type) {
                Some(nested) if !has_view(design, nested, nested_view) => verr.add(
                    ctx,
                    vprov,
                    format!(
                        "view {:?} renders attribute {:?} with view {:?}, which media type {:?} does not define",
                        view.name,
                        name,
                        nested_view,
                        design.user_type(nested).name
                    ),
                ),
                Some(_) => {}
                None => verr.add(
                    ctx,
                    vprov,
                    format!(
                        "view {:?} sets a view on attribute {:?}, which is not a media type",
                        view.name, name
                    ),
                ),
            }
        }
    }

    for link in media.links.values() {
        let lprov = link.prov.as_ref().or(prov);
        let Some(attr) = full.and_then(|o| o.get(&link.name)) else {
            verr.add(
                ctx,
                lprov,
                format!("link {:?} does not name an attribute", link.name),
            );
            continue;
        };
        match attr.data_type.as_user().filter(|&t| design.user_type(t).is_media()) {
            Some(target) if !has_view(design, target, link.view_name()) => verr.add(
                ctx,
                lprov,
                format!(
                    "link {:?} uses view {:?}, which media type {:?} does not define",
                    link.name,
                    link.view_name(),
                    design.user_type(target).name
                ),
            ),
            Some(_) => {}
            None => verr.add(
                ctx,
                lprov,
                format!("link {:?} must refer to an attribute of media type", link.name),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{Attribute, Link, MediaInfo, Object, Primitive, View};

    fn check(design: &Design, id: TypeId) -> Vec<String> {
        let mut verr = ValidationErrors::new();
        validate_type(design, "media type \"test\"", id, &mut verr);
        verr.iter().map(|e| e.message.clone()).collect()
    }

    fn view(name: &str, entries: &[(&str, Option<&str>)]) -> View {
        let obj: Object = entries
            .iter()
            .map(|&(attr, nested)| {
                let mut a = Attribute::primitive(Primitive::String);
                a.view = nested.map(str::to_owned);
                (attr.to_owned(), a)
            })
            .collect();
        View {
            name: name.into(),
            attribute: Attribute::object(obj),
            prov: None,
        }
    }

    fn media(d: &mut Design, name: &str, attrs: Object, views: Vec<View>) -> TypeId {
        let id = d.alloc(UserType::new(name, Attribute::object(attrs)));
        let mut info = MediaInfo::new(format!("application/vnd.{}", name.to_lowercase()));
        for v in views {
            info.views.insert(v.name.clone(), v);
        }
        d.user_type_mut(id).media = Some(info);
        id
    }

    fn id_only() -> Object {
        Object::from([("id".to_owned(), Attribute::primitive(Primitive::Integer))])
    }

    #[test]
    fn complete_media_type_passes() {
        let mut d = Design::new();
        let mt = media(&mut d, "Bottle", id_only(), vec![view("default", &[("id", None)])]);
        assert!(check(&d, mt).is_empty());
    }

    #[test]
    fn default_view_is_required() {
        let mut d = Design::new();
        let mt = media(&mut d, "Bottle", id_only(), vec![view("tiny", &[("id", None)])]);
        assert_eq!(check(&d, mt), vec!["media type must define a default view"]);
    }

    #[test]
    fn nested_view_must_exist_on_the_rendered_type() {
        let mut d = Design::new();
        let account = media(&mut d, "Account", id_only(), vec![view("default", &[("id", None)])]);
        let attrs = Object::from([("account".to_owned(), Attribute::new(DataType::User(account)))]);
        let bottle = media(
            &mut d,
            "Bottle",
            attrs,
            vec![view("default", &[("account", Some("tiny"))])],
        );
        assert_eq!(
            check(&d, bottle),
            vec![
                "view \"default\" renders attribute \"account\" with view \"tiny\", \
                 which media type \"Account\" does not define"
            ]
        );
    }

    #[test]
    fn link_view_must_exist_on_the_target() {
        let mut d = Design::new();
        let account = media(&mut d, "Account", id_only(), vec![view("default", &[("id", None)])]);
        let attrs = Object::from([("account".to_owned(), Attribute::new(DataType::User(account)))]);
        let bottle = media(
            &mut d,
            "Bottle",
            attrs,
            vec![view("default", &[("account", None)])],
        );
        let link = Link {
            name: "account".into(),
            view: None,
            description: None,
            prov: None,
        };
        if let Some(m) = d.user_type_mut(bottle).media.as_mut() {
            m.links.insert(link.name.clone(), link);
        }
        assert_eq!(
            check(&d, bottle),
            vec!["link \"account\" uses view \"link\", which media type \"Account\" does not define"]
        );
    }

    #[test]
    fn collection_must_wrap_media_types() {
        let mut d = Design::new();
        let id = d.alloc(UserType::new(
            "Ids",
            Attribute::new(DataType::array_of(DataType::Primitive(Primitive::Integer))),
        ));
        d.user_type_mut(id).media = Some(MediaInfo::new("application/vnd.ids; type=collection"));
        assert_eq!(
            check(&d, id),
            vec!["collection media type must be an array of media types"]
        );

        let bottle = media(&mut d, "Bottle", id_only(), vec![view("default", &[("id", None)])]);
        let ok = d.alloc(UserType::new(
            "BottleCollection",
            Attribute::new(DataType::array_of(DataType::User(bottle))),
        ));
        d.user_type_mut(ok).media =
            Some(MediaInfo::new("application/vnd.bottle; type=collection"));
        assert!(check(&d, ok).is_empty());
    }
}
