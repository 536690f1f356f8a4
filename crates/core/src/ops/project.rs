//! View projection: derive the media type a view renders.

use crate::design::media::{camel_case, Identifier, DEFAULT_VIEW, LINKS_ATTRIBUTE};
use crate::design::{Attribute, DataType, Design, MediaInfo, Object, TypeId, UserType, View};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Result of projecting a media type through a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub media: TypeId,
    /// Links type, present when the view renders links.
    pub links: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectError {
    #[error("invalid view name: view name cannot be empty")]
    EmptyView,

    #[error("{type_name:?} is not a media type")]
    NotMedia { type_name: String },

    #[error("unknown view {view:?} of media type {type_name:?}")]
    UnknownView { type_name: String, view: String },

    #[error("unknown attribute {attribute:?} used in links of {type_name:?}")]
    UnknownLink { type_name: String, attribute: String },

    #[error("link {attribute:?} of {type_name:?} does not point to a media type")]
    LinkNotMedia { type_name: String, attribute: String },

    #[error("view {view:?} on field {attribute:?} cannot be computed: {source}")]
    Nested {
        attribute: String,
        view: String,
        source: Box<ProjectError>,
    },
}

/// Type name of a projection: `Bottle` through `tiny` gives `BottleTiny`.
pub fn projected_name(type_name: &str, view: &str) -> String {
    if view == DEFAULT_VIEW {
        type_name.to_owned()
    } else {
        format!("{}{}", type_name, camel_case(view))
    }
}

/// Identifier of a projection: the `view` parameter is set unless the view
/// is the default one.
pub fn projected_identifier(identifier: &str, view: &str) -> String {
    if view == DEFAULT_VIEW {
        return identifier.to_owned();
    }
    match Identifier::parse(identifier) {
        Ok(id) => id.with_param("view", view).to_string(),
        Err(_) => format!("{}; view={}", identifier, view),
    }
}

/// Projects media types, caching results by (type, view). A projection in
/// progress is registered before its attributes are computed, so mutually
/// referencing media types terminate.
pub struct Projector<'d> {
    design: &'d mut Design,
    cache: HashMap<(TypeId, String), Projection>,
}

impl<'d> Projector<'d> {
    pub fn new(design: &'d mut Design) -> Self {
        Projector {
            design,
            cache: HashMap::new(),
        }
    }

    pub fn design(&self) -> &Design {
        self.design
    }

    pub fn project(&mut self, id: TypeId, view: &str) -> Result<Projection, ProjectError> {
        if view.is_empty() {
            return Err(ProjectError::EmptyView);
        }
        if let Some(p) = self.cache.get(&(id, view.to_owned())) {
            return Ok(*p);
        }
        let source = self.design.user_type(id).clone();
        if source.media.is_none() {
            return Err(ProjectError::NotMedia {
                type_name: source.name,
            });
        }
        trace!(media_type = %source.name, view, "projecting");
        let mark = self.design.type_count();
        let result = match self.collection_element(&source) {
            Some(elem) => self.project_collection(id, &source, elem, view),
            None => self.project_single(id, &source, view),
        };
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    /// Drop every projection started at or after arena slot `mark`, along
    /// with its placeholder types.
    fn rollback(&mut self, mark: usize) {
        self.cache.retain(|_, p| {
            p.media.index() < mark && p.links.map_or(true, |l| l.index() < mark)
        });
        self.design.truncate_types(mark);
    }

    fn collection_element(&self, source: &UserType) -> Option<TypeId> {
        let elem = match &source.attribute.data_type {
            DataType::Array(elem) => elem.data_type.as_user()?,
            _ => return None,
        };
        self.design.user_type(elem).is_media().then_some(elem)
    }

    /// Whether projecting `ut` through `view` renders links.
    fn renders_links(ut: &UserType, view: &str) -> bool {
        ut.media.as_ref().is_some_and(|m| {
            !m.links.is_empty()
                && m.views.get(view).is_some_and(|v| {
                    v.attribute
                        .as_object()
                        .is_some_and(|o| o.contains_key(LINKS_ATTRIBUTE))
                })
        })
    }

    fn placeholder(&mut self, name: String, identifier: Option<String>) -> TypeId {
        let mut ut = UserType::new(name, Attribute::object(Object::new()));
        ut.media = identifier.map(MediaInfo::new);
        self.design.alloc(ut)
    }

    fn project_single(
        &mut self,
        id: TypeId,
        source: &UserType,
        view: &str,
    ) -> Result<Projection, ProjectError> {
        let Some(media) = source.media.as_ref() else {
            return Err(ProjectError::NotMedia {
                type_name: source.name.clone(),
            });
        };
        let Some(v) = media.views.get(view) else {
            return Err(ProjectError::UnknownView {
                type_name: source.name.clone(),
                view: view.to_owned(),
            });
        };
        let view_obj = v.attribute.as_object().cloned().unwrap_or_default();

        let pid = self.placeholder(
            projected_name(&source.name, view),
            Some(projected_identifier(&media.identifier, view)),
        );
        let lid = Self::renders_links(source, view)
            .then(|| self.placeholder(format!("{}Links", source.name), None));
        let projection = Projection {
            media: pid,
            links: lid,
        };
        self.cache.insert((id, view.to_owned()), projection);

        let full = self
            .design
            .to_object(&source.attribute.data_type)
            .cloned()
            .unwrap_or_default();
        let mut obj = Object::new();
        for (name, vattr) in &view_obj {
            if name == LINKS_ATTRIBUTE {
                if let Some(lid) = lid {
                    let links = self.project_links(source, &full)?;
                    let links_type = self.design.user_type_mut(lid);
                    links_type.attribute = Attribute::object(links);
                    links_type.attribute.description = Some(format!(
                        "{}Links contains links to related resources of {}.",
                        source.name, source.name
                    ));
                    let mut attr = Attribute::new(DataType::User(lid));
                    attr.description = Some("Links to related resources".to_owned());
                    obj.insert(name.clone(), attr);
                }
                continue;
            }
            let Some(full_attr) = full.get(name) else {
                continue;
            };
            let mut attr = full_attr.clone();
            if vattr.view.is_some() {
                attr.view = vattr.view.clone();
            }
            let nested = attr.view.clone().unwrap_or_else(|| DEFAULT_VIEW.to_owned());
            attr.data_type = self.project_type(&attr.data_type, &nested, name)?;
            obj.insert(name.clone(), attr);
        }

        let mut attribute = source.attribute.clone();
        attribute
            .validation
            .required
            .retain(|r| obj.contains_key(r));
        attribute.description = Some(format!(
            "{} ({} view)",
            source
                .attribute
                .description
                .clone()
                .unwrap_or_else(|| format!("{} media type", source.name)),
            view
        ));
        let default_view = View {
            name: DEFAULT_VIEW.to_owned(),
            attribute: Attribute::object(obj.clone()),
            prov: v.prov.clone(),
        };
        attribute.data_type = DataType::Object(obj);

        let target = self.design.user_type_mut(pid);
        target.attribute = attribute;
        target.prov = source.prov.clone();
        if let Some(m) = target.media.as_mut() {
            m.content_type = media.content_type.clone();
            m.views = BTreeMap::from([(DEFAULT_VIEW.to_owned(), default_view)]);
        }
        Ok(projection)
    }

    fn project_links(&mut self, source: &UserType, full: &Object) -> Result<Object, ProjectError> {
        let mut links = Object::new();
        let Some(media) = source.media.as_ref() else {
            return Ok(links);
        };
        for (name, link) in &media.links {
            let Some(att) = full.get(name) else {
                return Err(ProjectError::UnknownLink {
                    type_name: source.name.clone(),
                    attribute: name.clone(),
                });
            };
            let target = att
                .data_type
                .as_user()
                .filter(|&t| self.design.user_type(t).is_media())
                .ok_or_else(|| ProjectError::LinkNotMedia {
                    type_name: source.name.clone(),
                    attribute: name.clone(),
                })?;
            let view = link.view_name();
            let p = self.project(target, view).map_err(|e| ProjectError::Nested {
                attribute: name.clone(),
                view: view.to_owned(),
                source: Box::new(e),
            })?;
            let mut attr = Attribute::new(DataType::User(p.media));
            attr.description = link.description.clone().or_else(|| att.description.clone());
            attr.metadata = att.metadata.clone();
            links.insert(name.clone(), attr);
        }
        Ok(links)
    }

    /// Project the media types an attribute type refers to, directly or as
    /// array elements.
    fn project_type(
        &mut self,
        dt: &DataType,
        view: &str,
        attribute: &str,
    ) -> Result<DataType, ProjectError> {
        let nested = |e: ProjectError| ProjectError::Nested {
            attribute: attribute.to_owned(),
            view: view.to_owned(),
            source: Box::new(e),
        };
        match dt {
            DataType::User(t) if self.design.user_type(*t).is_media() => {
                let p = self.project(*t, view).map_err(nested)?;
                Ok(DataType::User(p.media))
            }
            DataType::Array(elem) => match elem.data_type.as_user() {
                Some(t) if self.design.user_type(t).is_media() => {
                    let elem_view = elem.view.as_deref().unwrap_or(view);
                    let p = self.project(t, elem_view).map_err(nested)?;
                    let mut item = (**elem).clone();
                    item.data_type = DataType::User(p.media);
                    Ok(DataType::Array(Box::new(item)))
                }
                _ => Ok(dt.clone()),
            },
            _ => Ok(dt.clone()),
        }
    }

    fn project_collection(
        &mut self,
        id: TypeId,
        source: &UserType,
        elem: TypeId,
        view: &str,
    ) -> Result<Projection, ProjectError> {
        let elem_type = self.design.user_type(elem).clone();
        let has_view = elem_type
            .media
            .as_ref()
            .is_some_and(|m| m.views.contains_key(view));
        if !has_view {
            return Err(ProjectError::UnknownView {
                type_name: source.name.clone(),
                view: view.to_owned(),
            });
        }
        let identifier = source
            .media
            .as_ref()
            .map(|m| projected_identifier(&m.identifier, view));
        let pid = self.placeholder(
            format!("{}Collection", projected_name(&elem_type.name, view)),
            identifier,
        );
        let lid = Self::renders_links(&elem_type, view)
            .then(|| self.placeholder(format!("{}LinksArray", elem_type.name), None));
        let projection = Projection {
            media: pid,
            links: lid,
        };
        self.cache.insert((id, view.to_owned()), projection);

        let pe = self.project(elem, view)?;
        let pe_view = self
            .design
            .user_type(pe.media)
            .media
            .as_ref()
            .and_then(|m| m.views.get(DEFAULT_VIEW))
            .cloned();

        let mut attribute = Attribute::new(DataType::array_of(DataType::User(pe.media)));
        attribute.description = Some(format!(
            "{} is the media type for an array of {} ({} view)",
            source.name, elem_type.name, view
        ));
        let target = self.design.user_type_mut(pid);
        target.attribute = attribute;
        target.prov = source.prov.clone();
        if let (Some(m), Some(v)) = (target.media.as_mut(), pe_view) {
            m.views = BTreeMap::from([(DEFAULT_VIEW.to_owned(), v)]);
        }

        if let (Some(lid), Some(elem_links)) = (lid, pe.links) {
            let links_type = self.design.user_type_mut(lid);
            links_type.attribute = Attribute::new(DataType::array_of(DataType::User(elem_links)));
            links_type.attribute.description = Some(format!(
                "{}LinksArray contains links to related resources of {}.",
                elem_type.name, source.name
            ));
        }
        Ok(projection)
    }
}
