//! Attribute inheritance.

use crate::design::Attribute;

impl Attribute {
    /// Copy unset properties of `parent`'s attributes into same-named
    /// attributes of this object. Properties the child sets always win.
    /// Both sides must be inline objects; anything else is a no-op.
    pub fn inherit(&mut self, parent: &Attribute) {
        let Some(parent_obj) = parent.as_object() else {
            return;
        };
        let Some(obj) = self.as_object_mut() else {
            return;
        };
        for (name, child) in obj.iter_mut() {
            if let Some(p) = parent_obj.get(name) {
                child.inherit_properties(p);
                child.inherit(p);
            }
        }
        let names: Vec<String> = parent
            .validation
            .required
            .iter()
            .filter(|r| obj.contains_key(*r))
            .cloned()
            .collect();
        for name in names {
            if !self.is_required(&name) {
                self.validation.required.push(name);
            }
        }
    }

    /// Fill this attribute's own unset properties from `parent`.
    pub(crate) fn inherit_properties(&mut self, parent: &Attribute) {
        if self.description.is_none() {
            self.description = parent.description.clone();
        }
        if self.default.is_none() {
            self.default = parent.default.clone();
        }
        if self.example.is_none() {
            self.example = parent.example.clone();
        }
        if self.view.is_none() {
            self.view = parent.view.clone();
        }
        if parent.is_read_only() && !self.is_read_only() {
            self.set_read_only();
        }
        self.validation.inherit(&parent.validation);
    }
}

#[cfg(test)]
mod tests {
    use crate::design::{Attribute, Object, Primitive};

    fn object(entries: Vec<(&str, Attribute)>) -> Attribute {
        let obj: Object = entries
            .into_iter()
            .map(|(n, a)| (n.to_owned(), a))
            .collect();
        Attribute::object(obj)
    }

    fn string_with_default(default: Option<&str>) -> Attribute {
        let mut a = Attribute::primitive(Primitive::String);
        a.default = default.map(Into::into);
        a
    }

    #[test]
    fn unset_default_is_inherited() {
        let parent = object(vec![("c", string_with_default(Some("foo")))]);
        let mut child = object(vec![("c", string_with_default(None))]);
        child.inherit(&parent);
        assert_eq!(child.as_object().unwrap()["c"].default, Some("foo".into()));
    }

    #[test]
    fn child_default_wins() {
        let parent = object(vec![("c", string_with_default(Some("foo")))]);
        let mut child = object(vec![("c", string_with_default(Some("bar")))]);
        child.inherit(&parent);
        assert_eq!(child.as_object().unwrap()["c"].default, Some("bar".into()));
    }

    #[test]
    fn read_only_flag_is_inherited() {
        let mut flagged = Attribute::primitive(Primitive::Integer);
        flagged.set_read_only();
        let parent = object(vec![("id", flagged)]);
        let mut child = object(vec![("id", Attribute::primitive(Primitive::Integer))]);
        child.inherit(&parent);
        assert!(child.as_object().unwrap()["id"].is_read_only());
    }

    #[test]
    fn missing_names_and_non_objects_are_ignored() {
        let parent = object(vec![("other", string_with_default(Some("x")))]);
        let mut child = object(vec![("c", string_with_default(None))]);
        child.inherit(&parent);
        assert!(child.as_object().unwrap()["c"].default.is_none());

        let mut prim = string_with_default(None);
        prim.inherit(&parent);
        assert!(prim.default.is_none());
    }

    #[test]
    fn nested_objects_and_required_names() {
        let mut parent = object(vec![(
            "inner",
            object(vec![("x", string_with_default(Some("deep")))]),
        )]);
        parent.validation.required = vec!["inner".into(), "gone".into()];
        let mut child = object(vec![("inner", object(vec![("x", string_with_default(None))]))]);
        child.inherit(&parent);
        let inner = &child.as_object().unwrap()["inner"];
        assert_eq!(inner.as_object().unwrap()["x"].default, Some("deep".into()));
        assert_eq!(child.validation.required, vec!["inner".to_owned()]);
    }
}
