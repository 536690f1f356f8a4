use super::attribute_context;
use crate::design::attribute::KNOWN_FORMATS;
use crate::design::{Attribute, DataType, Design, Primitive};
use crate::error::ValidationErrors;
use serde_json::Value;

/// Whether `value` is an instance of `dt`.
pub(crate) fn value_matches(design: &Design, dt: &DataType, value: &Value) -> bool {
    match design.underlying(dt) {
        DataType::Primitive(p) => p.is_compatible(value),
        DataType::Array(elem) => value.as_array().is_some_and(|items| {
            items
                .iter()
                .all(|v| value_matches(design, &elem.data_type, v))
        }),
        DataType::Hash { elem, .. } => value.as_object().is_some_and(|map| {
            map.values()
                .all(|v| value_matches(design, &elem.data_type, v))
        }),
        DataType::Object(obj) => value.as_object().is_some_and(|map| {
            map.iter().all(|(k, v)| {
                obj.get(k)
                    .map_or(true, |a| value_matches(design, &a.data_type, v))
            })
        }),
        // Unresolvable alias loop.
        DataType::User(_) => false,
    }
}

/// Check `attr` and, recursively, its inline children. User type
/// references are not followed: those types are validated on their own.
pub(crate) fn validate_attribute(
    design: &Design,
    ctx: &str,
    path: &str,
    attr: &Attribute,
    verr: &mut ValidationErrors,
) {
    let here = attribute_context(ctx, path);
    let prov = attr.prov.as_ref();
    let v = &attr.validation;
    let type_name = design.type_name(&attr.data_type);
    let primitive = design.underlying(&attr.data_type).as_primitive();
    let stringy = primitive.is_some_and(Primitive::is_stringy);

    for (what, value) in [("default", &attr.default), ("example", &attr.example)] {
        if let Some(value) = value {
            if !value_matches(design, &attr.data_type, value) {
                verr.add(
                    &here,
                    prov,
                    format!("{} value {} is incompatible with type {}", what, value, type_name),
                );
            }
        }
    }
    for value in &v.values {
        if !value_matches(design, &attr.data_type, value) {
            verr.add(
                &here,
                prov,
                format!("enum value {} is incompatible with type {}", value, type_name),
            );
        }
    }
    if let Some(default) = &attr.default {
        if !v.values.is_empty() && !v.values.contains(default) {
            verr.add(
                &here,
                prov,
                format!("default value {} is not one of the enum values", default),
            );
        }
    }

    if let Some(pattern) = &v.pattern {
        if !stringy {
            verr.add(&here, prov, format!("pattern validation is not valid on type {}", type_name));
        }
        if let Err(err) = regex::Regex::new(pattern) {
            verr.add(&here, prov, format!("invalid pattern {:?}: {}", pattern, err));
        }
    }
    if let Some(format) = &v.format {
        if !stringy {
            verr.add(&here, prov, format!("format validation is not valid on type {}", type_name));
        }
        if !KNOWN_FORMATS.contains(&format.as_str()) {
            verr.add(&here, prov, format!("unknown format {:?}", format));
        }
    }

    let numeric = primitive.is_some_and(Primitive::is_numeric);
    if (v.minimum.is_some() || v.maximum.is_some()) && !numeric {
        verr.add(
            &here,
            prov,
            format!("minimum and maximum are only valid on Integer and Number, not {}", type_name),
        );
    }
    if let (Some(min), Some(max)) = (v.minimum, v.maximum) {
        if min > max {
            verr.add(&here, prov, format!("minimum {} is greater than maximum {}", min, max));
        }
    }

    let measurable = stringy || design.is_array(&attr.data_type) || design.is_hash(&attr.data_type);
    if (v.min_length.is_some() || v.max_length.is_some()) && !measurable {
        verr.add(
            &here,
            prov,
            format!("length validations are only valid on strings, arrays and hashes, not {}", type_name),
        );
    }
    if let (Some(min), Some(max)) = (v.min_length, v.max_length) {
        if min > max {
            verr.add(&here, prov, format!("min_length {} is greater than max_length {}", min, max));
        }
    }

    if !v.required.is_empty() {
        match design.to_object(&attr.data_type) {
            Some(obj) => {
                for name in &v.required {
                    if !obj.contains_key(name) {
                        verr.add(&here, prov, format!("required attribute {:?} does not exist", name));
                    }
                }
            }
            None => verr.add(
                &here,
                prov,
                format!("required attributes are only valid on objects, not {}", type_name),
            ),
        }
    }

    let child_path = |name: &str| {
        if path.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{}", path, name)
        }
    };
    match &attr.data_type {
        DataType::Object(obj) => {
            for (name, child) in obj {
                validate_attribute(design, ctx, &child_path(name), child, verr);
            }
        }
        DataType::Array(elem) => validate_attribute(design, ctx, &child_path("[]"), elem, verr),
        DataType::Hash { key, elem } => {
            validate_attribute(design, ctx, &child_path("{key}"), key, verr);
            validate_attribute(design, ctx, &child_path("{elem}"), elem, verr);
        }
        DataType::Primitive(_) | DataType::User(_) => {}
    }
}
