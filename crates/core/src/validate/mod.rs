//! Validation: semantic checks on the complete design. Checks never mutate
//! the design and never stop at the first problem.

mod api;
mod attribute;
mod media;
mod resource;

use crate::design::{Def, Design};
use crate::engine::Workspace;
use crate::error::ValidationErrors;

pub fn validate(design: &Design, def: Def) -> Result<(), ValidationErrors> {
    let mut verr = ValidationErrors::new();
    let ctx = design.context(def);
    match def {
        Def::Api => api::validate_api(design, &ctx, &mut verr),
        Def::Type(id) => media::validate_type(design, &ctx, id, &mut verr),
        Def::Scheme(id) => api::validate_scheme(design, &ctx, id, &mut verr),
        Def::Resource(id) => resource::validate_resource(design, &ctx, id, &mut verr),
    }
    verr.into_result()
}

/// Context of an attribute nested at `path` inside definition `ctx`.
fn attribute_context(ctx: &str, path: &str) -> String {
    if path.is_empty() {
        ctx.to_owned()
    } else {
        format!("{} attribute {:?}", ctx, path)
    }
}
