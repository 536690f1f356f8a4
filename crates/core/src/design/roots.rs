//! The two roots of a design.

use super::{Def, Design};
use crate::engine::{DefinitionSet, Root};

pub const DESIGN_ROOT: &str = "design";
pub const GENERATED_ROOT: &str = "generated media types";

/// Owns the API, declared types, security schemes and resources.
#[derive(Debug, Default)]
pub struct ApiRoot;

impl Root<Design> for ApiRoot {
    fn dsl_name(&self) -> &str {
        DESIGN_ROOT
    }

    fn iterate_sets(&self, world: &Design, visit: &mut dyn FnMut(DefinitionSet<Def>)) {
        visit(world.api.iter().map(|_| Def::Api).collect());
        visit(world.user_types().map(Def::Type).collect());
        visit(world.media_types().map(Def::Type).collect());
        visit(
            (0..world.schemes.len())
                .map(|i| Def::Scheme(super::SchemeId(i)))
                .collect(),
        );
        visit(
            world
                .resources_parent_first()
                .into_iter()
                .map(Def::Resource)
                .collect(),
        );
    }

    fn reset(&mut self, world: &mut Design) {
        *world = Design::new();
    }
}

/// Owns the collection media types produced while declaring.
#[derive(Debug, Default)]
pub struct GeneratedRoot;

impl Root<Design> for GeneratedRoot {
    fn dsl_name(&self) -> &str {
        GENERATED_ROOT
    }

    fn depends_on(&self) -> Vec<String> {
        vec![DESIGN_ROOT.to_owned()]
    }

    fn iterate_sets(&self, world: &Design, visit: &mut dyn FnMut(DefinitionSet<Def>)) {
        visit(world.generated.iter().copied().map(Def::Type).collect());
    }

    fn reset(&mut self, world: &mut Design) {
        for id in std::mem::take(&mut world.generated) {
            world.bodies.remove(&Def::Type(id));
            world.media_ids.retain(|_, v| *v != id);
        }
    }
}
