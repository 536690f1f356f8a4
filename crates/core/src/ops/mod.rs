//! Operations over the type graph that stay correct on cycles: duplication,
//! inheritance and view projection.

mod dup;
mod inherit;
mod project;

pub use dup::Duplicator;
pub use project::{projected_identifier, projected_name, ProjectError, Projection, Projector};
