#![allow(clippy::result_large_err)]
//! plinth-core: API design engine core library.
//!
//! Declarations build a [`Design`] (types, media types, resources,
//! security schemes and the API itself) through typed builders. The
//! [`Engine`] then runs every declaration in dependency order, validates
//! the complete design and finalizes it.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`new_engine()`] -- an engine over an empty design with both roots
//! - [`Engine`], [`Scope`], [`Workspace`], [`Root`] -- the declaration runtime
//! - [`Design`], [`DataType`], [`Attribute`], [`UserType`], [`TypeRef`] --
//!   the type model
//! - [`Duplicator`], [`Projector`] -- cycle-safe graph operations
//! - [`EngineError`], [`Errors`], [`DslError`] -- run failures
//! - [`serialize()`] -- JSON rendering of a finished design

pub mod config;
pub mod design;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod finalize;
pub mod ops;
pub mod serialize;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use config::EngineConfig;
pub use design::{
    array_of, hash_of, Attribute, DataType, Def, Design, Primitive, SecurityKind, TypeId,
    TypeRef, UserType, Verb,
};
pub use engine::{Dsl, Engine, Root, Scope, Workspace};
pub use error::{DslError, EngineError, Errors, Phase, Provenance, ValidationErrors};
pub use ops::{Duplicator, ProjectError, Projection, Projector};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use serialize::serialize;

use design::{ApiRoot, GeneratedRoot};

/// An engine over an empty design with the design root and the generated
/// media types root registered.
pub fn new_engine() -> Engine<Design> {
    new_engine_with_config(EngineConfig::default())
}

pub fn new_engine_with_config(config: EngineConfig) -> Engine<Design> {
    let mut engine = Engine::with_config(Design::new(), config);
    for result in [engine.register(ApiRoot), engine.register(GeneratedRoot)] {
        if let Err(err) = result {
            tracing::error!(%err, "registering built-in root");
        }
    }
    engine
}
