//! The handle a running declaration callback receives.

use super::{Dsl, Workspace};
use crate::error::{DslError, Errors, Phase, Provenance};

/// Access to the workspace, the error collector, and the stack of
/// definitions currently being built.
pub struct Scope<'a, W: Workspace> {
    world: &'a mut W,
    errors: &'a mut Errors,
    stack: &'a mut Vec<String>,
}

impl<'a, W: Workspace> Scope<'a, W> {
    pub(crate) fn new(world: &'a mut W, errors: &'a mut Errors, stack: &'a mut Vec<String>) -> Self {
        Scope {
            world,
            errors,
            stack,
        }
    }

    pub fn world(&self) -> &W {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        self.world
    }

    /// Context of the innermost definition being built, `None` at top level.
    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Record an error located at the caller.
    #[track_caller]
    pub fn report(&mut self, message: impl Into<String>) {
        let prov = Provenance::caller();
        self.report_at(&prov, message);
    }

    /// Record an error at an explicit location, attributed to the current
    /// definition.
    pub fn report_at(&mut self, prov: &Provenance, message: impl Into<String>) {
        let err = DslError::new(Phase::Run, self.current(), Some(prov), message);
        tracing::debug!(error = %err, "declaration error");
        self.errors.push(err);
    }

    /// Run `dsl` for `def` right away, outside the run pass. Returns true
    /// when the callback reported no error.
    pub fn execute(&mut self, dsl: &Dsl<W>, def: W::Def) -> bool {
        let context = self.world.context(def);
        let before = self.errors.len();
        self.within(context, |s| (**dsl)(s));
        self.errors.len() == before
    }

    /// Run `f` with `context` pushed on the definition stack.
    pub fn within<R>(&mut self, context: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.stack.push(context.into());
        let out = f(self);
        self.stack.pop();
        out
    }
}
