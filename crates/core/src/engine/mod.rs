//! Declaration runtime: roots, definition sets, and the run / validate /
//! finalize passes.
//!
//! The engine is generic over a [`Workspace`], the object graph that
//! declarations build. Definitions are cheap handles (`W::Def`); the
//! workspace answers for each handle what its context is, whether it has a
//! declaration callback still to run, and how to validate and finalize it.

mod roots;
mod scope;

pub use roots::{DefinitionSet, Root};
pub use scope::Scope;

use crate::config::EngineConfig;
use crate::error::{DslError, EngineError, Errors, Phase, Provenance, ValidationErrors};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// A declaration callback.
pub type Dsl<W> = Rc<dyn Fn(&mut Scope<'_, W>)>;

/// The object graph a set of roots populates.
pub trait Workspace: Sized + 'static {
    type Def: Copy + Eq + Hash + fmt::Debug;

    /// Human readable location of `def` used in error messages.
    fn context(&self, def: Self::Def) -> String;

    /// Where `def` was declared, used for validation errors.
    fn provenance(&self, _def: Self::Def) -> Option<Provenance> {
        None
    }

    /// Declaration callback of `def`, if it still has one to run.
    fn dsl(&self, def: Self::Def) -> Option<Dsl<Self>>;

    fn validate(&self, _def: Self::Def) -> Result<(), ValidationErrors> {
        Ok(())
    }

    fn finalize(&mut self, _def: Self::Def) {}
}

pub struct Engine<W: Workspace> {
    world: W,
    roots: Vec<Box<dyn Root<W>>>,
    errors: Errors,
    stack: Vec<String>,
    config: EngineConfig,
}

impl<W: Workspace> Engine<W> {
    pub fn new(world: W) -> Self {
        Engine::with_config(world, EngineConfig::default())
    }

    pub fn with_config(world: W, config: EngineConfig) -> Self {
        Engine {
            world,
            roots: Vec::new(),
            errors: Errors::new(),
            stack: Vec::new(),
            config,
        }
    }

    /// Add a root. DSL names must be unique.
    pub fn register(&mut self, root: impl Root<W> + 'static) -> Result<(), EngineError> {
        if self.roots.iter().any(|r| r.dsl_name() == root.dsl_name()) {
            return Err(EngineError::DuplicateRoot(root.dsl_name().to_owned()));
        }
        self.roots.push(Box::new(root));
        Ok(())
    }

    /// Names of the registered roots in dependency order.
    pub fn sort_roots(&self) -> Result<Vec<String>, EngineError> {
        let order = roots::sort_roots(&self.roots)?;
        Ok(order
            .into_iter()
            .map(|i| self.roots[i].dsl_name().to_owned())
            .collect())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    /// Errors collected so far, including top-level declaration errors.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// A top-level scope for declarations made before `run`.
    pub fn scope(&mut self) -> Scope<'_, W> {
        Scope::new(&mut self.world, &mut self.errors, &mut self.stack)
    }

    pub fn declare<R>(&mut self, f: impl FnOnce(&mut Scope<'_, W>) -> R) -> R {
        let mut scope = self.scope();
        f(&mut scope)
    }

    /// Run one callback immediately, outside the pass machinery.
    pub fn execute(&mut self, dsl: &Dsl<W>, def: W::Def) -> bool {
        self.scope().execute(dsl, def)
    }

    /// Reset every root and drop all collected errors.
    pub fn reset(&mut self) {
        for root in &mut self.roots {
            root.reset(&mut self.world);
        }
        self.errors.clear();
        self.stack.clear();
    }

    /// Execute all declarations, then validate, then finalize.
    ///
    /// Declaration and validation errors are accumulated and returned
    /// together; validation only starts once every declaration ran cleanly
    /// and finalize only once validation found nothing.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let order = roots::sort_roots(&self.roots)?;
        debug!(
            roots = ?order.iter().map(|&i| self.roots[i].dsl_name()).collect::<Vec<_>>(),
            "running declarations"
        );

        self.run_pass(&order)?;
        if !self.errors.is_empty() {
            debug!(errors = self.errors.len(), "run pass failed");
            return Err(EngineError::Dsl(self.errors.clone()));
        }

        self.validate_pass(&order);
        if !self.errors.is_empty() {
            debug!(errors = self.errors.len(), "validation failed");
            return Err(EngineError::Dsl(self.errors.clone()));
        }

        self.finalize_pass(&order);
        debug!("design complete");
        Ok(())
    }

    fn sets_of(&self, root: usize) -> Vec<DefinitionSet<W::Def>> {
        let mut sets = Vec::new();
        self.roots[root].iterate_sets(&self.world, &mut |set| sets.push(set));
        sets
    }

    // ── Run pass ─────────────────────────────────────────────────────────────

    fn run_pass(&mut self, order: &[usize]) -> Result<(), EngineError> {
        let mut executed: HashSet<W::Def> = HashSet::new();
        let mut sweeps = 0;
        loop {
            sweeps += 1;
            if sweeps > self.config.max_root_sweeps {
                warn!(sweeps = self.config.max_root_sweeps, "root sweep cap reached");
                return Err(EngineError::TooManyRoots {
                    sweeps: self.config.max_root_sweeps,
                });
            }
            let before = executed.len();
            for &root in order {
                let mut position = 0;
                while position < self.sets_of(root).len() {
                    self.run_set(root, position, &mut executed)?;
                    position += 1;
                }
            }
            if executed.len() == before {
                return Ok(());
            }
        }
    }

    /// Drain the set at `position` of `root`, re-reading the set after each
    /// round so definitions registered by callbacks run in the same pass.
    fn run_set(
        &mut self,
        root: usize,
        position: usize,
        executed: &mut HashSet<W::Def>,
    ) -> Result<(), EngineError> {
        let mut iterations = 0;
        loop {
            let mut queue: VecDeque<W::Def> = self
                .sets_of(root)
                .into_iter()
                .nth(position)
                .unwrap_or_default()
                .into_iter()
                .filter(|def| !executed.contains(def))
                .collect();
            if queue.is_empty() {
                return Ok(());
            }
            iterations += 1;
            if iterations > self.config.max_set_iterations {
                let name = self.roots[root].dsl_name().to_owned();
                warn!(root = %name, "definition set cap reached");
                return Err(EngineError::TooManyDefinitions {
                    root: name,
                    iterations: self.config.max_set_iterations,
                });
            }
            while let Some(def) = queue.pop_front() {
                if !executed.insert(def) {
                    continue;
                }
                if let Some(dsl) = self.world.dsl(def) {
                    trace!(definition = %self.world.context(def), "executing declaration");
                    self.execute(&dsl, def);
                }
            }
        }
    }

    // ── Validate pass ────────────────────────────────────────────────────────

    fn validate_pass(&mut self, order: &[usize]) {
        for &root in order {
            for set in self.sets_of(root) {
                for def in set {
                    let Err(verr) = self.world.validate(def) else {
                        continue;
                    };
                    let fallback = self.world.provenance(def);
                    for entry in verr {
                        let prov = entry.prov.as_ref().or(fallback.as_ref());
                        self.errors.push(DslError::new(
                            Phase::Validate,
                            Some(&entry.context),
                            prov,
                            entry.message,
                        ));
                    }
                }
            }
        }
    }

    // ── Finalize pass ────────────────────────────────────────────────────────

    fn finalize_pass(&mut self, order: &[usize]) {
        for &root in order {
            for set in self.sets_of(root) {
                for def in set {
                    trace!(definition = %self.world.context(def), "finalizing");
                    self.world.finalize(def);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal workspace: each definition belongs to a named root and may
    // carry a callback.
    #[derive(Default)]
    struct Toy {
        defs: Vec<ToyDef>,
        log: Vec<String>,
    }

    struct ToyDef {
        name: String,
        root: String,
        dsl: Option<Dsl<Toy>>,
        invalid: bool,
        finalized: usize,
    }

    impl Toy {
        fn add(&mut self, root: &str, name: &str, dsl: Option<Dsl<Toy>>) -> usize {
            self.defs.push(ToyDef {
                name: name.to_owned(),
                root: root.to_owned(),
                dsl,
                invalid: false,
                finalized: 0,
            });
            self.defs.len() - 1
        }
    }

    impl Workspace for Toy {
        type Def = usize;

        fn context(&self, def: usize) -> String {
            format!("toy {:?}", self.defs[def].name)
        }

        fn dsl(&self, def: usize) -> Option<Dsl<Toy>> {
            self.defs[def].dsl.clone()
        }

        fn validate(&self, def: usize) -> Result<(), ValidationErrors> {
            let mut verr = ValidationErrors::new();
            if self.defs[def].invalid {
                verr.add(self.context(def), None, "invalid");
            }
            verr.into_result()
        }

        fn finalize(&mut self, def: usize) {
            self.defs[def].finalized += 1;
        }
    }

    struct ToyRoot {
        name: String,
        deps: Vec<String>,
    }

    fn root(name: &str, deps: &[&str]) -> ToyRoot {
        ToyRoot {
            name: name.to_owned(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    impl Root<Toy> for ToyRoot {
        fn dsl_name(&self) -> &str {
            &self.name
        }

        fn depends_on(&self) -> Vec<String> {
            self.deps.clone()
        }

        fn iterate_sets(&self, world: &Toy, visit: &mut dyn FnMut(DefinitionSet<usize>)) {
            visit(
                world
                    .defs
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.root == self.name)
                    .map(|(i, _)| i)
                    .collect(),
            );
        }

        fn reset(&mut self, world: &mut Toy) {
            for d in world.defs.iter_mut().filter(|d| d.root == self.name) {
                d.dsl = None;
                d.invalid = false;
            }
        }
    }

    fn logging(msg: &'static str) -> Dsl<Toy> {
        Rc::new(move |s: &mut Scope<'_, Toy>| s.world_mut().log.push(msg.to_owned()))
    }

    fn permutations(items: &[&'static str]) -> Vec<Vec<&'static str>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut p in permutations(&rest) {
                p.insert(0, head);
                out.push(p);
            }
        }
        out
    }

    #[test]
    fn dependencies_come_first_for_every_registration_order() {
        for perm in permutations(&["a", "b", "c"]) {
            let mut engine = Engine::new(Toy::default());
            for name in &perm {
                let r = match *name {
                    "a" => root("a", &["b"]),
                    "b" => root("b", &["c"]),
                    _ => root("c", &[]),
                };
                engine.register(r).unwrap();
            }
            let order = engine.sort_roots().unwrap();
            let pos = |n: &str| order.iter().position(|o| o == n).unwrap();
            assert!(pos("c") < pos("b"), "{:?} -> {:?}", perm, order);
            assert!(pos("b") < pos("a"), "{:?} -> {:?}", perm, order);
        }
    }

    #[test]
    fn two_root_cycle_is_rejected() {
        let mut engine = Engine::new(Toy::default());
        engine.register(root("a", &["b"])).unwrap();
        engine.register(root("b", &["a"])).unwrap();
        let err = engine.sort_roots().unwrap_err();
        assert!(matches!(err, EngineError::DependencyCycle { .. }));
    }

    #[test]
    fn three_root_cycle_is_rejected() {
        let mut engine = Engine::new(Toy::default());
        engine.register(root("a", &["b"])).unwrap();
        engine.register(root("b", &["c"])).unwrap();
        engine.register(root("c", &["a"])).unwrap();
        assert!(matches!(
            engine.sort_roots(),
            Err(EngineError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut engine = Engine::new(Toy::default());
        engine.register(root("a", &["a"])).unwrap();
        match engine.sort_roots() {
            Err(EngineError::DependencyCycle { first, second }) => {
                assert_eq!(first, "a");
                assert_eq!(second, "a");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cycle_prevents_any_execution() {
        let mut world = Toy::default();
        world.add("a", "one", Some(logging("one")));
        let mut engine = Engine::new(world);
        engine.register(root("a", &["b"])).unwrap();
        engine.register(root("b", &["a"])).unwrap();
        assert!(engine.run().is_err());
        assert!(engine.world().log.is_empty());
    }

    #[test]
    fn unknown_and_duplicate_roots() {
        let mut engine = Engine::new(Toy::default());
        engine.register(root("a", &["missing"])).unwrap();
        assert!(matches!(
            engine.register(root("a", &[])),
            Err(EngineError::DuplicateRoot(_))
        ));
        assert!(matches!(
            engine.sort_roots(),
            Err(EngineError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn roots_run_in_dependency_order_then_finalize() {
        let mut world = Toy::default();
        world.add("late", "second", Some(logging("second")));
        world.add("early", "first", Some(logging("first")));
        let mut engine = Engine::new(world);
        engine.register(root("late", &["early"])).unwrap();
        engine.register(root("early", &[])).unwrap();
        engine.run().unwrap();
        assert_eq!(engine.world().log, vec!["first", "second"]);
        assert!(engine.world().defs.iter().all(|d| d.finalized == 1));
    }

    #[test]
    fn definitions_registered_while_running_execute_in_the_same_pass() {
        let mut world = Toy::default();
        let spawn: Dsl<Toy> = Rc::new(|s: &mut Scope<'_, Toy>| {
            s.world_mut().log.push("parent".to_owned());
            let child = logging("child");
            s.world_mut().add("r", "child", Some(child));
        });
        world.add("r", "parent", Some(spawn));
        let mut engine = Engine::new(world);
        engine.register(root("r", &[])).unwrap();
        engine.run().unwrap();
        assert_eq!(engine.world().log, vec!["parent", "child"]);
    }

    #[test]
    fn runaway_registration_hits_the_cap() {
        fn spawner() -> Dsl<Toy> {
            Rc::new(|s: &mut Scope<'_, Toy>| {
                s.world_mut().add("r", "again", Some(spawner()));
            })
        }
        let mut world = Toy::default();
        world.add("r", "seed", Some(spawner()));
        let mut engine = Engine::new(world);
        engine.register(root("r", &[])).unwrap();
        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::TooManyDefinitions { .. }));
        assert!(err.to_string().contains("infinite loop?"));
    }

    #[test]
    fn independent_errors_are_all_collected() {
        let mut world = Toy::default();
        for name in ["a", "b", "c"] {
            let dsl: Dsl<Toy> = Rc::new(move |s: &mut Scope<'_, Toy>| s.report(format!("bad {}", name)));
            world.add("r", name, Some(dsl));
        }
        let mut engine = Engine::new(world);
        engine.register(root("r", &[])).unwrap();
        let err = engine.run().unwrap_err();
        let errs = err.errors().unwrap();
        assert_eq!(errs.len(), 3);
        assert_eq!(errs.as_slice()[0].context.as_deref(), Some("toy \"a\""));
        assert!(errs.as_slice()[0].file.ends_with("mod.rs"));
    }

    #[test]
    fn run_errors_skip_validation_and_finalize() {
        let mut world = Toy::default();
        let failing: Dsl<Toy> = Rc::new(|s: &mut Scope<'_, Toy>| s.report("nope"));
        world.add("r", "a", Some(failing));
        let b = world.add("r", "b", None);
        world.defs[b].invalid = true;
        let mut engine = Engine::new(world);
        engine.register(root("r", &[])).unwrap();
        let err = engine.run().unwrap_err();
        let errs = err.errors().unwrap();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.as_slice()[0].phase, Phase::Run);
        assert!(engine.world().defs.iter().all(|d| d.finalized == 0));
    }

    #[test]
    fn validation_errors_stop_finalize() {
        let mut world = Toy::default();
        let a = world.add("r", "a", None);
        let b = world.add("r", "b", None);
        world.defs[a].invalid = true;
        world.defs[b].invalid = true;
        let mut engine = Engine::new(world);
        engine.register(root("r", &[])).unwrap();
        let err = engine.run().unwrap_err();
        let errs = err.errors().unwrap();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.phase == Phase::Validate));
        assert!(engine.world().defs.iter().all(|d| d.finalized == 0));
    }

    #[test]
    fn execute_reports_success_and_restores_the_stack() {
        let mut world = Toy::default();
        let def = world.add("r", "leaf", None);
        let mut engine = Engine::new(world);
        let ok: Dsl<Toy> = Rc::new(|s: &mut Scope<'_, Toy>| {
            assert_eq!(s.current(), Some("toy \"leaf\""));
        });
        assert!(engine.execute(&ok, def));
        let bad: Dsl<Toy> = Rc::new(|s: &mut Scope<'_, Toy>| s.report("broken"));
        assert!(!engine.execute(&bad, def));
        assert_eq!(engine.scope().depth(), 0);
    }

    #[test]
    fn top_level_reports_have_no_context() {
        let mut engine = Engine::new(Toy::default());
        engine.declare(|s| s.report("loose"));
        let err = &engine.errors().as_slice()[0];
        assert!(err.context.is_none());
        assert!(err.to_string().ends_with("loose (top level)"));
    }

    #[test]
    fn reset_clears_errors_and_roots() {
        let mut world = Toy::default();
        let failing: Dsl<Toy> = Rc::new(|s: &mut Scope<'_, Toy>| s.report("nope"));
        world.add("r", "a", Some(failing));
        let mut engine = Engine::new(world);
        engine.register(root("r", &[])).unwrap();
        assert!(engine.run().is_err());
        engine.reset();
        assert!(engine.errors().is_empty());
        assert!(engine.run().is_ok());
    }
}
