//! Roots and dependency ordering between them.

use super::Workspace;
use crate::error::EngineError;
use std::collections::{HashMap, HashSet};

/// An ordered batch of definitions processed together in one pass.
pub type DefinitionSet<D> = Vec<D>;

/// Owner of a disjoint slice of the workspace.
pub trait Root<W: Workspace> {
    /// Name of the sub-language; unique among registered roots.
    fn dsl_name(&self) -> &str;

    /// Names of the roots that must run before this one.
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// Visit the definition sets of this root in processing order.
    fn iterate_sets(&self, world: &W, visit: &mut dyn FnMut(DefinitionSet<W::Def>));

    /// Drop everything this root owns in `world`.
    fn reset(&mut self, world: &mut W);
}

/// Order roots so every root comes after everything it depends on.
///
/// Returns indices into `roots`. Each root's transitive dependency chain is
/// computed depth first (dependencies before dependents); any two roots
/// reachable from each other's chains form a cycle. The final order walks
/// roots in registration order and splices in each chain.
pub(crate) fn sort_roots<W: Workspace>(
    roots: &[Box<dyn Root<W>>],
) -> Result<Vec<usize>, EngineError> {
    let index: HashMap<&str, usize> = roots
        .iter()
        .enumerate()
        .map(|(i, r)| (r.dsl_name(), i))
        .collect();

    let mut direct: Vec<Vec<usize>> = Vec::with_capacity(roots.len());
    for r in roots {
        let mut deps = Vec::new();
        for name in r.depends_on() {
            let dep = index.get(name.as_str()).copied().ok_or_else(|| {
                EngineError::UnknownDependency {
                    root: r.dsl_name().to_owned(),
                    dependency: name.clone(),
                }
            })?;
            deps.push(dep);
        }
        direct.push(deps);
    }

    let chains: Vec<Vec<usize>> = (0..roots.len())
        .map(|i| {
            let mut visited = HashSet::new();
            let mut chain = Vec::new();
            collect_dependencies(i, &direct, &mut visited, &mut chain);
            chain
        })
        .collect();

    for i in 0..roots.len() {
        for j in i + 1..roots.len() {
            if chains[i].contains(&j) && chains[j].contains(&i) {
                return Err(EngineError::DependencyCycle {
                    first: roots[i].dsl_name().to_owned(),
                    second: roots[j].dsl_name().to_owned(),
                });
            }
        }
    }
    // Pairs cannot see a root that depends on itself.
    for (i, chain) in chains.iter().enumerate() {
        if chain.contains(&i) {
            let name = roots[i].dsl_name().to_owned();
            return Err(EngineError::DependencyCycle {
                first: name.clone(),
                second: name,
            });
        }
    }

    let mut placed = vec![false; roots.len()];
    let mut order = Vec::with_capacity(roots.len());
    for (i, chain) in chains.iter().enumerate() {
        for &dep in chain {
            if !placed[dep] {
                placed[dep] = true;
                order.push(dep);
            }
        }
        if !placed[i] {
            placed[i] = true;
            order.push(i);
        }
    }
    Ok(order)
}

fn collect_dependencies(
    root: usize,
    direct: &[Vec<usize>],
    visited: &mut HashSet<usize>,
    chain: &mut Vec<usize>,
) {
    for &dep in &direct[root] {
        if visited.insert(dep) {
            collect_dependencies(dep, direct, visited, chain);
            chain.push(dep);
        }
    }
}
