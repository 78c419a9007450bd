//! Recursive type simplification.
//!
//! Provider schemas cannot express recursive blocks, so providers unroll
//! them to a fixed depth: a `statement` block contains an `and_statement`
//! block that contains a `statement` block, and so on, each level dropping
//! the deepest recursive attribute. The generated package document then
//! carries one named type per level.
//!
//! [`simplify_recursive_types`] detects these chains and rewrites them into
//! a single self-referencing type:
//!
//! 1. find recursion roots and their unrolled instances
//!    ([`RecursionDetector`]);
//! 2. point every instance at its root;
//! 3. among the types reachable from roots and instances, merge types that
//!    are structurally equal once step 2 is applied, keeping the shortest
//!    token (ties broken lexicographically);
//! 4. rewrite every `$ref` accordingly and drop the rewritten types.
//!
//! Running the simplification on its own output changes nothing.

mod comparer;
mod detector;

pub use comparer::Comparer;
pub use detector::{DetectedRecursion, RecursionDetector};

use crate::error::Result;
use crate::package::{rewrite_type_refs, starter_type_refs, type_ref_closure, PackageSpec, TypeRefs};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Options for [`simplify_recursive_types_with`].
#[derive(Debug, Clone)]
pub struct UnrollOptions {
    /// Merge structurally equal types reachable from recursion roots.
    pub collapse_equal_types: bool,
}

impl Default for UnrollOptions {
    fn default() -> Self {
        Self {
            collapse_equal_types: true,
        }
    }
}

impl UnrollOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether structurally equal types are merged.
    pub fn with_collapse_equal_types(mut self, collapse: bool) -> Self {
        self.collapse_equal_types = collapse;
        self
    }
}

/// Collapse unrolled recursion in `spec` with the default options.
///
/// The document is rewritten in place and should be treated as consumed:
/// rewritten types are removed from `types`.
pub fn simplify_recursive_types(spec: &mut PackageSpec) -> Result<()> {
    simplify_recursive_types_with(spec, &UnrollOptions::default())
}

/// Collapse unrolled recursion in `spec`.
pub fn simplify_recursive_types_with(spec: &mut PackageSpec, options: &UnrollOptions) -> Result<()> {
    let rewrites = rewrite_rules(spec, options)?;
    if rewrites.is_empty() {
        debug!("No unrolled recursion detected");
        return Ok(());
    }
    info!(rewrites = rewrites.len(), "Simplifying recursive types");
    rewrite_type_refs(spec, &rewrites)
}

/// Compute the token rewrites [`simplify_recursive_types_with`] applies,
/// without modifying `spec`.
///
/// Every key maps directly to a surviving token.
pub fn rewrite_rules(spec: &PackageSpec, options: &UnrollOptions) -> Result<BTreeMap<String, String>> {
    let starters = starter_type_refs(spec)?;
    let detected = RecursionDetector::new(spec).detect(&starters)?;

    let mut rules: BTreeMap<String, String> = BTreeMap::new();
    for (root, instances) in &detected {
        debug!(root = %root, instances = instances.len(), "Recursion root");
        for instance in instances {
            rules.insert(instance.clone(), root.clone());
        }
    }
    if rules.is_empty() {
        return Ok(rules);
    }

    if options.collapse_equal_types {
        let mut reachable = TypeRefs::new();
        reachable.extend(detected.keys().cloned());
        reachable.extend(rules.keys().cloned());
        let closure = type_ref_closure(spec, &reachable)?;

        let cmp = Comparer::new(spec);
        let root_rules = rules.clone();
        let cmp = cmp.with_rewrites(&root_rules);
        let mut classes: Vec<Vec<&str>> = Vec::new();
        for token in &closure {
            if root_rules.contains_key(token) || !spec.types.contains_key(token) {
                continue;
            }
            match classes.iter_mut().find(|class| cmp.equal_type_refs(class[0], token)) {
                Some(class) => class.push(token.as_str()),
                None => classes.push(vec![token.as_str()]),
            }
        }
        for class in classes.iter().filter(|class| class.len() > 1) {
            let best = best_token(class);
            for member in class.iter().filter(|member| **member != best) {
                debug!(from = %member, to = %best, "Merging equal type");
                rules.insert(member.to_string(), best.to_string());
            }
        }
    }

    Ok(resolve_chains(&rules))
}

/// The preferred name among equivalent tokens: shortest, then smallest.
pub fn best_token<'t>(tokens: &[&'t str]) -> &'t str {
    tokens
        .iter()
        .copied()
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .unwrap_or_default()
}

fn resolve_chains(rules: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut resolved = BTreeMap::new();
    for from in rules.keys() {
        let mut target = from;
        let mut hops = 0;
        while let Some(next) = rules.get(target) {
            if hops > rules.len() {
                break;
            }
            target = next;
            hops += 1;
        }
        if target != from {
            resolved.insert(from.clone(), target.clone());
        }
    }
    resolved
}
