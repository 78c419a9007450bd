//! Detection of unrolled recursion.

use super::comparer::Comparer;
use crate::error::Result;
use crate::package::{visit_types, PackageSpec};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Recursion roots mapped to the types that unroll them.
pub type DetectedRecursion = BTreeMap<String, BTreeSet<String>>;

/// Finds types that repeat a shape at increasing depth.
#[derive(Debug)]
pub struct RecursionDetector<'a> {
    spec: &'a PackageSpec,
    cmp: Comparer<'a>,
    detected: BTreeSet<String>,
}

impl<'a> RecursionDetector<'a> {
    /// Create a detector over `spec`.
    pub fn new(spec: &'a PackageSpec) -> Self {
        Self {
            spec,
            cmp: Comparer::new(spec),
            detected: BTreeSet::new(),
        }
    }

    /// Find recursion roots reachable from `starters` and their unrolled
    /// instances.
    ///
    /// A node `t3` below ancestors `t1` and then `t2` witnesses recursion
    /// rooted at `t1` when `t3 < t2 < t1` and `t1`, `t2` declare the same
    /// property names. Structurally equal roots are merged, keeping the one
    /// with the shortest token. Every other visited type that is `<=` a root
    /// becomes an instance of the first such root.
    pub fn detect(mut self, starters: &[String]) -> Result<DetectedRecursion> {
        visit_types(self.spec, starters, &mut |ancestors, current| {
            self.detect_roots(ancestors, current);
            true
        })?;

        let roots = self.roots();
        let mut detected: DetectedRecursion = roots
            .iter()
            .map(|root| (root.clone(), BTreeSet::new()))
            .collect();

        let cmp = self.cmp;
        visit_types(self.spec, starters, &mut |_, current| {
            let root = roots
                .iter()
                .find(|root| root.as_str() != current && cmp.less_than_or_equal_type_refs(current, root));
            if let Some(root) = root {
                if let Some(instances) = detected.get_mut(root) {
                    instances.insert(current.to_string());
                }
            }
            true
        })?;
        Ok(detected)
    }

    fn detect_roots(&mut self, ancestors: &[String], current: &str) {
        for (i, a1) in ancestors.iter().enumerate() {
            if self.detected.contains(a1) {
                continue;
            }
            for a2 in &ancestors[i + 1..] {
                if self.witnesses(a1, a2, current) {
                    trace!(root = %a1, via = %a2, witness = %current, "Detected recursion root");
                    self.detected.insert(a1.clone());
                    return;
                }
            }
        }
    }

    fn witnesses(&self, t1: &str, t2: &str, t3: &str) -> bool {
        self.cmp.less_than_type_refs(t3, t2)
            && self.cmp.less_than_type_refs(t2, t1)
            && self.same_property_names(t1, t2)
    }

    fn same_property_names(&self, t1: &str, t2: &str) -> bool {
        match (self.spec.types.get(t1), self.spec.types.get(t2)) {
            (Some(a), Some(b)) => a.properties.keys().eq(b.properties.keys()),
            _ => false,
        }
    }

    fn roots(&self) -> Vec<String> {
        let mut candidates: Vec<&String> = self.detected.iter().collect();
        candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut roots: Vec<String> = Vec::new();
        for candidate in candidates {
            if !roots.iter().any(|r| self.cmp.equal_type_refs(r, candidate)) {
                roots.push(candidate.clone());
            }
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::starter_type_refs;
    use serde_json::json;

    // Node -> Node -> Node, each level losing the deepest `next`.
    fn unrolled_list() -> PackageSpec {
        serde_json::from_value(json!({
            "name": "t",
            "resources": {
                "t:index:Res": {
                    "properties": { "head": { "$ref": "#/types/t:index/n:N" } }
                }
            },
            "types": {
                "t:index/n:N": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "string" },
                        "next": { "$ref": "#/types/t:index/nNext:NNext" }
                    }
                },
                "t:index/nNext:NNext": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "string" },
                        "next": { "$ref": "#/types/t:index/nNextNext:NNextNext" }
                    }
                },
                "t:index/nNextNext:NNextNext": {
                    "type": "object",
                    "properties": { "value": { "type": "string" } }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_detects_root_and_instances() {
        let spec = unrolled_list();
        let starters = starter_type_refs(&spec).unwrap();
        let detected = RecursionDetector::new(&spec).detect(&starters).unwrap();

        let instances = detected.get("t:index/n:N").expect("root detected");
        let expected: BTreeSet<String> = ["t:index/nNext:NNext", "t:index/nNextNext:NNextNext"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(instances, &expected);
        assert_eq!(detected.len(), 1);
    }

    #[test]
    fn test_no_recursion_without_repetition() {
        let spec: PackageSpec = serde_json::from_value(json!({
            "name": "t",
            "resources": {
                "t:index:Res": { "properties": { "a": { "$ref": "#/types/t:index/a:A" } } }
            },
            "types": {
                "t:index/a:A": {
                    "type": "object",
                    "properties": { "b": { "$ref": "#/types/t:index/b:B" } }
                },
                "t:index/b:B": {
                    "type": "object",
                    "properties": { "c": { "type": "string" } }
                }
            }
        }))
        .unwrap();
        let starters = starter_type_refs(&spec).unwrap();
        assert!(RecursionDetector::new(&spec).detect(&starters).unwrap().is_empty());
    }
}
