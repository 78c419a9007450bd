//! Structural comparison of named types.
//!
//! Two relations are provided. Equality holds when two types have the same
//! properties with equal property specs, recursively through `$ref`s.
//! The subset order `a <= b` holds when every property of `a` exists in `b`
//! with an equal spec, where nested references are again compared with
//! `<=`. Both relations treat a pair that is already being compared as
//! related, so recursive types compare without looping.

use crate::package::{parse_type_token, ComplexTypeSpec, PackageSpec, PropertySpec, TypeSpec};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Equal,
    Subset,
}

/// Compares types of one package, optionally after renaming tokens.
#[derive(Debug, Clone, Copy)]
pub struct Comparer<'a> {
    spec: &'a PackageSpec,
    rewrites: Option<&'a BTreeMap<String, String>>,
}

impl<'a> Comparer<'a> {
    /// Compare types of `spec`.
    pub fn new(spec: &'a PackageSpec) -> Self {
        Self {
            spec,
            rewrites: None,
        }
    }

    /// A comparer that first maps tokens through `rewrites`.
    pub fn with_rewrites(&self, rewrites: &'a BTreeMap<String, String>) -> Self {
        Self {
            spec: self.spec,
            rewrites: Some(rewrites),
        }
    }

    /// Structural equality of the types named `a` and `b`.
    pub fn equal_type_refs(&self, a: &str, b: &str) -> bool {
        self.comparison(Mode::Equal).type_refs(a, b)
    }

    /// Whether the type named `a` is a structural subset of `b`.
    pub fn less_than_or_equal_type_refs(&self, a: &str, b: &str) -> bool {
        self.comparison(Mode::Subset).type_refs(a, b)
    }

    /// Strict subset: `a <= b` and not `a == b`.
    pub fn less_than_type_refs(&self, a: &str, b: &str) -> bool {
        self.less_than_or_equal_type_refs(a, b) && !self.equal_type_refs(a, b)
    }

    /// Structural equality of two type definitions.
    pub fn equal_types(&self, a: &ComplexTypeSpec, b: &ComplexTypeSpec) -> bool {
        self.comparison(Mode::Equal).complex_types(a, b)
    }

    /// Structural subset order of two type definitions.
    pub fn less_than_or_equal_types(&self, a: &ComplexTypeSpec, b: &ComplexTypeSpec) -> bool {
        self.comparison(Mode::Subset).complex_types(a, b)
    }

    fn comparison(&self, mode: Mode) -> Comparison<'a> {
        Comparison {
            spec: self.spec,
            rewrites: self.rewrites,
            mode,
            in_progress: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct XProperty<'s> {
    required: bool,
    plain: bool,
    spec: Option<&'s PropertySpec>,
}

fn x_properties(ty: &ComplexTypeSpec) -> BTreeMap<&str, XProperty<'_>> {
    let mut map: BTreeMap<&str, XProperty<'_>> = BTreeMap::new();
    let blank = XProperty {
        required: false,
        plain: false,
        spec: None,
    };
    for name in &ty.plain {
        map.entry(name.as_str()).or_insert(blank).plain = true;
    }
    for name in &ty.required {
        map.entry(name.as_str()).or_insert(blank).required = true;
    }
    for (name, spec) in &ty.properties {
        map.entry(name.as_str()).or_insert(blank).spec = Some(spec);
    }
    map
}

struct Comparison<'a> {
    spec: &'a PackageSpec,
    rewrites: Option<&'a BTreeMap<String, String>>,
    mode: Mode,
    in_progress: BTreeSet<(String, String)>,
}

impl Comparison<'_> {
    fn rewrite(&self, token: &str) -> String {
        self.rewrites
            .and_then(|r| r.get(token))
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }

    fn type_refs(&mut self, a: &str, b: &str) -> bool {
        let (a, b) = (self.rewrite(a), self.rewrite(b));
        if a == b {
            return true;
        }
        let spec = self.spec;
        let (Some(a_ty), Some(b_ty)) = (spec.types.get(&a), spec.types.get(&b)) else {
            return false;
        };
        let key = (a, b);
        if self.in_progress.contains(&key) {
            return true;
        }
        self.in_progress.insert(key.clone());
        let result = self.complex_types(a_ty, b_ty);
        self.in_progress.remove(&key);
        result
    }

    fn raw_refs(&mut self, a: Option<&str>, b: Option<&str>) -> bool {
        if a == b {
            return true;
        }
        match (a.and_then(parse_type_token), b.and_then(parse_type_token)) {
            (Some(a), Some(b)) => self.type_refs(a, b),
            _ => false,
        }
    }

    fn complex_types(&mut self, a: &ComplexTypeSpec, b: &ComplexTypeSpec) -> bool {
        if a.is_enum() || b.is_enum() {
            return false;
        }
        if a.kind != b.kind
            || a.is_overlay != b.is_overlay
            || a.language != b.language
            || a.description != b.description
        {
            return false;
        }
        self.property_maps(&x_properties(a), &x_properties(b))
    }

    fn property_maps(
        &mut self,
        a: &BTreeMap<&str, XProperty<'_>>,
        b: &BTreeMap<&str, XProperty<'_>>,
    ) -> bool {
        match self.mode {
            // An empty shape says nothing about its relation to a populated one.
            Mode::Subset if a.is_empty() || b.is_empty() => return a.len() == b.len(),
            Mode::Equal if a.len() != b.len() => return false,
            _ => {},
        }
        a.iter().all(|(name, a_prop)| match b.get(name) {
            Some(b_prop) => self.properties(a_prop, b_prop),
            None => false,
        })
    }

    fn properties(&mut self, a: &XProperty<'_>, b: &XProperty<'_>) -> bool {
        if a.required != b.required || a.plain != b.plain {
            return false;
        }
        let blank = PropertySpec::default();
        self.property_specs(a.spec.unwrap_or(&blank), b.spec.unwrap_or(&blank))
    }

    fn property_specs(&mut self, a: &PropertySpec, b: &PropertySpec) -> bool {
        self.type_specs(Some(&a.type_spec), Some(&b.type_spec))
            && a.description == b.description
            && a.const_value == b.const_value
            && a.default == b.default
            && a.default_info == b.default_info
            && a.deprecation_message == b.deprecation_message
            && a.language == b.language
            && a.secret == b.secret
            && a.replace_on_changes == b.replace_on_changes
            && a.will_replace_on_changes == b.will_replace_on_changes
    }

    fn type_specs(&mut self, a: Option<&TypeSpec>, b: Option<&TypeSpec>) -> bool {
        let (a, b) = match (a, b) {
            (None, None) => return true,
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        if a.kind != b.kind || a.plain != b.plain || a.discriminator != b.discriminator {
            return false;
        }
        if !self.raw_refs(a.reference.as_deref(), b.reference.as_deref()) {
            return false;
        }
        if !self.type_specs(a.additional_properties.as_deref(), b.additional_properties.as_deref()) {
            return false;
        }
        if !self.type_specs(a.items.as_deref(), b.items.as_deref()) {
            return false;
        }
        match (&a.one_of, &b.one_of) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.type_specs(Some(x), Some(y)))
            },
            _ => false,
        }
    }
}
