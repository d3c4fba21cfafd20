// bndl-common/src/model/resolved.rs
use super::Spec;

/// Output of a resolver: one spec per package name, dependencies before dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    specs: Vec<Spec>,
}

impl ResolvedSet {
    pub fn new(specs: Vec<Spec>) -> Self {
        Self { specs }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spec> {
        self.specs.iter()
    }

    /// Position of the spec for `name`; positions are stable for the life of the set.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Spec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn at_mut(&mut self, position: usize) -> Option<&mut Spec> {
        self.specs.get_mut(position)
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = &'a Spec;
    type IntoIter = std::slice::Iter<'a, Spec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}
