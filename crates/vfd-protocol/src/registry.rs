//! Name to model lookup, built explicitly at startup.

use crate::error::{VfdError, VfdResult};
use crate::models::VfdModel;

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<(&'static str, VfdModel)>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Every model this crate implements, under its canonical name.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for model in VfdModel::ALL {
            registry.register(model.name(), *model);
        }
        registry
    }

    /// Add or replace an entry. Names compare case-insensitively.
    pub fn register(&mut self, name: &'static str, model: VfdModel) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => *entry = (name, model),
            None => self.entries.push((name, model)),
        }
    }

    pub fn get(&self, name: &str) -> Option<VfdModel> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(name))
            .map(|(_, model)| *model)
    }

    /// Resolve a configured model name.
    pub fn lookup(&self, name: &str) -> VfdResult<VfdModel> {
        self.get(name)
            .ok_or_else(|| VfdError::UnknownModel(name.trim().to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
