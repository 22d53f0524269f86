//! Predicates that narrow a listing down to the entries a command asked for.

use std::fmt;
use std::sync::Arc;

use crate::models::{Binding, Named};

/// A pure boolean test over an entity. Filters are cheap to clone and may be
/// combined with [`Filter::and`], [`Filter::or`] and [`Filter::not`].
pub struct Filter<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Filter {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter")
    }
}

impl<T: 'static> Filter<T> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Filter {
            predicate: Arc::new(predicate),
        }
    }

    /// Lets every entity pass.
    pub fn all() -> Self {
        Filter::new(|_| true)
    }

    pub fn matches(&self, entity: &T) -> bool {
        (self.predicate)(entity)
    }

    pub fn and(self, other: Filter<T>) -> Self {
        Filter::new(move |entity| self.matches(entity) && other.matches(entity))
    }

    pub fn or(self, other: Filter<T>) -> Self {
        Filter::new(move |entity| self.matches(entity) || other.matches(entity))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::new(move |entity| !self.matches(entity))
    }

    /// Keeps the passing entities in their original order.
    pub fn apply(&self, entities: Vec<T>) -> Vec<T> {
        entities.into_iter().filter(|entity| self.matches(entity)).collect()
    }
}

impl<T: Named + 'static> Filter<T> {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Filter::new(move |entity: &T| entity.name() == name)
    }
}

impl Filter<Binding> {
    /// Bindings from exchange `from` to the queue or exchange `target`.
    pub fn between(from: impl Into<String>, target: impl Into<String>) -> Self {
        let from = from.into();
        let target = target.into();
        Filter::new(move |binding: &Binding| binding.from.name == from && binding.target_name == target)
    }

    pub fn from_exchange(from: impl Into<String>) -> Self {
        let from = from.into();
        Filter::new(move |binding: &Binding| binding.from.name == from)
    }
}

impl<T: 'static> Default for Filter<T> {
    fn default() -> Self {
        Filter::all()
    }
}
