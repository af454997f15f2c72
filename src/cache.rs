//! Memoisation of constructed evaluators.
//!
//! Loaders that see the same formula many times (one per parameter file, one
//! per simulated body, ...) can go through a [`FormulaCache`] so each distinct
//! formula is parsed and validated once.

use crate::config::EvaluatorConfig;
use crate::error::ConstructionError;
use crate::safe_evaluator::SafeEvaluator;
use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

type CacheKey = (String, Vec<String>);

pub struct FormulaCache {
    entries: Mutex<LruCache<CacheKey, Arc<SafeEvaluator>>>,
    config: EvaluatorConfig,
}

impl FormulaCache {
    /// A cache holding at most `capacity` evaluators (at least one).
    pub fn new(capacity: usize) -> Self {
        Self::with_config(capacity, EvaluatorConfig::default())
    }

    pub fn with_config(capacity: usize, config: EvaluatorConfig) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            config,
        }
    }

    /// Returns the cached evaluator for this formula and variable set, building
    /// it on a miss. Failed constructions are not cached.
    pub fn get_or_build<I, S>(
        &self,
        expression: &str,
        allowed_variables: I,
    ) -> Result<Arc<SafeEvaluator>, ConstructionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut variables: Vec<String> = allowed_variables.into_iter().map(Into::into).collect();
        variables.sort();
        variables.dedup();
        let key = (expression.trim().to_string(), variables);

        if let Some(evaluator) = self.lock().get(&key) {
            return Ok(Arc::clone(evaluator));
        }

        debug!("Formula cache miss for '{}'", key.0);
        let evaluator = Arc::new(
            SafeEvaluator::builder(&key.0)
                .allow_variables(key.1.iter().cloned())
                .config(self.config)
                .build()?,
        );
        self.lock().put(key, Arc::clone(&evaluator));
        Ok(evaluator)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are immutable once inserted, so a poisoned lock is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, Arc<SafeEvaluator>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
