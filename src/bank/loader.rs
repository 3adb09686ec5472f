use std::collections::HashMap;
use std::sync::Arc;

use crate::bank::{Bank, BankLoadError, BankSource, Category, parse_bank};

/// Loads each category at most once and keeps the parsed bank for the
/// lifetime of the loader. Failed loads leave the cache untouched so the
/// next call retries.
pub struct BankLoader<S> {
    source: S,
    cache: HashMap<Category, Arc<Bank>>,
}

impl<S: BankSource> BankLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn source_name(&self) -> String {
        self.source.describe()
    }

    pub fn is_loaded(&self, category: Category) -> bool {
        self.cache.contains_key(&category)
    }

    pub fn cached(&self, category: Category) -> Option<Arc<Bank>> {
        self.cache.get(&category).cloned()
    }

    pub fn load(&mut self, category: Category) -> Result<Arc<Bank>, BankLoadError> {
        if let Some(bank) = self.cache.get(&category) {
            return Ok(Arc::clone(bank));
        }

        let payload = self.source.fetch(category).inspect_err(|e| {
            tracing::warn!(%category, error = %e, "bank fetch failed");
        })?;
        let bank = Arc::new(parse_bank(category, &payload).inspect_err(|e| {
            tracing::warn!(%category, error = %e, "bank payload rejected");
        })?);

        tracing::info!(%category, questions = bank.len(), source = %self.source.describe(), "bank loaded");
        self.cache.insert(category, Arc::clone(&bank));
        Ok(bank)
    }

    /// Load every category, stopping at the first failure.
    pub fn load_all(&mut self) -> Result<Vec<Arc<Bank>>, BankLoadError> {
        Category::ALL.iter().map(|&c| self.load(c)).collect()
    }
}
