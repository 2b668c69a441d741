//! Append-only evidence collection for one pipeline run.

use crate::model::{Category, EvidenceItem};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    items: Vec<EvidenceItem>,
    ids: HashSet<String>,
}

/// Cheap-to-clone handle; every clone appends to the same list.
///
/// Writes go through a single mutex. Reads return a snapshot sorted by
/// `(source_tool, ordinal)`, so the order in which concurrent adapter tasks
/// finished is never observable.
#[derive(Clone, Default)]
pub struct EvidenceStore {
    inner: Arc<Mutex<Inner>>,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking writer cannot leave the list half-updated: push and
        // insert happen after all fallible work.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends an item. Returns `false` (and stores nothing) when an item
    /// with the same id is already present.
    pub fn add(&self, item: EvidenceItem) -> bool {
        let mut g = self.lock();
        if !g.ids.insert(item.id.clone()) {
            return false;
        }
        g.items.push(item);
        true
    }

    pub fn extend(&self, items: impl IntoIterator<Item = EvidenceItem>) -> usize {
        items.into_iter().filter(|i| self.add(i.clone())).count()
    }

    pub fn all(&self) -> Vec<EvidenceItem> {
        let mut items = self.lock().items.clone();
        items.sort_by(|a, b| {
            a.source_tool
                .cmp(&b.source_tool)
                .then(a.ordinal.cmp(&b.ordinal))
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }

    pub fn by_category(&self, category: Category) -> Vec<EvidenceItem> {
        self.all()
            .into_iter()
            .filter(|i| i.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> BTreeMap<Category, usize> {
        let mut out: BTreeMap<Category, usize> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        for item in self.lock().items.iter() {
            *out.entry(item.category).or_insert(0) += 1;
        }
        out
    }
}

impl std::fmt::Debug for EvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceStore")
            .field("len", &self.len())
            .finish()
    }
}
