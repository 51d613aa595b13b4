//! Per-type member table cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::member::{MemberSet, MemberTable};
use crate::object::{Persist, PersistType};

/// Builds each type's [`MemberTable`] on first use and keeps it for the
/// lifetime of the owning registry.
#[derive(Default)]
pub struct MemberDiscovery {
    tables: RwLock<HashMap<TypeId, Arc<MemberTable>>>,
    builds: AtomicUsize,
}

impl MemberDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Member table of the object's concrete type, or `None` for an absent
    /// object.
    pub fn discover(&self, object: Option<&dyn Persist>) -> Option<Arc<MemberTable>> {
        object.map(|o| self.table_for(o.persist_type()))
    }

    pub fn table_of<T: Persist>(&self) -> Arc<MemberTable> {
        self.table_for(T::describe())
    }

    pub fn table_for(&self, ty: PersistType) -> Arc<MemberTable> {
        if let Some(table) = self.tables.read().get(&ty.id()) {
            return table.clone();
        }
        let mut tables = self.tables.write();
        tables
            .entry(ty.id())
            .or_insert_with(|| {
                let mut members = MemberSet::new(ty.name());
                ty.declare(&mut members);
                let table = members.finish();
                self.builds.fetch_add(1, Ordering::Relaxed);
                log::debug!("discovered {} member keys on {}", table.len(), ty.name());
                Arc::new(table)
            })
            .clone()
    }

    /// Number of member tables built so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}
