//! Three-level coverage lattice: per-unit records, one rollup per group,
//! one global rollup. Every level is kept per metric kind, so line and
//! branch counts never end up in the same rollup.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::coverage::{Coverage, CoverageKey, MetricKind};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct Coverages {
    units: BTreeMap<CoverageKey, Coverage>,
    groups: BTreeMap<(String, MetricKind), Coverage>,
    global: BTreeMap<MetricKind, Coverage>,
}

impl Coverages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one unit record into the lattice.
    ///
    /// A record whose key is already present replaces the old one, and the
    /// old record's counts are taken back out of its rollups first, so the
    /// rollups always equal the sum of the current unit records. Nothing is
    /// modified when an error is returned.
    pub fn add(&mut self, record: Coverage) -> Result<()> {
        let key = record.key();
        let previous = self.units.get(&key);
        let group_key = (key.group.clone(), key.kind);

        let group = match self.groups.get(&group_key) {
            None => record.without_unit(),
            Some(existing) => {
                let base = match previous {
                    Some(old) => existing.retract(old)?,
                    None => existing.clone(),
                };
                base.combine_in_group(&record)?.without_unit()
            }
        };

        let global = match self.global.get(&key.kind) {
            None => record.as_global(),
            Some(existing) => {
                let base = match previous {
                    Some(old) => existing.retract(old)?,
                    None => existing.clone(),
                };
                base.combine(&record)?.as_global()
            }
        };

        trace!(
            group = %key.group,
            unit = %key.unit,
            kind = %key.kind,
            replaced = previous.is_some(),
            "adding coverage"
        );
        self.groups.insert(group_key, group);
        self.global.insert(key.kind, global);
        self.units.insert(key, record);
        Ok(())
    }

    pub fn add_all<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Coverage>,
    {
        for record in records {
            self.add(record)?;
        }
        Ok(())
    }

    pub fn global(&self, kind: MetricKind) -> Option<&Coverage> {
        self.global.get(&kind)
    }

    pub fn group(&self, group: &str, kind: MetricKind) -> Option<&Coverage> {
        self.groups.get(&(group.to_string(), kind))
    }

    pub fn unit(&self, group: &str, unit: &str, kind: MetricKind) -> Option<&Coverage> {
        self.units.get(&CoverageKey {
            group: group.to_string(),
            unit: unit.to_string(),
            kind,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &Coverage> + '_ {
        self.global.values()
    }

    /// Group rollups, sorted by group name then kind.
    pub fn groups(&self) -> impl Iterator<Item = &Coverage> + '_ {
        self.groups.values()
    }

    /// Unit records in natural-key order.
    pub fn units(&self) -> impl Iterator<Item = &Coverage> + '_ {
        self.units.values()
    }

    /// Global rollups first, then group rollups, then unit records.
    pub fn query(&self) -> impl Iterator<Item = &Coverage> + '_ {
        self.globals().chain(self.groups()).chain(self.units())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// [`Coverages`] behind a mutex, for several producers feeding one lattice.
#[derive(Debug, Default)]
pub struct SharedCoverages {
    inner: Mutex<Coverages>,
}

impl SharedCoverages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, record: Coverage) -> Result<()> {
        self.lock().add(record)
    }

    pub fn snapshot(&self) -> Coverages {
        self.lock().clone()
    }

    pub fn into_inner(self) -> Coverages {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // `add` only commits after every fallible step, so a poisoned lock
    // still guards a consistent lattice.
    fn lock(&self) -> MutexGuard<'_, Coverages> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
