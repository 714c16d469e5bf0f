//! Admission policy for contributor records

use crate::types::Contributor;
use std::collections::HashSet;

const AUTOMATION_SUFFIX: &str = "[bot]";

/// Why a record was kept out of the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Automation,
    Duplicate,
    Excluded,
}

/// Static part of the policy: which identities are never shown
#[derive(Debug, Clone, Default)]
pub struct ContributorFilter {
    excluded: HashSet<String>,
}

impl ContributorFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_automation(login: &str) -> bool {
        login.ends_with(AUTOMATION_SUFFIX)
    }

    pub fn is_excluded(&self, login: &str) -> bool {
        self.excluded.contains(login)
    }

    /// Start building a fresh snapshot under this policy
    pub fn builder(&self) -> SnapshotBuilder<'_> {
        SnapshotBuilder {
            filter: self,
            seen: HashSet::new(),
            contributors: Vec::new(),
        }
    }
}

/// Accumulates admitted contributors across sources, first occurrence wins
pub struct SnapshotBuilder<'a> {
    filter: &'a ContributorFilter,
    seen: HashSet<String>,
    contributors: Vec<Contributor>,
}

impl SnapshotBuilder<'_> {
    /// Offer one record; checks run in order automation, duplicate, excluded
    pub fn offer(&mut self, contributor: Contributor) -> Result<(), Rejection> {
        if ContributorFilter::is_automation(&contributor.login) {
            return Err(Rejection::Automation);
        }
        if self.seen.contains(&contributor.login) {
            return Err(Rejection::Duplicate);
        }
        if self.filter.is_excluded(&contributor.login) {
            return Err(Rejection::Excluded);
        }

        self.seen.insert(contributor.login.clone());
        self.contributors.push(contributor);
        Ok(())
    }

    /// Offer every record from one source, returning how many were admitted
    pub fn extend(&mut self, contributors: Vec<Contributor>) -> usize {
        contributors
            .into_iter()
            .map(|c| self.offer(c))
            .filter(Result::is_ok)
            .count()
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    pub fn finish(self) -> Vec<Contributor> {
        self.contributors
    }
}
