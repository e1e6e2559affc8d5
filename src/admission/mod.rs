//! Hostname admission policy
//!
//! Every hostname discovered while expanding links is classified against the
//! approved and banned lists before any of its URLs may enter the frontier.
//! The result is three-valued: a hostname that has not been reviewed yet is
//! different from one that was rejected.

mod matcher;

pub use matcher::matches_host_pattern;

use crate::storage::{FrontierStore, StorageResult, Table};

/// Admission decision for a hostname
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// Hostname is approved - its links may be queued
    Approved,
    /// Hostname is banned - its links are dropped
    Banned,
    /// Hostname has not been reviewed - probe it for robots.txt
    Unknown,
}

/// Classifies a hostname against approved and banned pattern lists
///
/// Banned is checked first, so a hostname present in both lists is banned.
/// Patterns are exact hostnames or `*.`-prefixed wildcards (see
/// [`matches_host_pattern`]). Classification is pure: it never touches the
/// network or the store.
///
/// # Examples
///
/// ```
/// use handmade_crawler::admission::{classify_hostname, Admission};
///
/// let approved = vec!["a.test".to_string()];
/// let banned = vec!["*.spam.test".to_string()];
///
/// assert_eq!(classify_hostname("a.test", &approved, &banned), Admission::Approved);
/// assert_eq!(classify_hostname("x.spam.test", &approved, &banned), Admission::Banned);
/// assert_eq!(classify_hostname("new.test", &approved, &banned), Admission::Unknown);
/// ```
pub fn classify_hostname(hostname: &str, approved: &[String], banned: &[String]) -> Admission {
    let hostname = hostname.to_lowercase();

    if banned
        .iter()
        .any(|pattern| matches_host_pattern(pattern, &hostname))
    {
        return Admission::Banned;
    }

    if approved
        .iter()
        .any(|pattern| matches_host_pattern(pattern, &hostname))
    {
        return Admission::Approved;
    }

    Admission::Unknown
}

/// Approved and banned hostname lists for one crawl run
///
/// Loaded once when the engine is built and passed in explicitly; nothing in
/// the crate keeps these lists in global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostLists {
    approved: Vec<String>,
    banned: Vec<String>,
}

impl HostLists {
    /// Creates host lists from patterns, lowercasing them
    pub fn new<A, B>(approved: A, banned: B) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            approved: approved
                .into_iter()
                .map(|h| h.as_ref().to_lowercase())
                .collect(),
            banned: banned
                .into_iter()
                .map(|h| h.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Reads the `approved_hostnames` and `banned_hostnames` tables
    pub fn load(store: &dyn FrontierStore) -> StorageResult<Self> {
        let approved = store.select_all(Table::ApprovedHostnames)?;
        let banned = store.select_all(Table::BannedHostnames)?;
        Ok(Self::new(approved, banned))
    }

    /// Classifies a hostname against these lists
    pub fn classify(&self, hostname: &str) -> Admission {
        classify_hostname(hostname, &self.approved, &self.banned)
    }

    pub fn approved(&self) -> &[String] {
        &self.approved
    }

    pub fn banned(&self) -> &[String] {
        &self.banned
    }
}
