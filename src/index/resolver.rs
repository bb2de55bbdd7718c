// src/index/resolver.rs
use crate::edinet::classify::{dedup_by_doc_id, is_annual_report};
use crate::edinet::models::{Company, Filing};
use crate::index::snapshot::YearSnapshot;
use crate::utils::error::SnapshotError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where a year's snapshot JSON comes from. Injected explicitly at
/// construction so the resolver never discovers files through ambient
/// global state; the Inline variant allows fully synthetic tests.
#[derive(Debug, Clone)]
pub enum SnapshotSource {
    File(PathBuf),
    Inline(String),
}

impl SnapshotSource {
    async fn read(&self) -> Result<String, SnapshotError> {
        match self {
            SnapshotSource::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            SnapshotSource::Inline(json) => Ok(json.clone()),
        }
    }
}

/// Outcome of one resolution. "Year not indexed" is deliberately distinct
/// from "indexed but nothing matched" so the caller can show 未収録 vs なし.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No snapshot is registered for the year, or its file is unreadable.
    NotIndexed,
    /// The year is indexed; the list may legitimately be empty.
    Indexed(Vec<Filing>),
}

/// Token for one resolution session. Completions carrying a stale token are
/// discarded, so a restarted session can never be overwritten by leftovers
/// of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

/// Resolves (company, year) to the filtered filing list from the per-year
/// snapshots. Loads are lazy and memoized: each year's snapshot is parsed at
/// most once per resolver, including when the load fails.
pub struct IndexResolver {
    sources: HashMap<u16, SnapshotSource>,
    // None memoizes a failed load: the year stays NotIndexed for the life of
    // this resolver instead of re-parsing a broken file on every call.
    cache: Mutex<HashMap<u16, Option<Arc<YearSnapshot>>>>,
    session: AtomicU64,
}

impl IndexResolver {
    pub fn new(sources: HashMap<u16, SnapshotSource>) -> Self {
        Self {
            sources,
            cache: Mutex::new(HashMap::new()),
            session: AtomicU64::new(0),
        }
    }

    /// Years with a registered snapshot source, unsorted.
    pub fn registered_years(&self) -> Vec<u16> {
        self.sources.keys().copied().collect()
    }

    /// Starts a new resolution session, invalidating all earlier tokens.
    pub fn begin_session(&self) -> SessionToken {
        SessionToken(self.session.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, token: SessionToken) -> bool {
        self.session.load(Ordering::SeqCst) == token.0
    }

    /// Returns the deduplicated, classification-filtered filings for the
    /// company and year. Lookup order is the 5-character code variant first,
    /// then the 4-character code; results keep accumulation order.
    pub async fn resolve(
        &self,
        company: &Company,
        year: u16,
        include_amendments: bool,
    ) -> Resolution {
        let Some(snapshot) = self.load_memoized(year).await else {
            return Resolution::NotIndexed;
        };

        let mut merged: Vec<Filing> = Vec::new();
        for code in company.lookup_codes() {
            merged.extend_from_slice(snapshot.filings_for_code(&code));
        }

        let filings = dedup_by_doc_id(merged)
            .into_iter()
            .filter(|f| is_annual_report(f, include_amendments))
            .collect();

        Resolution::Indexed(filings)
    }

    /// Session-aware resolve for "latest request wins": the result of a
    /// resolution begun under a superseded token is discarded (`None`),
    /// never applied and never an error.
    pub async fn resolve_in_session(
        &self,
        token: SessionToken,
        company: &Company,
        year: u16,
        include_amendments: bool,
    ) -> Option<Resolution> {
        let resolution = self.resolve(company, year, include_amendments).await;
        if !self.is_current(token) {
            tracing::debug!("Discarding stale resolution for {} (session superseded)", year);
            return None;
        }
        Some(resolution)
    }

    /// Loads a year's snapshot at most once. The cache lock is held across
    /// the load, so a year is never loaded twice concurrently; loads for
    /// distinct years serialize on the same lock.
    async fn load_memoized(&self, year: u16) -> Option<Arc<YearSnapshot>> {
        let source = self.sources.get(&year)?;

        let mut cache = self.cache.lock().await;
        if let Some(entry) = cache.get(&year) {
            return entry.clone();
        }

        let loaded = match self.load_snapshot(source, year).await {
            Ok(snapshot) => Some(Arc::new(snapshot)),
            Err(e) => {
                // Degrade to "year not indexed" rather than surfacing the
                // parse failure to the caller.
                tracing::warn!("Snapshot for {} unreadable, treating as not indexed: {}", year, e);
                None
            }
        };
        cache.insert(year, loaded.clone());
        loaded
    }

    async fn load_snapshot(
        &self,
        source: &SnapshotSource,
        year: u16,
    ) -> Result<YearSnapshot, SnapshotError> {
        let json = source.read().await?;
        let snapshot = YearSnapshot::from_json(&json)?;
        tracing::debug!(
            "Loaded snapshot for {} ({} codes, generated {})",
            year,
            snapshot.by_sec_code.len(),
            snapshot.generated_at
        );
        Ok(snapshot)
    }
}
