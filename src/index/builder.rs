// src/index/builder.rs
use crate::edinet::classify::{dedup_by_doc_id, is_annual_report};
use crate::edinet::client::EdinetClient;
use crate::edinet::models::{Company, Filing};
use crate::index::snapshot::YearSnapshot;
use crate::storage::SnapshotStore;
use crate::utils::dates::{dates_between_inclusive, WindowTemplate};
use crate::utils::error::EdinetError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;

/// Date window for one build: either absolute dates or a month-day template
/// instantiated per year.
#[derive(Debug, Clone)]
pub enum WindowSpec {
    Absolute { from: String, to: String },
    Template(WindowTemplate),
}

impl WindowSpec {
    /// The absolute `[from, to]` range for one year. A template whose
    /// month-day does not exist in that year enumerates no dates.
    pub fn for_year(&self, year: u16) -> Option<(String, String)> {
        match self {
            WindowSpec::Absolute { from, to } => Some((from.clone(), to.clone())),
            WindowSpec::Template(template) => template.apply(year),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Regenerate a year even if its snapshot file already exists.
    pub force: bool,
    /// Abandon remaining years after the first year-level failure.
    pub stop_on_failure: bool,
}

/// Outcome of a multi-year build run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<u16>,
    pub skipped: Vec<u16>,
    pub failed: Vec<(u16, String)>,
}

impl BuildReport {
    pub fn any_failed(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Builds per-year snapshots by scanning the document list API day by day.
pub struct IndexBuilder<'a> {
    client: &'a EdinetClient,
    codes_of_interest: HashSet<String>,
}

impl<'a> IndexBuilder<'a> {
    /// Codes of interest are derived from the company list in both the
    /// 4-character and the regulator-reported 5-character form.
    pub fn new(client: &'a EdinetClient, companies: &[Company]) -> Self {
        let mut codes_of_interest = HashSet::new();
        for company in companies {
            codes_of_interest.insert(company.code.clone());
            codes_of_interest.insert(company.sec_code5());
        }
        Self {
            client,
            codes_of_interest,
        }
    }

    /// Builds one year's snapshot over `[from, to]`. Exhausted retries on any
    /// single date abort the whole year.
    pub async fn build_year(
        &self,
        year: u16,
        from: &str,
        to: &str,
    ) -> Result<YearSnapshot, EdinetError> {
        build_year_from(year, from, to, &self.codes_of_interest, |date| {
            self.client.list_filings(date)
        })
        .await
    }

    /// Builds every requested year sequentially, skipping years that already
    /// have a snapshot unless forced. Year-level failures are recorded and,
    /// unless stop-on-failure is set, the run continues with the next year.
    pub async fn build_years(
        &self,
        store: &SnapshotStore,
        years: &[u16],
        window: &WindowSpec,
        options: &BuildOptions,
    ) -> BuildReport {
        let mut report = BuildReport::default();

        for &year in years {
            if store.exists(year) && !options.force {
                tracing::info!("Snapshot for {} already exists, skipping", year);
                report.skipped.push(year);
                continue;
            }

            // A window that does not exist in this year enumerates no dates
            // and yields an empty snapshot.
            let (from, to) = window.for_year(year).unwrap_or_default();
            tracing::info!("Building index for {} over [{}, {}]", year, from, to);

            let result = match self.build_year(year, &from, &to).await {
                Ok(snapshot) => store
                    .write(&snapshot, options.force)
                    .map(|path| tracing::info!("Built {} -> {}", year, path.display()))
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match result {
                Ok(()) => report.built.push(year),
                Err(error) => {
                    tracing::error!("Build for {} failed: {}", year, error);
                    report.failed.push((year, error));
                    if options.stop_on_failure {
                        tracing::warn!("Stopping on first failure, remaining years not built");
                        break;
                    }
                }
            }
        }

        report
    }
}

/// The core build loop over an injected per-date fetch, so the accumulation
/// logic is exercisable without a live upstream.
async fn build_year_from<F, Fut>(
    year: u16,
    from: &str,
    to: &str,
    codes_of_interest: &HashSet<String>,
    fetch: F,
) -> Result<YearSnapshot, EdinetError>
where
    F: Fn(NaiveDate) -> Fut,
    Fut: Future<Output = Result<Vec<Filing>, EdinetError>>,
{
    let dates = dates_between_inclusive(from, to);
    let mut by_sec_code: BTreeMap<String, Vec<Filing>> = BTreeMap::new();

    for date in dates {
        let filings = fetch(date).await?;
        for filing in filings {
            // Amendments are always captured into the snapshot; the resolver
            // applies the caller's include-amendments flag at read time.
            if !is_annual_report(&filing, true) {
                continue;
            }
            let Some(code) = filing.sec_code.clone() else {
                continue;
            };
            if !codes_of_interest.contains(&code) {
                continue;
            }
            by_sec_code.entry(code).or_default().push(filing);
        }
    }

    for filings in by_sec_code.values_mut() {
        let deduped = dedup_by_doc_id(std::mem::take(filings));
        *filings = deduped;
    }

    Ok(YearSnapshot::new(year, by_sec_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::snapshot::SNAPSHOT_VERSION;
    use std::collections::HashMap;
    use std::time::Duration;

    fn filing(doc_id: &str, sec_code: &str, description: &str, form_code: &str) -> Filing {
        Filing {
            doc_id: doc_id.to_string(),
            sec_code: Some(sec_code.to_string()),
            submit_date_time: Some("2024-06-28 09:00".to_string()),
            doc_description: Some(description.to_string()),
            form_code: Some(form_code.to_string()),
        }
    }

    fn fixture_fetch(
        by_date: HashMap<&'static str, Vec<Filing>>,
    ) -> impl Fn(NaiveDate) -> std::future::Ready<Result<Vec<Filing>, EdinetError>> {
        move |date: NaiveDate| {
            let key = date.format("%Y-%m-%d").to_string();
            std::future::ready(Ok(by_date.get(key.as_str()).cloned().unwrap_or_default()))
        }
    }

    #[tokio::test]
    async fn test_build_year_end_to_end() {
        let codes: HashSet<String> = ["7203".to_string(), "72030".to_string()].into();
        let target = filing("S100ABCD", "72030", "有価証券報告書", "030000");
        let mut by_date = HashMap::new();
        by_date.insert("2024-06-28", vec![target.clone()]);

        let snapshot = build_year_from(2024, "2024-06-01", "2024-07-31", &codes, fixture_fetch(by_date))
            .await
            .unwrap();

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.year, 2024);
        assert_eq!(snapshot.filings_for_code("72030"), &[target]);
        assert_eq!(snapshot.by_sec_code.len(), 1);
    }

    #[tokio::test]
    async fn test_build_discards_other_codes_and_non_reports() {
        let codes: HashSet<String> = ["72030".to_string()].into();
        let mut by_date = HashMap::new();
        by_date.insert(
            "2024-06-28",
            vec![
                filing("S100KEEP", "72030", "有価証券報告書", "030000"),
                // matching doc type, but not a code of interest
                filing("S100SKIP", "99990", "有価証券報告書", "030000"),
                // code of interest, but a quarterly report
                filing("S100QTRL", "72030", "四半期報告書", "043000"),
                // missing code entirely
                Filing {
                    sec_code: None,
                    ..filing("S100NONE", "x", "有価証券報告書", "030000")
                },
            ],
        );

        let snapshot = build_year_from(2024, "2024-06-28", "2024-06-28", &codes, fixture_fetch(by_date))
            .await
            .unwrap();

        let kept = snapshot.filings_for_code("72030");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].doc_id, "S100KEEP");
    }

    #[tokio::test]
    async fn test_build_captures_amendments_unconditionally() {
        let codes: HashSet<String> = ["72030".to_string()].into();
        let mut by_date = HashMap::new();
        by_date.insert(
            "2024-06-28",
            vec![filing("S100AMND", "72030", "訂正有価証券報告書", "030001")],
        );

        let snapshot = build_year_from(2024, "2024-06-28", "2024-06-28", &codes, fixture_fetch(by_date))
            .await
            .unwrap();

        assert_eq!(snapshot.filings_for_code("72030").len(), 1);
    }

    #[tokio::test]
    async fn test_build_dedups_across_dates_first_seen_wins() {
        let codes: HashSet<String> = ["72030".to_string()].into();
        let first = filing("S100DUPE", "72030", "有価証券報告書", "030000");
        let mut later = first.clone();
        later.submit_date_time = Some("2024-06-29 10:00".to_string());

        let mut by_date = HashMap::new();
        by_date.insert("2024-06-28", vec![first.clone()]);
        by_date.insert("2024-06-29", vec![later]);

        let snapshot = build_year_from(2024, "2024-06-28", "2024-06-29", &codes, fixture_fetch(by_date))
            .await
            .unwrap();

        assert_eq!(snapshot.filings_for_code("72030"), &[first]);
    }

    #[tokio::test]
    async fn test_build_invalid_range_yields_empty_snapshot() {
        let codes: HashSet<String> = ["72030".to_string()].into();
        let snapshot = build_year_from(2024, "2024-07-31", "2024-06-01", &codes, |_| {
            std::future::ready(Err(EdinetError::Api {
                status: 500,
                message: "must never be called".to_string(),
            }))
        })
        .await
        .unwrap();

        assert!(snapshot.by_sec_code.is_empty());
    }

    #[tokio::test]
    async fn test_build_date_failure_aborts_the_year() {
        let codes: HashSet<String> = ["72030".to_string()].into();
        let result = build_year_from(2024, "2024-06-28", "2024-06-28", &codes, |_| {
            std::future::ready(Err(EdinetError::RetriesExhausted {
                date: "2024-06-28".to_string(),
                attempts: 3,
                last_error: "boom".to_string(),
            }))
        })
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_years_skips_existing_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        store
            .write(&YearSnapshot::new(2024, BTreeMap::new()), false)
            .unwrap();

        let client = EdinetClient::new(None, Duration::from_millis(1), 1).unwrap();
        let builder = IndexBuilder::new(&client, &[]);
        let window = WindowSpec::Absolute {
            from: "2024-06-01".to_string(),
            to: "2024-06-02".to_string(),
        };

        let report = builder
            .build_years(&store, &[2024], &window, &BuildOptions::default())
            .await;
        assert_eq!(report.skipped, vec![2024]);
        assert!(report.built.is_empty());
        assert!(!report.any_failed());
    }

    #[tokio::test]
    async fn test_build_years_empty_window_builds_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();

        // Inverted absolute window: no dates enumerated, no upstream calls,
        // but a valid (empty) snapshot is still written.
        let client = EdinetClient::new(None, Duration::from_millis(1), 1).unwrap();
        let builder = IndexBuilder::new(&client, &[]);
        let window = WindowSpec::Absolute {
            from: "2024-07-31".to_string(),
            to: "2024-06-01".to_string(),
        };

        let report = builder
            .build_years(&store, &[2024], &window, &BuildOptions::default())
            .await;
        assert_eq!(report.built, vec![2024]);
        assert!(store.exists(2024));
    }
}
