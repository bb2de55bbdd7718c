// src/edinet/classify.rs
use crate::edinet::models::Filing;

/// EDINET form code for an annual securities report (有価証券報告書).
pub const ANNUAL_REPORT_FORM_CODE: &str = "030000";
/// EDINET form code for an amended annual securities report (訂正有価証券報告書).
pub const AMENDED_REPORT_FORM_CODE: &str = "030001";

const ANNUAL_REPORT_MARKER: &str = "有価証券報告書";
const AMENDED_REPORT_MARKER: &str = "訂正有価証券報告書";

/// Classification of a filing that qualifies as an annual securities report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Original,
    Amendment,
}

/// Classifies a filing by description marker or form code. The amendment
/// marker contains the original marker as a substring, so it is checked
/// first.
pub fn classify(filing: &Filing) -> Option<ReportKind> {
    let description = filing.doc_description.as_deref().unwrap_or("");
    let form_code = filing.form_code.as_deref().unwrap_or("");

    if description.contains(AMENDED_REPORT_MARKER) || form_code == AMENDED_REPORT_FORM_CODE {
        return Some(ReportKind::Amendment);
    }
    if description.contains(ANNUAL_REPORT_MARKER) || form_code == ANNUAL_REPORT_FORM_CODE {
        return Some(ReportKind::Original);
    }
    None
}

/// The single source of truth for "is this filing relevant": an original
/// annual report always counts, an amendment only when the flag allows it.
pub fn is_annual_report(filing: &Filing, include_amendments: bool) -> bool {
    match classify(filing) {
        Some(ReportKind::Original) => true,
        Some(ReportKind::Amendment) => include_amendments,
        None => false,
    }
}

/// Deduplicates filings by docID, preserving the first-seen record for each
/// ID and the overall order.
pub fn dedup_by_doc_id(filings: Vec<Filing>) -> Vec<Filing> {
    let mut seen = std::collections::HashSet::new();
    filings
        .into_iter()
        .filter(|f| seen.insert(f.doc_id.clone()))
        .collect()
}
