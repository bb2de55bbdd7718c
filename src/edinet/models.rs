// src/edinet/models.rs
use serde::{Deserialize, Serialize};

/// One regulatory submission as reported by the EDINET document list API.
/// Field names mirror the upstream JSON; the same shape is stored verbatim
/// in snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filing {
    /// Opaque, globally unique filing identifier. The dedup key: two records
    /// with the same docID are the same filing.
    #[serde(rename = "docID")]
    pub doc_id: String,

    /// Issuer's securities code as reported by the source (5-character form,
    /// e.g. "72030"). Absent for filers without a listed code.
    #[serde(rename = "secCode")]
    pub sec_code: Option<String>,

    /// Source-provided submission timestamp, e.g. "2024-06-28 09:00".
    /// The first token before a space is the calendar date.
    #[serde(rename = "submitDateTime")]
    pub submit_date_time: Option<String>,

    /// Free-text document description, e.g. "有価証券報告書－第120期".
    #[serde(rename = "docDescription")]
    pub doc_description: Option<String>,

    /// EDINET form code, e.g. "030000" for an annual securities report.
    #[serde(rename = "formCode")]
    pub form_code: Option<String>,
}

impl Filing {
    /// Calendar date portion of the submission timestamp, if present.
    pub fn submit_date(&self) -> Option<&str> {
        self.submit_date_time
            .as_deref()
            .and_then(|dt| dt.split_whitespace().next())
    }
}

/// Response envelope of the EDINET document list endpoint.
#[derive(Debug, Deserialize)]
pub struct DocumentListResponse {
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub results: Vec<Filing>,
}

/// EDINET reports its own status inside the body, independent of the HTTP
/// status ("200" on success).
#[derive(Debug, Deserialize)]
pub struct ResponseMetadata {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// A listed issuer from the company master list. Immutable input to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// 4-character securities code, e.g. "7203".
    pub code: String,
    /// Display name, e.g. "トヨタ自動車".
    pub name: String,
    /// Market segment label, e.g. "プライム".
    #[serde(default)]
    pub market: String,
}

impl Company {
    /// The regulator-reported 5-character code variant (4-character code with
    /// a trailing "0"), e.g. "7203" -> "72030".
    pub fn sec_code5(&self) -> String {
        format!("{}0", self.code)
    }

    /// Lookup codes in preference order: 5-character variant first, then the
    /// bare 4-character code.
    pub fn lookup_codes(&self) -> [String; 2] {
        [self.sec_code5(), self.code.clone()]
    }
}
