//! Contact request types shared by the server, the store, and the client.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Shown to the visitor when the server accepts a request without a message.
pub const DEFAULT_CONFIRMATION: &str =
    "Thank you! Your request has been received. We will contact you shortly.";

/// Processing state of a contact request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Just submitted, nobody has looked at it yet.
    New,
    /// Someone is working on it.
    Processed,
    /// Done.
    Closed,
}

impl Status {
    /// All statuses in workflow order.
    pub const ALL: [Self; 3] = [Self::New, Self::Processed, Self::Closed];

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processed => "processed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Status`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}', expected one of: new, processed, closed")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// The agency's service lines a visitor can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Website development.
    Websites,
    /// CRM systems.
    Crm,
    /// Telegram bots.
    TelegramBots,
}

impl Service {
    /// All service lines.
    pub const ALL: [Self; 3] = [Self::Websites, Self::Crm, Self::TelegramBots];

    /// Wire name of the service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Websites => "websites",
            Self::Crm => "crm",
            Self::TelegramBots => "telegram_bots",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Websites => "Website development",
            Self::Crm => "CRM systems",
            Self::TelegramBots => "Telegram bots",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Service`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service '{0}', expected one of: websites, crm, telegram_bots")]
pub struct UnknownService(pub String);

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownService(s.to_owned()))
    }
}

/// Fields of the contact form, exactly as typed.
///
/// This is both the form's in-memory value and the JSON body of
/// `POST /api/contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// Optional service line. An empty string on the wire means "not chosen".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_service_as_none"
    )]
    pub service: Option<Service>,
}

fn empty_service_as_none<'de, D>(deserializer: D) -> Result<Option<Service>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Body of a `POST /api/contact` response.
///
/// `success` is required: a body without it is not a valid receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A stored contact request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub service: Option<Service>,
    pub status: Status,
    /// Free-text notes left by an admin.
    #[serde(default)]
    pub admin_notes: String,
    pub created_at: DateTime<Utc>,
    /// Time of the last admin update, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Admin change to a request: new status and, optionally, new notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: Status,
    /// `None` keeps the current notes.
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Request counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_requests: u64,
    pub new_requests: u64,
    pub processed_requests: u64,
    pub closed_requests: u64,
}

impl Stats {
    /// Count one more request with the given status.
    pub fn record(&mut self, status: Status) {
        self.total_requests += 1;
        match status {
            Status::New => self.new_requests += 1,
            Status::Processed => self.processed_requests += 1,
            Status::Closed => self.closed_requests += 1,
        }
    }
}

/// Filters and paging for a request listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub limit: u32,
    /// Only requests with this status.
    pub status: Option<Status>,
    /// Case-insensitive text matched against name, email and phone.
    pub search: Option<String>,
    /// Only requests created at or after this time.
    pub created_from: Option<DateTime<Utc>>,
    /// Only requests created at or before this time.
    pub created_to: Option<DateTime<Utc>>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            status: None,
            search: None,
            created_from: None,
            created_to: None,
        }
    }
}

impl ListQuery {
    /// Clamp page and limit into their valid ranges and drop a blank search.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.search = self
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self
    }

    /// Number of records skipped before this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        let skipped = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit);
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }
}

/// One page of a request listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPage {
    pub requests: Vec<Submission>,
    /// Number of requests matching the filters, across all pages.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("processed".parse::<Status>().unwrap(), Status::Processed);
        assert_eq!(" Closed ".parse::<Status>().unwrap(), Status::Closed);
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn empty_service_deserializes_as_none() {
        let fields: ContactFields = serde_json::from_str(
            r#"{"name":"a","email":"b","phone":"c","message":"d","service":""}"#,
        )
        .unwrap();
        assert_eq!(fields.service, None);

        let fields: ContactFields =
            serde_json::from_str(r#"{"name":"a","email":"b","phone":"c","message":"d"}"#)
                .unwrap();
        assert_eq!(fields.service, None);

        let fields: ContactFields = serde_json::from_str(
            r#"{"name":"a","email":"b","phone":"c","message":"d","service":"crm"}"#,
        )
        .unwrap();
        assert_eq!(fields.service, Some(Service::Crm));
    }

    #[test]
    fn unknown_service_is_rejected() {
        let result = serde_json::from_str::<ContactFields>(
            r#"{"name":"a","email":"b","phone":"c","message":"d","service":"catering"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn receipt_requires_success_flag() {
        let receipt: ContactReceipt =
            serde_json::from_str(r#"{"success":true,"message":"ok","id":"abc"}"#).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.id.as_deref(), Some("abc"));

        assert!(serde_json::from_str::<ContactReceipt>(r#"{"message":"ok"}"#).is_err());
    }

    #[test]
    fn list_query_is_clamped() {
        let query = ListQuery {
            page: 0,
            limit: 1_000,
            search: Some("   ".to_owned()),
            ..ListQuery::default()
        }
        .normalized();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.search, None);
        assert_eq!(query.offset(), 0);

        let query = ListQuery {
            page: 3,
            limit: 10,
            ..ListQuery::default()
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn stats_record_counts_each_status() {
        let mut stats = Stats::default();
        for status in [Status::New, Status::New, Status::Closed] {
            stats.record(status);
        }
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.new_requests, 2);
        assert_eq!(stats.processed_requests, 0);
        assert_eq!(stats.closed_requests, 1);
    }
}
