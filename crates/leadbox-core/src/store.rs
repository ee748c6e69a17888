//! Request store for Leadbox.
//!
//! Contact requests are stored as JSON at `requests/<id>` in the storage
//! backend. Creation and updates go through a single write lock, so a
//! read-modify-write update never loses a concurrent change.
//!
//! Listing loads every request and filters in memory: one agency's inbox
//! is small enough that a secondary index would cost more than it saves.

use std::sync::Arc;

use chrono::Utc;
use leadbox_storage::StorageBackend;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::phone;
use crate::submission::{ListQuery, RequestPage, Stats, Status, StatusUpdate, Submission};
use crate::validate::ValidContact;

/// Storage prefix for request entries.
const REQUEST_PREFIX: &str = "requests/";

/// Persisted collection of contact requests.
pub struct RequestStore {
    storage: Arc<dyn StorageBackend>,
    write_lock: Mutex<()>,
}

impl RequestStore {
    /// Create a store on top of the given backend.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Persist a new request with status `new`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn create(&self, contact: ValidContact) -> Result<Submission, StoreError> {
        let _guard = self.write_lock.lock().await;

        let id = self.fresh_id().await?;
        let submission = Submission {
            id,
            name: contact.name().to_owned(),
            email: contact.email().to_owned(),
            phone: contact.phone().to_owned(),
            message: contact.message().to_owned(),
            service: contact.service(),
            status: Status::New,
            admin_notes: String::new(),
            created_at: Utc::now(),
            updated_at: None,
        };

        self.write(&submission).await?;

        info!(
            request_id = %submission.id,
            service = ?submission.service,
            "contact request created"
        );

        Ok(submission)
    }

    /// Fetch a request by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no request has this id.
    /// - [`StoreError::Storage`] if the backend fails.
    pub async fn get(&self, id: &str) -> Result<Submission, StoreError> {
        let data = self
            .storage
            .get(&key(id))
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_owned() })?;

        decode(&data)
    }

    /// Set a request's status and, if given, its admin notes.
    ///
    /// Nothing else on the request changes. An unknown id leaves the store
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no request has this id.
    /// - [`StoreError::Storage`] if the backend fails.
    pub async fn update(&self, id: &str, update: StatusUpdate) -> Result<Submission, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut submission = self.get(id).await?;
        let previous = submission.status;

        submission.status = update.status;
        if let Some(notes) = update.admin_notes {
            submission.admin_notes = notes;
        }
        submission.updated_at = Some(Utc::now());

        self.write(&submission).await?;

        info!(
            request_id = %id,
            from = %previous,
            to = %submission.status,
            "contact request updated"
        );

        Ok(submission)
    }

    /// List requests newest first, filtered and paged by `query`.
    ///
    /// `total` counts every request that matches the filters, not just the
    /// ones on the returned page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn list(&self, query: ListQuery) -> Result<RequestPage, StoreError> {
        let query = query.normalized();
        let mut matching: Vec<Submission> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|s| matches(s, &query))
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let limit = query.limit as usize;
        let requests = matching
            .into_iter()
            .skip(query.offset())
            .take(limit)
            .collect();

        Ok(RequestPage {
            requests,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    /// Count requests per status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn stats(&self) -> Result<Stats, StoreError> {
        let mut stats = Stats::default();
        for submission in self.load_all().await? {
            stats.record(submission.status);
        }
        Ok(stats)
    }

    async fn fresh_id(&self) -> Result<String, StoreError> {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.storage.exists(&key(&id)).await? {
                return Ok(id);
            }
        }
    }

    async fn write(&self, submission: &Submission) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(submission).map_err(|e| StoreError::Serialization {
            reason: e.to_string(),
        })?;
        self.storage.put(&key(&submission.id), &bytes).await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Submission>, StoreError> {
        let keys = self.storage.list(REQUEST_PREFIX).await?;
        let mut submissions = Vec::with_capacity(keys.len());

        for key in &keys {
            let Some(data) = self.storage.get(key).await? else {
                continue;
            };
            match decode(&data) {
                Ok(submission) => submissions.push(submission),
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable request"),
            }
        }

        Ok(submissions)
    }
}

impl std::fmt::Debug for RequestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestStore").finish_non_exhaustive()
    }
}

fn key(id: &str) -> String {
    format!("{REQUEST_PREFIX}{id}")
}

fn decode(data: &[u8]) -> Result<Submission, StoreError> {
    serde_json::from_slice(data).map_err(|e| StoreError::Serialization {
        reason: e.to_string(),
    })
}

fn matches(submission: &Submission, query: &ListQuery) -> bool {
    if query.status.is_some_and(|status| submission.status != status) {
        return false;
    }
    if query
        .created_from
        .is_some_and(|from| submission.created_at < from)
    {
        return false;
    }
    if query.created_to.is_some_and(|to| submission.created_at > to) {
        return false;
    }
    query
        .search
        .as_deref()
        .is_none_or(|needle| matches_search(submission, needle))
}

/// Text search over name, email and phone.
///
/// A needle made only of phone characters also matches on digits, so
/// `901234` finds `+998 90 123 45 67`.
fn matches_search(submission: &Submission, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    if submission.name.to_lowercase().contains(&needle)
        || submission.email.to_lowercase().contains(&needle)
        || submission.phone.contains(&needle)
    {
        return true;
    }

    let looks_like_phone = needle
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    let needle_digits = phone::digits(&needle);
    looks_like_phone
        && !needle_digits.is_empty()
        && phone::digits(&submission.phone).contains(&needle_digits)
}
