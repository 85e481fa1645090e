//! Credential entries and the in-memory vault payload.
//!
//! [`VaultPayload`] is the ordered collection that the codec serializes as
//! a JSON array. Entries only ever live inside a payload: they are created
//! by [`VaultPayload::add`], edited in place by [`VaultPayload::update`] and
//! removed by [`VaultPayload::remove`].

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::VaultError;

/// One stored credential.
///
/// `id` and `created_at` are assigned on creation and never change.
/// The secret and notes are wiped from memory when the entry is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    #[zeroize(skip)]
    id: String,
    pub title: String,
    pub username: String,
    pub secret: String,
    pub url: String,
    pub notes: String,
    #[zeroize(skip)]
    created_at: DateTime<Utc>,
}

impl CredentialEntry {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Case-insensitive substring match on title, username or url.
    fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.username, &self.url]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("secret", &"***")
            .field("url", &self.url)
            .field("notes", &"***")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields supplied when adding an entry.
#[derive(Clone, Default)]
pub struct NewEntry {
    pub title: String,
    pub username: String,
    pub secret: String,
    pub url: String,
    pub notes: String,
}

impl NewEntry {
    /// An entry with just the two required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            secret: secret.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for NewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEntry")
            .field("title", &self.title)
            .field("secret", &"***")
            .finish_non_exhaustive()
    }
}

/// Partial edit: `None` leaves the field unchanged.
#[derive(Clone, Default)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

impl fmt::Debug for EntryUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryUpdate")
            .field("title", &self.title)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// Ordered collection of entries; the plaintext form of the vault.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultPayload {
    entries: Vec<CredentialEntry>,
}

impl VaultPayload {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CredentialEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Append a new entry with a fresh id and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidEntry`] if the title or secret is empty.
    pub fn add(&mut self, new: NewEntry) -> Result<&CredentialEntry, VaultError> {
        require_non_empty("title", &new.title)?;
        require_non_empty("secret", &new.secret)?;

        let entry = CredentialEntry {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            username: new.username.clone(),
            secret: new.secret.clone(),
            url: new.url.clone(),
            notes: new.notes.clone(),
            created_at: Utc::now(),
        };
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or_else(|| VaultError::InvalidEntry("entry was not stored".into()))
    }

    /// Apply `update` to the entry `id` in place, keeping its id and
    /// creation time.
    ///
    /// # Errors
    ///
    /// - [`VaultError::EntryNotFound`] if no entry has this id
    /// - [`VaultError::InvalidEntry`] if the update blanks the title or secret
    pub fn update(&mut self, id: &str, update: &EntryUpdate) -> Result<&CredentialEntry, VaultError> {
        if let Some(title) = &update.title {
            require_non_empty("title", title)?;
        }
        if let Some(secret) = &update.secret {
            require_non_empty("secret", secret)?;
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))?;

        apply(&mut entry.title, update.title.as_ref());
        apply(&mut entry.username, update.username.as_ref());
        apply(&mut entry.secret, update.secret.as_ref());
        apply(&mut entry.url, update.url.as_ref());
        apply(&mut entry.notes, update.notes.as_ref());
        Ok(entry)
    }

    /// Remove and return the entry `id`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::EntryNotFound`] if no entry has this id.
    pub fn remove(&mut self, id: &str) -> Result<CredentialEntry, VaultError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))?;
        Ok(self.entries.remove(index))
    }

    /// Entries whose title, username or url contains `term`, ignoring case.
    /// An empty term matches every entry.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&CredentialEntry> {
        let needle = term.to_lowercase();
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    /// First id that occurs more than once, if any.
    pub(crate) fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .map(CredentialEntry::id)
            .find(|id| !seen.insert(*id))
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), VaultError> {
    if value.trim().is_empty() {
        return Err(VaultError::InvalidEntry(format!("{field} must not be empty")));
    }
    Ok(())
}

fn apply(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.zeroize();
        field.clone_from(value);
    }
}
