//! Records stored by balai and the form payloads that create them.
//!
//! Stored JSON uses camelCase keys. Field aliases accept the Indonesian keys
//! written by earlier deployments of the site (`judul`, `isi`, `nama`, ...), so
//! their data files and form posts keep working.

use std::cmp::Reverse;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::slug::make_slug;

/// Status given to every new complaint.
pub const STATUS_NEW: &str = "new";

/// Category used when a complaint is submitted without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Status values offered in the admin dashboard. Any other text is accepted.
pub const SUGGESTED_STATUSES: &[&str] = &[STATUS_NEW, "diproses", "selesai", "ditolak"];

/// A published news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Unique identifier.
    pub id: String,
    /// Headline.
    #[serde(alias = "judul")]
    pub title: String,
    /// Article text.
    #[serde(alias = "isi")]
    pub body: String,
    /// Optional image URL or path.
    #[serde(
        default,
        alias = "gambar",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_ref: Option<String>,
    /// URL slug derived from the title. Not unique.
    pub slug: String,
    /// When the item was published.
    #[serde(default, skip_serializing_if = "Timestamp::is_missing")]
    pub created_at: Timestamp,
}

/// A citizen complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    /// Unique identifier.
    pub id: String,
    /// Name of the person complaining.
    #[serde(alias = "nama")]
    pub name: String,
    /// Optional phone number or e-mail.
    #[serde(
        default,
        alias = "kontak",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact: Option<String>,
    /// Complaint category.
    #[serde(alias = "kategori", default = "default_category")]
    pub category: String,
    /// Complaint text.
    #[serde(alias = "isi")]
    pub body: String,
    /// Triage status; `"new"` until an admin changes it.
    #[serde(default = "default_status")]
    pub status: String,
    /// When the complaint was submitted.
    #[serde(default, skip_serializing_if = "Timestamp::is_missing")]
    pub created_at: Timestamp,
    /// When the status was last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A stored record time.
///
/// Files written by hand or by older deployments may hold a value that is not
/// a date. It is kept verbatim, so rewriting the file preserves it, and it has
/// no place in date order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// A parsed instant.
    At(DateTime<Utc>),
    /// The stored JSON value, which is not a date.
    Unparsed(Value),
}

impl Timestamp {
    /// The instant, if the stored value is a date.
    #[must_use]
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(*at),
            Self::Unparsed(_) => None,
        }
    }

    /// Interpret a stored JSON value: RFC 3339 strings and epoch milliseconds.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let parsed = match &raw {
            Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|at| at.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        };
        parsed.map_or(Self::Unparsed(raw), Self::At)
    }

    fn is_missing(&self) -> bool {
        matches!(self, Self::Unparsed(Value::Null))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::Unparsed(Value::Null)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(at) => {
                serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::Unparsed(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Fields posted by the admin news form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsForm {
    /// Headline; required.
    #[serde(alias = "judul")]
    pub title: String,
    /// Article text; required.
    #[serde(alias = "isi")]
    pub body: String,
    /// Image URL or path; optional.
    #[serde(alias = "gambar", alias = "image")]
    pub image_ref: String,
}

/// Fields posted by the public complaint form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComplaintForm {
    /// Complainant name; required.
    #[serde(alias = "nama")]
    pub name: String,
    /// Contact details; optional.
    #[serde(alias = "kontak")]
    pub contact: String,
    /// Category; defaults to [`DEFAULT_CATEGORY`].
    #[serde(alias = "kategori")]
    pub category: String,
    /// Complaint text; required.
    #[serde(alias = "isi")]
    pub body: String,
}

/// Fields posted by the admin status form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    /// New status; blank keeps the current one.
    pub status: String,
}

/// Records that carry a creation timestamp.
pub trait Timestamped {
    /// When the record was created, if its stored time is a date.
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for NewsItem {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.instant()
    }
}

impl Timestamped for Complaint {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.instant()
    }
}

/// Sort records newest first.
///
/// Records with equal timestamps keep file order. Records whose time is not a
/// date go after all dated ones, also in file order.
pub fn sort_newest_first<T: Timestamped>(records: &mut [T]) {
    records.sort_by_key(|record| Reverse(record.created_at()));
}

/// Generate a fresh record identifier.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time at millisecond precision, the resolution stored on disk.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

impl NewsItem {
    /// Build a news item from the admin form, or `None` when the title or body
    /// is blank.
    #[must_use]
    pub fn from_form(form: NewsForm, created_at: DateTime<Utc>) -> Option<Self> {
        if is_blank(&form.title) || is_blank(&form.body) {
            return None;
        }
        Some(Self {
            id: new_id(),
            slug: make_slug(&form.title),
            title: form.title,
            body: form.body,
            image_ref: non_blank(form.image_ref),
            created_at: created_at.into(),
        })
    }

    /// The first `max_chars` characters of the body, with an ellipsis when cut.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        let body = self.body.trim();
        if body.chars().count() <= max_chars {
            return body.to_string();
        }
        let cut: String = body.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

impl Complaint {
    /// Build a complaint from the public form, or `None` when the name or body
    /// is blank.
    #[must_use]
    pub fn from_form(form: ComplaintForm, created_at: DateTime<Utc>) -> Option<Self> {
        if is_blank(&form.name) || is_blank(&form.body) {
            return None;
        }
        Some(Self {
            id: new_id(),
            name: form.name,
            contact: non_blank(form.contact),
            category: non_blank(form.category).unwrap_or_else(default_category),
            body: form.body,
            status: default_status(),
            created_at: created_at.into(),
            updated_at: None,
        })
    }

    /// Record a status change. A blank status keeps the current one, but the
    /// update time is refreshed either way.
    pub fn apply_status(&mut self, status: &str, updated_at: DateTime<Utc>) {
        let status = status.trim();
        if !status.is_empty() {
            self.status = status.to_string();
        }
        self.updated_at = Some(updated_at.into());
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_status() -> String {
    STATUS_NEW.to_string()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: String) -> Option<String> {
    if is_blank(&value) {
        None
    } else {
        Some(value)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(non_blank))
}
