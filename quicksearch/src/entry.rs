//! Entry store: the records being searched and the hierarchy that holds them.
//!
//! The search core only reads entries. It reaches them through
//! [`EntrySource`], which yields a lazy, restartable traversal of the whole
//! hierarchy in its natural order. [`Group`] and [`Database`] are the default
//! implementations, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

use crate::errors::{Result, SearchError};

pub const TITLE_FIELD: &str = "Title";
pub const USER_NAME_FIELD: &str = "UserName";
pub const PASSWORD_FIELD: &str = "Password";
pub const URL_FIELD: &str = "URL";
pub const NOTES_FIELD: &str = "Notes";

const STANDARD_FIELDS: [&str; 5] = [
    TITLE_FIELD,
    USER_NAME_FIELD,
    PASSWORD_FIELD,
    URL_FIELD,
    NOTES_FIELD,
];

/// Returns true for the five built-in string fields
pub fn is_standard_field(name: &str) -> bool {
    STANDARD_FIELDS.contains(&name)
}

/// An RGB color override for a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Timestamps carried by an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTimes {
    #[serde(with = "rfc3339")]
    pub creation: SystemTime,
    #[serde(with = "rfc3339")]
    pub last_access: SystemTime,
    #[serde(with = "rfc3339")]
    pub last_modification: SystemTime,
    /// `None` means the entry never expires
    #[serde(default, with = "rfc3339_opt")]
    pub expiry: Option<SystemTime>,
}

impl Default for EntryTimes {
    fn default() -> Self {
        Self {
            creation: SystemTime::UNIX_EPOCH,
            last_access: SystemTime::UNIX_EPOCH,
            last_modification: SystemTime::UNIX_EPOCH,
            expiry: None,
        }
    }
}

/// A single record in the store.
///
/// String fields are keyed by name; the standard ones use the `*_FIELD`
/// constants and anything else is a custom field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub uuid: String,
    #[serde(default)]
    pub strings: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Index into the standard icon set
    #[serde(default)]
    pub icon_id: usize,
    /// Identity of a custom icon, if the entry uses one
    #[serde(default)]
    pub custom_icon: Option<String>,
    #[serde(default)]
    pub foreground: Option<Color>,
    #[serde(default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub times: EntryTimes,
    /// Attachment names
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub attachment_bytes: u64,
    #[serde(default)]
    pub override_url: String,
    #[serde(default)]
    pub history_count: usize,
}

impl Entry {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            strings: BTreeMap::new(),
            tags: Vec::new(),
            icon_id: 0,
            custom_icon: None,
            foreground: None,
            background: None,
            times: EntryTimes::default(),
            attachments: Vec::new(),
            attachment_bytes: 0,
            override_url: String::new(),
            history_count: 0,
        }
    }

    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(name.into(), value.into());
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_string(TITLE_FIELD, title)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Reads a string field, empty if absent
    pub fn get(&self, field: &str) -> &str {
        self.strings.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.get(TITLE_FIELD)
    }

    /// Custom (non-standard) string fields in name order
    pub fn custom_strings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.strings
            .iter()
            .filter(|(name, _)| !is_standard_field(name))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn expires(&self) -> bool {
        self.times.expiry.is_some()
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.times.expiry.is_some_and(|expiry| expiry <= now)
    }

    /// Approximate storage footprint in bytes
    pub fn size(&self) -> u64 {
        let strings: usize = self
            .strings
            .iter()
            .map(|(name, value)| name.len() + value.len())
            .sum();
        let tags: usize = self.tags.iter().map(String::len).sum();
        (strings + tags + self.override_url.len()) as u64 + self.attachment_bytes
    }
}

/// Source of the full entry collection for base scans
pub trait EntrySource: Send + Sync {
    /// Traverses every entry in natural order. Each call starts over.
    fn entries(&self) -> Box<dyn Iterator<Item = &Arc<Entry>> + '_>;
}

/// A node in the hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Arc<Entry>>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entries.push(Arc::new(entry));
        self
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// Pre-order traversal: a group's own entries, then each child group
    pub fn iter_entries(&self) -> GroupEntries<'_> {
        GroupEntries {
            current: self.entries.iter(),
            pending: self.groups.iter().rev().collect(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len() + self.groups.iter().map(Group::entry_count).sum::<usize>()
    }
}

impl EntrySource for Group {
    fn entries(&self) -> Box<dyn Iterator<Item = &Arc<Entry>> + '_> {
        Box::new(self.iter_entries())
    }
}

/// Lazy iterator over every entry below a group
pub struct GroupEntries<'a> {
    current: std::slice::Iter<'a, Arc<Entry>>,
    pending: Vec<&'a Group>,
}

impl<'a> Iterator for GroupEntries<'a> {
    type Item = &'a Arc<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(entry);
            }
            let group = self.pending.pop()?;
            self.current = group.entries.iter();
            self.pending.extend(group.groups.iter().rev());
        }
    }
}

/// A loaded entry collection with its custom icon table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub root: Group,
    /// Custom icon identities; position determines the icon index
    #[serde(default)]
    pub custom_icons: Vec<String>,
}

impl Database {
    pub fn new(root: Group) -> Self {
        Self {
            root,
            custom_icons: Vec::new(),
        }
    }

    /// Loads a database from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SearchError::database_not_found(path));
        }
        let data = std::fs::read(path)?;
        let database: Database = serde_json::from_slice(&data)?;
        debug!(
            "Loaded {} entries from {}",
            database.root.entry_count(),
            path.display()
        );
        Ok(database)
    }
}

impl EntrySource for Database {
    fn entries(&self) -> Box<dyn Iterator<Item = &Arc<Entry>> + '_> {
        self.root.entries()
    }
}

mod rfc3339 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::SystemTime;

    pub fn serialize<S: Serializer>(time: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_rfc3339_seconds(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SystemTime, D::Error> {
        let text = String::deserialize(d)?;
        humantime::parse_rfc3339_weak(&text).map_err(serde::de::Error::custom)
    }
}

mod rfc3339_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::SystemTime;

    pub fn serialize<S: Serializer>(time: &Option<SystemTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => s.collect_str(&humantime::format_rfc3339_seconds(*time)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SystemTime>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|text| humantime::parse_rfc3339_weak(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
