//! Log record representation shared by every handler.
//!
//! A [`LogRecord`] carries the message, its severity, the wall-clock
//! timestamp and the process/thread context it was created in, plus an
//! ordered set of typed additional fields. Records are built by the
//! [`Logger`](crate::logger::Logger) and handed to handlers by reference.

use std::fmt;
use std::thread;
use std::time::SystemTime;

use serde::Serialize;

use crate::level::Severity;
use crate::process_info::ProcessInfo;

/// Value stored in an additional field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalField {
    Str(String),
    Int(i64),
    Double(f64),
}

impl Default for AdditionalField {
    fn default() -> Self {
        Self::Str(String::new())
    }
}

impl fmt::Display for AdditionalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for AdditionalField {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for AdditionalField {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<f64> for AdditionalField {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<f32> for AdditionalField {
    fn from(value: f32) -> Self {
        Self::Double(f64::from(value))
    }
}

macro_rules! int_field {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AdditionalField {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

int_field!(i8, i16, i32, i64, u8, u16, u32);

/// Ordered collection of additional fields addressable by key.
///
/// Inserting a key that already exists replaces the value in place, so the
/// original insertion position is kept and the last write wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, AdditionalField)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AdditionalField>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Merge every entry of `other` into `self` using last-write-wins.
    pub fn extend_from(&mut self, other: &Fields) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&AdditionalField> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AdditionalField)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<AdditionalField>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

/// A single log event together with its producer context.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    /// The log message content.
    pub message: String,
    /// Time the record was created.
    pub timestamp: SystemTime,
    pub severity: Severity,
    /// ID of the producing process, `-1` when unknown.
    pub process_id: i32,
    pub process_name: String,
    pub host: String,
    /// Identifier of the thread that created the record.
    pub thread_id: String,
    /// Structured key-value pairs attached to the record.
    pub fields: Fields,
}

impl LogRecord {
    /// Construct a record stamped with the current time and thread.
    ///
    /// Process and host information is left empty; use
    /// [`LogRecord::with_process_info`] or build the record through a
    /// [`Logger`](crate::logger::Logger) to populate it.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: SystemTime::now(),
            severity,
            process_id: -1,
            process_name: String::new(),
            host: String::new(),
            thread_id: current_thread_id(),
            fields: Fields::new(),
        }
    }

    /// Fill process id, process name and host from `info`.
    pub fn with_process_info(mut self, info: &ProcessInfo) -> Self {
        self.process_id = info.process_id;
        self.process_name = info.process_name.clone();
        self.host = info.host.clone();
        self
    }

    /// Attach an additional field, replacing any earlier value for `key`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<AdditionalField>) -> Self {
        self.fields.insert(key, value);
        self
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<AdditionalField>) {
        self.fields.insert(key, value);
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Render the calling thread's identifier as a string.
pub(crate) fn current_thread_id() -> String {
    format!("{:?}", thread::current().id())
}
