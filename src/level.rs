//! Syslog-style severity levels attached to every log record.
//!
//! Lower numeric values are more severe. GELF transmits the numeric value in
//! its `level` field, so the discriminants are part of the wire contract.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Severity levels known by the logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    /// Also accepted as `Info` when parsing.
    Informational = 6,
    Debug = 7,
}

/// Error returned when a string or integer does not name a severity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid severity: {0}")]
pub struct ParseSeverityError(pub String);

impl Severity {
    /// Alias kept for callers used to the shorter name.
    pub const INFO: Severity = Severity::Informational;

    /// All levels ordered from most to least severe.
    pub const ALL: [Severity; 8] = [
        Severity::Emergency,
        Severity::Alert,
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Informational,
        Severity::Debug,
    ];

    /// Upper-case name used by text formatters.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Informational => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    /// Return `true` when a record at `self` passes a `minimum` threshold.
    pub fn is_enabled_for(self, minimum: Severity) -> bool {
        self <= minimum
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Notice
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for u8 {
    fn from(level: Severity) -> Self {
        level as u8
    }
}

impl From<Severity> for i32 {
    fn from(level: Severity) -> Self {
        i32::from(level as u8)
    }
}

impl TryFrom<i32> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: i32) -> Result<Self, ParseSeverityError> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| ParseSeverityError(value.to_string()))
    }
}

impl TryFrom<u8> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: u8) -> Result<Self, ParseSeverityError> {
        Self::try_from(i32::from(value))
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Self::try_from(value);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "EMERGENCY" | "EMERG" => Ok(Self::Emergency),
            "ALERT" => Ok(Self::Alert),
            "CRITICAL" | "CRIT" => Ok(Self::Critical),
            "ERROR" | "ERR" => Ok(Self::Error),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "NOTICE" => Ok(Self::Notice),
            "INFORMATIONAL" | "INFO" => Ok(Self::Informational),
            "DEBUG" => Ok(Self::Debug),
            _ => Err(ParseSeverityError(s.to_owned())),
        }
    }
}
