//! Process-level defaults stamped onto every record.

use std::{env, path::Path, process};

use once_cell::sync::Lazy;

/// Identity of the running process as reported to the log server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub process_id: i32,
    pub process_name: String,
    pub host: String,
}

static CURRENT: Lazy<ProcessInfo> = Lazy::new(ProcessInfo::capture);

impl ProcessInfo {
    /// Return the lazily captured information for this process.
    pub fn current() -> &'static ProcessInfo {
        &CURRENT
    }

    fn capture() -> Self {
        Self {
            process_id: i32::try_from(process::id()).unwrap_or(-1),
            process_name: process_name(),
            host: host_name(),
        }
    }
}

fn process_name() -> String {
    env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| env::args().next())
        .unwrap_or_default()
}

fn host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            log::warn!("graylog_logger: unable to read host name: {err}");
            String::new()
        }
    }
}
