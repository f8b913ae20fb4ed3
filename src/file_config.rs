//! INI based configuration for a [`Logger`].
//!
//! Recognised sections:
//!
//! ```ini
//! [logger]
//! min_severity = info
//!
//! [graylog]
//! host = graylog.example.com
//! port = 12201
//! queue_capacity = 100
//! max_queue_length = 100
//! retry_delay_ms = 10000
//!
//! [console]
//! target = stderr
//! capacity = 1024
//! ```
//!
//! Sections other than these are ignored. Inline comments are not supported.

use std::{fs, io, path::Path, str::FromStr};

use ini::{Ini, Properties};
use thiserror::Error;

use crate::{
    handlers::{
        GraylogHandlerBuilder, HandlerBuildError, HandlerBuilderTrait, StreamHandlerBuilder,
    },
    level::Severity,
    logger::Logger,
};

/// Errors raised while loading or applying a logging configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid INI document: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("invalid value {value:?} for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
    #[error(transparent)]
    Build(#[from] HandlerBuildError),
}

/// Parsed logging configuration ready to be installed on a [`Logger`].
#[derive(Clone, Debug, Default)]
pub struct LoggingConfig {
    pub min_severity: Option<Severity>,
    pub graylog: Option<GraylogHandlerBuilder>,
    pub console: Option<StreamHandlerBuilder>,
}

fn parse_value<T: FromStr>(
    section: &str,
    props: &Properties,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = props.get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            section: section.into(),
            key: key.into(),
            value: raw.into(),
        })
}

impl LoggingConfig {
    /// Parse a configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        let mut config = Self::default();
        if let Some(props) = ini.section(Some("logger")) {
            config.min_severity = parse_value("logger", props, "min_severity")?;
        }
        if let Some(props) = ini.section(Some("graylog")) {
            config.graylog = Some(Self::graylog_section(props)?);
        }
        if let Some(props) = ini.section(Some("console")) {
            config.console = Some(Self::console_section(props)?);
        }
        Ok(config)
    }

    /// Read and parse the INI file at `path`.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ini_str(&text)
    }

    fn graylog_section(props: &Properties) -> Result<GraylogHandlerBuilder, ConfigError> {
        let mut builder = GraylogHandlerBuilder::new();
        if let Some(host) = props.get("host") {
            builder = builder.with_host(host.trim());
        }
        if let Some(port) = parse_value("graylog", props, "port")? {
            builder = builder.with_port(port);
        }
        if let Some(capacity) = parse_value("graylog", props, "queue_capacity")? {
            builder = builder.with_queue_capacity(capacity);
        }
        if let Some(length) = parse_value("graylog", props, "max_queue_length")? {
            builder = builder.with_max_queue_length(length);
        }
        if let Some(delay) = parse_value("graylog", props, "retry_delay_ms")? {
            builder = builder.with_retry_delay_ms(delay);
        }
        builder.build_config()?;
        Ok(builder)
    }

    fn console_section(props: &Properties) -> Result<StreamHandlerBuilder, ConfigError> {
        let mut builder = match props.get("target").map(str::trim) {
            None | Some("stderr") => StreamHandlerBuilder::stderr(),
            Some("stdout") => StreamHandlerBuilder::stdout(),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    section: "console".into(),
                    key: "target".into(),
                    value: other.into(),
                });
            }
        };
        if let Some(capacity) = parse_value("console", props, "capacity")? {
            builder = builder.with_capacity(capacity);
        }
        Ok(builder)
    }

    /// Build the configured handlers, register them on `logger` and apply
    /// the minimum severity.
    ///
    /// Nothing is registered if any handler fails to build.
    pub fn install(&self, logger: &Logger) -> Result<(), ConfigError> {
        let mut handlers = Vec::new();
        if let Some(builder) = &self.console {
            handlers.push(builder.build()?);
        }
        if let Some(builder) = &self.graylog {
            handlers.push(builder.build()?);
        }
        for handler in handlers {
            logger.add_handler(handler);
        }
        if let Some(severity) = self.min_severity {
            logger.set_min_severity(severity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::stream_builder::StreamTarget;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = "\
[logger]
min_severity = warning

[graylog]
host = graylog.example.com
port = 2526
queue_capacity = 50
max_queue_length = 40
retry_delay_ms = 500

[console]
target = stdout
capacity = 16

[unrelated]
key = value
";

    #[rstest]
    fn parses_all_sections() {
        let config = LoggingConfig::from_ini_str(FULL).expect("valid config");
        assert_eq!(config.min_severity, Some(Severity::Warning));
        let graylog = config
            .graylog
            .expect("graylog section")
            .build_config()
            .expect("valid graylog config");
        assert_eq!(graylog.connection.host, "graylog.example.com");
        assert_eq!(graylog.connection.port, 2526);
        assert_eq!(graylog.connection.queue_capacity, 50);
        assert_eq!(graylog.max_queue_length, 40);
        assert_eq!(
            graylog.connection.retry_delay,
            std::time::Duration::from_millis(500)
        );
        assert_eq!(config.console.expect("console").target(), StreamTarget::Stdout);
    }

    #[rstest]
    #[case::severity("[logger]\nmin_severity = loud\n", "min_severity")]
    #[case::port("[graylog]\nhost = h\nport = 70000\n", "port")]
    #[case::target("[console]\ntarget = printer\n", "target")]
    fn reports_invalid_values(#[case] text: &str, #[case] expected_key: &str) {
        let err = LoggingConfig::from_ini_str(text).expect_err("invalid value");
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == expected_key));
    }

    #[rstest]
    fn graylog_section_requires_host() {
        let err = LoggingConfig::from_ini_str("[graylog]\nport = 12201\n").expect_err("no host");
        assert!(matches!(err, ConfigError::Build(HandlerBuildError::InvalidConfig(_))));
    }

    #[rstest]
    fn empty_document_configures_nothing() {
        let config = LoggingConfig::from_ini_str("").expect("empty config");
        assert!(config.min_severity.is_none());
        assert!(config.graylog.is_none());
        assert!(config.console.is_none());
    }

    #[rstest]
    fn loads_from_file_and_installs() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "[logger]\nmin_severity = 3\n\n[console]\ntarget = stderr\n")
            .expect("write config");
        let config = LoggingConfig::from_ini_file(file.path()).expect("valid file");

        let logger = Logger::new();
        config.install(&logger).expect("install");
        assert_eq!(logger.min_severity(), Severity::Error);
        assert_eq!(logger.handlers().len(), 1);
    }

    #[rstest]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = LoggingConfig::from_ini_file(dir.path().join("absent.ini"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
