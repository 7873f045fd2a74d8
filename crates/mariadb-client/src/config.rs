//! Client configuration.

use mariadb_protocol::CharsetId;
use mariadb_types::DecodeOptions;

/// Default `max_allowed_packet` of the server (16 MiB).
pub const DEFAULT_MAX_ALLOWED_PACKET: usize = 16 * 1024 * 1024;

/// Default number of cached prepared statements.
pub const DEFAULT_PREP_STMT_CACHE_SIZE: usize = 256;

/// Configuration for a connection's statement execution.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection character set, used to decode text columns.
    pub charset: CharsetId,
    /// Largest command payload the server accepts.
    pub max_allowed_packet: usize,
    /// Number of prepared statements kept per connection; 0 disables caching.
    pub prep_stmt_cache_size: usize,
    /// Longest string or blob value returned intact; longer values are
    /// returned as a truncation indicator.
    pub max_field_length: Option<usize>,
    /// Send `executemany` as `COM_STMT_BULK_EXECUTE`.
    pub bulk: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            charset: CharsetId::UTF8MB4,
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
            prep_stmt_cache_size: DEFAULT_PREP_STMT_CACHE_SIZE,
            max_field_length: None,
            bulk: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value;key=value` option string.
    ///
    /// Keys are case-insensitive. Unknown keys are ignored.
    pub fn from_connection_string(conn_str: &str) -> Result<Self, crate::error::Error> {
        let mut config = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| crate::error::Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "charset" | "character set" => {
                    config.charset = parse_charset(value).ok_or_else(|| {
                        crate::error::Error::Config(format!("unknown charset: {value}"))
                    })?;
                }
                "max_allowed_packet" | "max allowed packet" => {
                    config.max_allowed_packet = value.parse().map_err(|_| {
                        crate::error::Error::Config(format!("invalid packet size: {value}"))
                    })?;
                }
                "prep_stmt_cache_size" | "prepared statement cache size" => {
                    config.prep_stmt_cache_size = value.parse().map_err(|_| {
                        crate::error::Error::Config(format!("invalid cache size: {value}"))
                    })?;
                }
                "max_field_length" | "max field length" => {
                    let limit: usize = value.parse().map_err(|_| {
                        crate::error::Error::Config(format!("invalid field length: {value}"))
                    })?;
                    // 0 means unlimited
                    config.max_field_length = (limit > 0).then_some(limit);
                }
                "bulk" => {
                    config.bulk = parse_bool(value).ok_or_else(|| {
                        crate::error::Error::Config(format!("invalid boolean: {value}"))
                    })?;
                }
                _ => {
                    tracing::debug!(
                        key = key,
                        value = value,
                        "ignoring unknown connection string option"
                    );
                }
            }
        }

        Ok(config)
    }

    /// Set the connection character set.
    #[must_use]
    pub fn charset(mut self, charset: CharsetId) -> Self {
        self.charset = charset;
        self
    }

    /// Set the maximum command payload size.
    #[must_use]
    pub fn max_allowed_packet(mut self, size: usize) -> Self {
        self.max_allowed_packet = size;
        self
    }

    /// Set the prepared statement cache size.
    #[must_use]
    pub fn prep_stmt_cache_size(mut self, size: usize) -> Self {
        self.prep_stmt_cache_size = size;
        self
    }

    /// Set the truncation limit for fetched values.
    #[must_use]
    pub fn max_field_length(mut self, limit: Option<usize>) -> Self {
        self.max_field_length = limit;
        self
    }

    /// Enable or disable bulk execution.
    #[must_use]
    pub fn bulk(mut self, enabled: bool) -> Self {
        self.bulk = enabled;
        self
    }

    /// Options for decoding result rows.
    #[must_use]
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::new(self.charset).with_max_field_length(self.max_field_length)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") || value == "0"
    {
        Some(false)
    } else {
        None
    }
}

fn parse_charset(value: &str) -> Option<CharsetId> {
    if let Ok(id) = value.parse::<u16>() {
        return Some(CharsetId(id));
    }
    match value.to_lowercase().as_str() {
        "utf8mb4" => Some(CharsetId::UTF8MB4),
        "utf8" | "utf8mb3" => Some(CharsetId::UTF8),
        "latin1" => Some(CharsetId::LATIN1),
        "binary" => Some(CharsetId::BINARY),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.charset, CharsetId::UTF8MB4);
        assert_eq!(config.max_allowed_packet, 16 * 1024 * 1024);
        assert_eq!(config.prep_stmt_cache_size, 256);
        assert_eq!(config.max_field_length, None);
        assert!(config.bulk);
    }

    #[test]
    fn test_connection_string_parsing() {
        let config = Config::from_connection_string(
            "charset=latin1;MAX_ALLOWED_PACKET=1024;prep_stmt_cache_size=0;bulk=no;max_field_length=10",
        )
        .unwrap();

        assert_eq!(config.charset, CharsetId::LATIN1);
        assert_eq!(config.max_allowed_packet, 1024);
        assert_eq!(config.prep_stmt_cache_size, 0);
        assert!(!config.bulk);
        assert_eq!(config.max_field_length, Some(10));
    }

    #[test]
    fn test_connection_string_numeric_charset() {
        let config = Config::from_connection_string("charset=224;").unwrap();
        assert_eq!(config.charset, CharsetId(224));
    }

    #[test]
    fn test_connection_string_ignores_unknown() {
        let config = Config::from_connection_string("host=localhost;bulk=1").unwrap();
        assert!(config.bulk);
    }

    #[test]
    fn test_connection_string_errors() {
        assert!(Config::from_connection_string("bulk").is_err());
        assert!(Config::from_connection_string("bulk=maybe").is_err());
        assert!(Config::from_connection_string("charset=klingon").is_err());
        assert!(Config::from_connection_string("max_allowed_packet=-1").is_err());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .charset(CharsetId::UTF8)
            .max_allowed_packet(4096)
            .prep_stmt_cache_size(8)
            .max_field_length(Some(100))
            .bulk(false);

        assert_eq!(config.charset, CharsetId::UTF8);
        assert_eq!(config.max_allowed_packet, 4096);
        assert_eq!(config.prep_stmt_cache_size, 8);
        assert!(!config.bulk);

        let options = config.decode_options();
        assert_eq!(options.charset, CharsetId::UTF8);
        assert_eq!(options.max_field_length, Some(100));
    }
}
