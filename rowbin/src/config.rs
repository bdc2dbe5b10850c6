//! Decoder configuration.
use std::{borrow::Cow, env::var, fmt, sync::Arc};

use crate::mapper::{DefaultMapper, Mapper};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_MAX_TAIL: usize = 64 * 1024 * 1024;

/// Row-binary decoding config.
#[derive(Clone)]
pub struct Config {
    pub(crate) chunk_size: usize,
    pub(crate) max_tail: usize,
    pub(crate) mapper: Arc<dyn Mapper>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_tail: DEFAULT_MAX_TAIL,
            mapper: Arc::new(DefaultMapper),
        }
    }
}

impl Config {
    /// Retrieve configuration from environment variable.
    ///
    /// It reads:
    /// - `ROWBIN_CHUNK_SIZE`, read buffer size of reader backed byte source
    /// - `ROWBIN_MAX_TAIL`, maximum bytes of a single incomplete value
    ///
    /// Additionally, it also read `ROWBIN_CONFIG` in [`Config::parse`] format to
    /// provide missing value from previous variables before fallback to default
    /// value.
    ///
    /// Invalid value is ignored.
    pub fn from_env() -> Config {
        let config = var("ROWBIN_CONFIG").ok().and_then(|e|Config::parse(&e).ok());

        macro_rules! env {
            ($name:literal,$or:ident,$def:expr) => {
                match (var($name).ok().and_then(|e|Config::parse_size(&e).ok()),config.as_ref()) {
                    (Some(ok),_) => ok,
                    (None,Some(e)) => e.$or,
                    (None,None) => $def,
                }
            };
        }

        let chunk_size = env!("ROWBIN_CHUNK_SIZE",chunk_size,DEFAULT_CHUNK_SIZE);
        let max_tail = env!("ROWBIN_MAX_TAIL",max_tail,DEFAULT_MAX_TAIL);

        Self { chunk_size, max_tail, ..Default::default() }
    }

    /// Parse config from `key=value` pairs separated by `;`.
    ///
    /// Keys are `chunk_size` and `max_tail`, values are in
    /// [`Config::parse_size`] format.
    ///
    /// ```
    /// # use rowbin::Config;
    /// let config = Config::parse("chunk_size=8k;max_tail=16m").unwrap();
    /// assert_eq!(config.get_chunk_size(), 8 * 1024);
    /// ```
    pub fn parse(config: &str) -> Result<Config, ConfigError> {
        let mut me = Config::default();

        for pair in config.split(';').map(str::trim).filter(|e|!e.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConfigError { reason: format!("missing value of {pair:?}").into() })
            };
            let value = Config::parse_size(value.trim())?;
            match key.trim() {
                "chunk_size" => me = me.chunk_size(value),
                "max_tail" => me = me.max_tail(value),
                key => return Err(ConfigError { reason: format!("unknown key {key:?}").into() }),
            }
        }

        Ok(me)
    }

    /// Parse size in bytes, with optional `k` or `m` suffix.
    pub fn parse_size(size: &str) -> Result<usize, ConfigError> {
        let (digits, unit) = match size.as_bytes().last() {
            Some(b'k' | b'K') => (&size[..size.len() - 1], 1024),
            Some(b'm' | b'M') => (&size[..size.len() - 1], 1024 * 1024),
            _ => (size, 1),
        };

        let Ok(n) = digits.parse::<usize>() else {
            return Err(ConfigError { reason: format!("invalid size {size:?}").into() })
        };

        match n.checked_mul(unit) {
            Some(0) => Err(ConfigError { reason: "size cannot be zero".into() }),
            Some(n) => Ok(n),
            None => Err(ConfigError { reason: format!("size overflow {size:?}").into() }),
        }
    }

    /// Set read buffer size of reader backed byte source.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set maximum bytes buffered for a single incomplete value.
    ///
    /// A stream that requires more than this is reported as an error.
    ///
    /// The incomplete value is copied and decoded again from its first byte
    /// on every chunk, so a value spanning `n` chunks costs `O(n^2)`. Keep
    /// this bound close to the largest expected value, or raise
    /// [`chunk_size`][Config::chunk_size] for streams with large values.
    pub fn max_tail(mut self, max_tail: usize) -> Self {
        self.max_tail = max_tail;
        self
    }

    /// Set [`Mapper`] for temporal and decimal columns.
    pub fn mapper(mut self, mapper: Arc<dyn Mapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn get_max_tail(&self) -> usize {
        self.max_tail
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("chunk_size", &self.chunk_size)
            .field("max_tail", &self.max_tail)
            .finish_non_exhaustive()
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing config.
pub struct ConfigError {
    pub(crate) reason: Cow<'static,str>,
}

impl std::error::Error for ConfigError { }

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to parse config: {}", self.reason)
    }
}

impl fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_size() {
        assert_eq!(Config::parse_size("512").unwrap(), 512);
        assert_eq!(Config::parse_size("64k").unwrap(), 64 * 1024);
        assert_eq!(Config::parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert!(Config::parse_size("").is_err());
        assert!(Config::parse_size("k").is_err());
        assert!(Config::parse_size("0").is_err());
        assert!(Config::parse_size("-1").is_err());
        assert!(Config::parse_size("12g").is_err());
    }

    #[test]
    fn parse_pairs() {
        let config: Config = "chunk_size = 1k; max_tail=4k;".parse().unwrap();
        assert_eq!(config.get_chunk_size(), 1024);
        assert_eq!(config.get_max_tail(), 4096);

        let config = Config::parse("").unwrap();
        assert_eq!(config.get_chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.get_max_tail(), DEFAULT_MAX_TAIL);
    }

    #[test]
    fn parse_errors() {
        let err = Config::parse("chunk_size").unwrap_err();
        assert_eq!(format!("{err:#}"), "missing value of \"chunk_size\"");
        let err = Config::parse("level=3").unwrap_err();
        assert_eq!(err.to_string(), "failed to parse config: unknown key \"level\"");
    }
}
