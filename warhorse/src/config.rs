use crate::proto::Language;
use std::time::Duration;

/// Tunables for one client session.
///
/// Deserializable, so an embedder can keep it in its own settings file:
///
/// ```
/// let config: warhorse::ClientConfig =
///     serde_json::from_str(r#"{"connect_timeout": 2.5, "language": "Spanish"}"#).unwrap();
/// assert_eq!(config.connect_timeout, std::time::Duration::from_millis(2500));
/// assert_eq!(config.high_water_mark, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound for establishing the connection, in seconds when deserialized
    #[serde(deserialize_with = "seconds")]
    pub connect_timeout: Duration,
    /// Number of undelivered events at which ingestion pauses
    pub high_water_mark: usize,
    /// Largest accepted frame; a longer unterminated run is a desync
    pub max_frame_len: usize,
    /// Bytes read from the socket per read call
    pub read_chunk: usize,
    /// Unwritten request bytes at which further requests fail the session
    pub max_send_backlog: usize,
    /// Language sent along with every request
    pub language: Language,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(10),
            high_water_mark: 1024,
            max_frame_len: 1024 * 1024,
            read_chunk: 8192,
            max_send_backlog: 4 * 1024 * 1024,
            language: Language::English,
        }
    }
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_high_water_mark(mut self, events: usize) -> Self {
        self.high_water_mark = events.max(1);
        self
    }

    pub fn with_max_frame_len(mut self, bytes: usize) -> Self {
        self.max_frame_len = bytes;
        self
    }

    pub fn with_read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }

    pub fn with_max_send_backlog(mut self, bytes: usize) -> Self {
        self.max_send_backlog = bytes;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs: f64 = serde::Deserialize::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "invalid timeout: {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
