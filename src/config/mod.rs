use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 300; // Original cadence: every 5 minutes
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MQTT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_THRESHOLD_PERCENT: f64 = 5.0;
const DEFAULT_MAX_PARTIES: usize = 6;
const DEFAULT_FRAME_DURATION_SECONDS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// One frame: bar chart plus scrolling party list
    Summary,
    /// One frame per party
    Parties,
}

impl FromStr for FrameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(FrameMode::Summary),
            "parties" => Ok(FrameMode::Parties),
            other => Err(format!("expected \"summary\" or \"parties\", got \"{}\"", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub url: String,
    pub election_id: String,
    pub stage: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub credentials: Option<(String, String)>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub mode: FrameMode,
    pub threshold: f64,
    pub max_parties: usize,
    pub frame_duration: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub mqtt: MqttConfig,
    pub display: DisplayConfig,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Reads every setting through `lookup` so callers decide where values come from
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let api = ApiConfig {
            url: required("API_URL")?.trim_end_matches('/').to_string(),
            election_id: required("ELECTION_ID")?,
            stage: required("ELECTION_STAGE")?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECONDS",
                DEFAULT_HTTP_TIMEOUT_SECONDS,
            )?),
        };

        let username = lookup("MQTT_USERNAME").filter(|v| !v.is_empty());
        let password = lookup("MQTT_PASSWORD").unwrap_or_default();
        let mqtt = MqttConfig {
            broker: required("MQTT_BROKER")?,
            port: parse_or(&lookup, "MQTT_PORT", DEFAULT_MQTT_PORT)?,
            topic: required("MQTT_TOPIC")?,
            client_id: lookup("MQTT_CLIENT_ID")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| format!("ballot-ticker-{}", Uuid::new_v4())),
            credentials: username.map(|user| (user, password)),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "MQTT_TIMEOUT_SECONDS",
                DEFAULT_MQTT_TIMEOUT_SECONDS,
            )?),
        };

        let threshold: f64 = parse_or(&lookup, "THRESHOLD_PERCENT", DEFAULT_THRESHOLD_PERCENT)?;
        if !threshold.is_finite() {
            return Err(ConfigError::Invalid {
                var: "THRESHOLD_PERCENT",
                value: threshold.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        let display = DisplayConfig {
            mode: parse_or(&lookup, "FRAME_MODE", FrameMode::Summary)?,
            threshold,
            max_parties: parse_or(&lookup, "MAX_PARTIES", DEFAULT_MAX_PARTIES)?,
            frame_duration: parse_or(
                &lookup,
                "FRAME_DURATION_SECONDS",
                DEFAULT_FRAME_DURATION_SECONDS,
            )?,
        };

        let poll_interval = parse_or(&lookup, "POLL_INTERVAL_SECONDS", DEFAULT_POLL_INTERVAL_SECONDS)?;
        if poll_interval == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECONDS",
                value: "0".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(Self {
            api,
            mqtt,
            display,
            poll_interval: Duration::from_secs(poll_interval),
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
