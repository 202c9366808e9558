// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ekkle sales pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Ekkle configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EkkleConfig {
    /// Agent reply behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat-completion API settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Evolution API (WhatsApp) settings.
    #[serde(default)]
    pub whatsapp: WhatsappConfig,

    /// Inbound webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Job queue and worker pool settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Business-hours calendar settings.
    #[serde(default)]
    pub hours: HoursConfig,

    /// Conversation memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Market analysis settings.
    #[serde(default)]
    pub market: MarketConfig,
}

/// Agent reply behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Sampling temperature for persona replies.
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,

    /// Max tokens for persona replies.
    #[serde(default = "default_reply_max_tokens")]
    pub reply_max_tokens: u32,

    /// Fixed apology sent when the dispatch pipeline fails mid-flight.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Auto-replies sent outside business hours; one is picked uniformly.
    #[serde(default = "default_off_hours_replies")]
    pub off_hours_replies: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reply_temperature: default_reply_temperature(),
            reply_max_tokens: default_reply_max_tokens(),
            fallback_reply: default_fallback_reply(),
            off_hours_replies: default_off_hours_replies(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reply_temperature() -> f32 {
    0.7
}

fn default_reply_max_tokens() -> u32 {
    500
}

fn default_fallback_reply() -> String {
    "Pastor, I'm so sorry -- we hit a small technical hiccup on our side. \
     One of our consultants will follow up with you shortly. God bless your patience!"
        .to_string()
}

fn default_off_hours_replies() -> Vec<String> {
    vec![
        "Grace and peace, Pastor! Our team is resting right now (we serve \
         Mon-Fri, 8am-6pm). Your message is saved and we will reply first \
         thing. God bless!"
            .to_string(),
        "Peace of the Lord! We are outside service hours (Mon-Fri, 8am-6pm), \
         but your message is safe with us. We will get back to you early \
         tomorrow."
            .to_string(),
        "Hello, Pastor! We are away at the moment (Mon-Fri, 8am-6pm). Don't \
         worry -- your message is recorded and we will answer as soon as \
         possible. Have a blessed evening!"
            .to_string(),
    ]
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("ekkle").join("ekkle.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("ekkle.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Chat-completion API configuration (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the completion endpoint.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.moonshot.cn/v1".to_string()
}

fn default_completion_model() -> String {
    "kimi-k2-5".to_string()
}

fn default_completion_timeout_secs() -> u64 {
    120
}

/// Evolution API (WhatsApp delivery) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsappConfig {
    /// Base URL of the Evolution API instance.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Evolution API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Evolution instance name.
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Simulated typing duration per character, in milliseconds.
    #[serde(default = "default_typing_ms_per_char")]
    pub typing_ms_per_char: u64,

    /// Cap on the simulated typing duration, in milliseconds.
    #[serde(default = "default_typing_cap_ms")]
    pub typing_cap_ms: u64,

    /// Lower bound of the randomized humanized delay, in milliseconds.
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the randomized humanized delay, in milliseconds.
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            instance: default_instance(),
            typing_ms_per_char: default_typing_ms_per_char(),
            typing_cap_ms: default_typing_cap_ms(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
        }
    }
}

fn default_instance() -> String {
    "ekkle-sales".to_string()
}

fn default_typing_ms_per_char() -> u64 {
    30
}

fn default_typing_cap_ms() -> u64 {
    3000
}

fn default_delay_min_ms() -> u64 {
    1000
}

fn default_delay_max_ms() -> u64 {
    3000
}

/// Inbound webhook configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Shared secret required in webhook requests. `None` accepts all.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Job queue and worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Number of concurrent worker tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Global rate cap, jobs per second, shared across workers.
    #[serde(default = "default_rate_per_sec")]
    pub rate_per_sec: usize,

    /// Attempts before a job is parked in the failed set.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    /// Base delay for exponential retry backoff, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Sleep between empty-queue polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Processing lock duration; stalled jobs are requeued after it expires.
    #[serde(default = "default_lock_secs")]
    pub lock_secs: u64,

    /// Age after which completed jobs are purged, in hours.
    #[serde(default = "default_completed_retention_hours")]
    pub completed_retention_hours: u64,

    /// Maximum completed jobs retained regardless of age.
    #[serde(default = "default_completed_retention_count")]
    pub completed_retention_count: i64,

    /// Age after which failed jobs are purged, in hours.
    #[serde(default = "default_failed_retention_hours")]
    pub failed_retention_hours: u64,

    /// Interval between reaper passes (stalled requeue + purges), in seconds.
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            rate_per_sec: default_rate_per_sec(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            lock_secs: default_lock_secs(),
            completed_retention_hours: default_completed_retention_hours(),
            completed_retention_count: default_completed_retention_count(),
            failed_retention_hours: default_failed_retention_hours(),
            reaper_interval_secs: default_reaper_interval_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_rate_per_sec() -> usize {
    10
}

fn default_max_attempts() -> i32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_lock_secs() -> u64 {
    300
}

fn default_completed_retention_hours() -> u64 {
    24
}

fn default_completed_retention_count() -> i64 {
    1000
}

fn default_failed_retention_hours() -> u64 {
    168 // 7 days
}

fn default_reaper_interval_secs() -> u64 {
    60
}

/// Business-hours calendar configuration.
///
/// Live agent replies are generated Mon-Fri between `start_hour` and
/// `end_hour` at the fixed UTC offset; outside the window an auto-reply is
/// sent instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HoursConfig {
    /// Fixed UTC offset of the business calendar, in hours.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// First hour of the business day (inclusive).
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// End hour of the business day (exclusive).
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

fn default_utc_offset_hours() -> i32 {
    -3 // Brasília
}

fn default_start_hour() -> u32 {
    8
}

fn default_end_hour() -> u32 {
    18
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Messages included verbatim in every context.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: i64,

    /// Total-message count above which the first summary is generated.
    #[serde(default = "default_summary_threshold")]
    pub summary_threshold: i64,

    /// New messages since the last summary above which it is regenerated.
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: i64,

    /// Most-recent messages fed into summarization.
    #[serde(default = "default_summary_fetch_limit")]
    pub summary_fetch_limit: i64,

    /// Max tokens for the summarization call.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Sampling temperature for the summarization call.
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,

    /// Max tokens for the fact-extraction call.
    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,

    /// Sampling temperature for the fact-extraction call.
    #[serde(default = "default_extraction_temperature")]
    pub extraction_temperature: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            summary_threshold: default_summary_threshold(),
            drift_threshold: default_drift_threshold(),
            summary_fetch_limit: default_summary_fetch_limit(),
            summary_max_tokens: default_summary_max_tokens(),
            summary_temperature: default_summary_temperature(),
            extraction_max_tokens: default_extraction_max_tokens(),
            extraction_temperature: default_extraction_temperature(),
        }
    }
}

fn default_recent_limit() -> i64 {
    10
}

fn default_summary_threshold() -> i64 {
    20
}

fn default_drift_threshold() -> i64 {
    10
}

fn default_summary_fetch_limit() -> i64 {
    100
}

fn default_summary_max_tokens() -> u32 {
    500
}

fn default_summary_temperature() -> f32 {
    0.3
}

fn default_extraction_max_tokens() -> u32 {
    200
}

fn default_extraction_temperature() -> f32 {
    0.1
}

/// Market analysis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    /// Analyses younger than this are reused instead of regenerated.
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: i64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            freshness_hours: default_freshness_hours(),
        }
    }
}

fn default_freshness_hours() -> i64 {
    24
}
