use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for shelfwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub schedule: ScheduleConfig,
    pub notify: NotifyConfig,
    pub output: OutputConfig,
}

/// The catalog being watched
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// First page of the paginated catalog; later pages append `?page=N`.
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// CSS selectors describing the catalog markup
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Container for one listing. Also the readiness probe after navigation.
    pub item: String,

    /// Listing name, within the item container.
    pub name: String,

    /// Price text, within the item container.
    pub price: String,

    /// Status tag whose text may mark the listing out of stock.
    #[serde(rename = "stock-tag")]
    pub stock_tag: String,

    /// Anchor carrying the listing URL.
    #[serde(default = "default_link_selector")]
    pub link: String,

    /// Next-page pagination control.
    #[serde(rename = "next-page")]
    pub next_page: String,

    /// Consent/interstitial overlay dismissal target; omit when the site
    /// has none.
    #[serde(default)]
    pub overlay: Option<String>,

    /// Tag text that marks a listing out of stock.
    #[serde(rename = "out-of-stock-text", default = "default_out_of_stock_text")]
    pub out_of_stock_text: String,
}

/// Fetch policy timings (seconds)
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Bounded navigation wait.
    #[serde(rename = "nav-timeout-secs", default = "default_nav_timeout")]
    pub nav_timeout_secs: u64,

    /// Fixed cooldown after a failed navigation before continuing degraded.
    #[serde(
        rename = "nav-failure-cooldown-secs",
        default = "default_nav_failure_cooldown"
    )]
    pub nav_failure_cooldown_secs: u64,

    /// Brief wait for the interstitial overlay on the first page of a cycle.
    #[serde(rename = "overlay-timeout-secs", default = "default_overlay_timeout")]
    pub overlay_timeout_secs: u64,

    /// Bounded wait for the listing container; fatal for the page beyond it.
    #[serde(rename = "container-timeout-secs", default = "default_container_timeout")]
    pub container_timeout_secs: u64,

    /// Cooldown between the two visit attempts for a URL.
    #[serde(rename = "retry-cooldown-secs", default = "default_retry_cooldown")]
    pub retry_cooldown_secs: u64,
}

impl FetchConfig {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    pub fn nav_failure_cooldown(&self) -> Duration {
        Duration::from_secs(self.nav_failure_cooldown_secs)
    }

    pub fn overlay_timeout(&self) -> Duration {
        Duration::from_secs(self.overlay_timeout_secs)
    }

    pub fn container_timeout(&self) -> Duration {
        Duration::from_secs(self.container_timeout_secs)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            nav_timeout_secs: default_nav_timeout(),
            nav_failure_cooldown_secs: default_nav_failure_cooldown(),
            overlay_timeout_secs: default_overlay_timeout(),
            container_timeout_secs: default_container_timeout(),
            retry_cooldown_secs: default_retry_cooldown(),
        }
    }
}

/// Outer polling loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Base interval between crawl cycles.
    #[serde(rename = "check-interval-secs")]
    pub check_interval_secs: u64,

    /// Upper bound on the random jitter added to each interval.
    #[serde(rename = "max-jitter-secs", default = "default_max_jitter")]
    pub max_jitter_secs: u64,
}

impl ScheduleConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Notification transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Chat-bridge endpoint alerts are posted to.
    pub endpoint: String,

    /// Destination channel for production alerts.
    #[serde(rename = "channel-id")]
    pub channel_id: String,

    /// Alternate channel used in test mode and for startup status.
    #[serde(rename = "test-channel-id", default)]
    pub test_channel_id: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_link_selector() -> String {
    "a".to_string()
}

fn default_out_of_stock_text() -> String {
    "OUT OF STOCK".to_string()
}

fn default_nav_timeout() -> u64 {
    60
}

fn default_nav_failure_cooldown() -> u64 {
    30
}

fn default_overlay_timeout() -> u64 {
    2
}

fn default_container_timeout() -> u64 {
    10
}

fn default_retry_cooldown() -> u64 {
    3
}

fn default_max_jitter() -> u64 {
    10
}
