use crate::config::types::{Config, NotifyConfig, ScheduleConfig, SelectorConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_base_url(&config.catalog.base_url)?;
    validate_selectors(&config.selectors)?;
    validate_schedule(&config.schedule)?;
    validate_notify(&config.notify)?;

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http(s), got '{}'",
            base_url
        )));
    }

    Ok(())
}

fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    let required = [
        ("item", &selectors.item),
        ("name", &selectors.name),
        ("price", &selectors.price),
        ("stock-tag", &selectors.stock_tag),
        ("link", &selectors.link),
        ("next-page", &selectors.next_page),
    ];

    for (key, selector) in required {
        validate_selector(key, selector)?;
    }

    if let Some(overlay) = &selectors.overlay {
        validate_selector("overlay", overlay)?;
    }

    if selectors.out_of_stock_text.is_empty() {
        return Err(ConfigError::Validation(
            "out-of-stock-text cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector(key: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.is_empty() {
        return Err(ConfigError::InvalidSelector(format!(
            "selector '{}' cannot be empty",
            key
        )));
    }

    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidSelector(format!("selector '{}' ('{}'): {}", key, selector, e))
    })?;

    Ok(())
}

fn validate_schedule(schedule: &ScheduleConfig) -> Result<(), ConfigError> {
    if schedule.check_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "check-interval-secs must be >= 1, got {}",
            schedule.check_interval_secs
        )));
    }

    Ok(())
}

fn validate_notify(notify: &NotifyConfig) -> Result<(), ConfigError> {
    Url::parse(&notify.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid notify endpoint: {}", e)))?;

    if notify.channel_id.is_empty() {
        return Err(ConfigError::Validation(
            "channel-id cannot be empty".to_string(),
        ));
    }

    if let Some(test_channel) = &notify.test_channel_id {
        if test_channel.is_empty() {
            return Err(ConfigError::Validation(
                "test-channel-id cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
