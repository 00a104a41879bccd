use crate::config::types::{
    Config, FeedParams, GeneralConfig, HackerNewsParams, KagiParams, SourceConfig, SourceKind,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_general_config(&config.general)?;
    for source in &config.sources {
        validate_source(source)?;
    }
    Ok(())
}

/// Validates the `[general]` table
fn validate_general_config(config: &GeneralConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 64, got {}",
            config.max_workers
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates one source table
///
/// Sources whose archiver cannot be resolved are left alone; the
/// orchestrator reports and skips them at run time.
fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    if source.name.is_empty()
        || !source
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "source name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            source.name
        )));
    }

    match source.resolve_kind() {
        Some(SourceKind::HackerNews) => {
            let params: HackerNewsParams = source.params()?;
            if params.top_stories == 0 {
                return Err(ConfigError::Validation(format!(
                    "{}: top-stories must be >= 1",
                    source.name
                )));
            }
            validate_http_url(&source.name, "api-base", &params.api_base)?;
            validate_http_url(&source.name, "algolia-base", &params.algolia_base)?;
        }
        Some(SourceKind::KagiNews) => {
            let params: KagiParams = source.params()?;
            if params.language.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{}: language cannot be empty",
                    source.name
                )));
            }
            validate_http_url(&source.name, "api-base", &params.api_base)?;
        }
        Some(SourceKind::Feed) => {
            let params: FeedParams = source.params()?;
            validate_http_url(&source.name, "url", &params.url)?;
        }
        None => {}
    }

    Ok(())
}

/// Checks that a configured URL parses and uses HTTP(S)
fn validate_http_url(source: &str, key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("{source}: invalid {key} '{value}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{source}: {key} '{value}' must use http or https"
        )));
    }

    Ok(())
}
