//! Mapping between base URLs and environment names

use reqwest::Url;

pub const PRODUCTION_BASE_URL: &str = "https://home.mozu.com";

const SERVICE_PREFIX: &str = "Mozu AppDev Sync: ";

const KNOWN_ENVIRONMENTS: &[(&str, &str)] = &[("Production", PRODUCTION_BASE_URL)];

/// Environment name for a base URL; unknown environments are named by host
pub fn environment_name(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if let Some((name, _)) = KNOWN_ENVIRONMENTS
        .iter()
        .find(|(_, url)| url.eq_ignore_ascii_case(trimmed))
    {
        return (*name).to_string();
    }

    Url::parse(trimmed)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| trimmed.to_string())
}

/// Name under which passwords for this environment are saved
pub fn service_name(base_url: &str) -> String {
    format!("{SERVICE_PREFIX}{}", environment_name(base_url))
}
