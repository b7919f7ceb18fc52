//! Page scraping through the Jina Reader rendering service.
//!
//! `fetch_page("https://example.com")` requests
//! `https://r.jina.ai/https://example.com` and returns the rendered text.

use std::time::Duration;

use tracing::debug;

use crate::error::{PipelineError, Result};

pub const READER_PREFIX: &str = "https://r.jina.ai/";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(PipelineError::InvalidArgument(
            "URL must start with http or https".to_string(),
        ))
    }
}

pub fn reader_url(url: &str) -> String {
    format!("{}{}", READER_PREFIX, url)
}

/// Blocking; call from a blocking thread inside async code.
pub fn fetch_page(url: &str, timeout_secs: u64) -> Result<String> {
    validate_url(url)?;
    let target = reader_url(url);
    debug!(url = %target, "fetching page");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .map_err(|e| PipelineError::network(&target, e))?;

    let response = client
        .get(&target)
        .send()
        .map_err(|e| PipelineError::network(&target, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::network(&target, format!("HTTP {}", status)));
    }
    response
        .text()
        .map_err(|e| PipelineError::network(&target, e))
}

/// `rdx scrape`: print the page text.
pub fn run_scrape(url: &str, timeout_secs: u64) -> anyhow::Result<()> {
    let text = fetch_page(url, timeout_secs)?;
    println!("{}", text);
    Ok(())
}
