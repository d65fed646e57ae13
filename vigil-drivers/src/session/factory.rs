//! Session provisioning: execution-mode dispatch, capability selection,
//! timeout application, and optional guard attachment.

use anyhow::Result;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use vigil_common::VigilError;
use vigil_config::SessionConfig;

use super::guard::{ClientProbe, LoadingGuard, DEFAULT_INDICATOR_SELECTOR};
use super::options::{capabilities_for, Browser, ExecutionMode};
use super::page::VigilPage;

/// A provisioned browser session, optionally guarded.
///
/// Interactions go through [`VigilPage`]/[`VigilElement`]; when the loading
/// guard is attached, their click and text-entry paths wait out the page's
/// loading overlay first.
///
/// [`VigilElement`]: super::page::VigilElement
pub struct VigilDriver {
    pub client: Client,
    guard: Option<Arc<LoadingGuard>>,
}

impl std::fmt::Debug for VigilDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VigilDriver")
            .field("client", &self.client)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

impl VigilDriver {
    /// Whether interactions on this session run the loading guard.
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Wrap the current browsing context in a page handle.
    pub fn page(&self) -> VigilPage {
        VigilPage::new(self.client.clone(), self.guard.clone())
    }

    /// Navigate to `url` and return the page handle.
    pub async fn goto(&self, url: &str) -> Result<VigilPage> {
        let page = self.page();
        page.goto(url).await?;
        Ok(page)
    }

    /// Read back the session's timeout settings.
    pub async fn timeouts(&self) -> Result<TimeoutConfiguration> {
        Ok(self.client.get_timeouts().await?)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Provision a driver per `cfg`.
///
/// Parses the execution mode and browser identity (unrecognized values fail
/// before anything is constructed), connects to the right WebDriver
/// endpoint with the matching capability set, applies the three configured
/// timeouts, and attaches the loading guard when the flag is set.
pub async fn acquire(cfg: &SessionConfig) -> Result<VigilDriver> {
    let mode = ExecutionMode::from_str(&cfg.execution_mode)?;
    let browser = Browser::from_str(&cfg.browser)?;
    let caps = capabilities_for(mode, browser, cfg)?;

    let endpoint = match mode {
        ExecutionMode::Local | ExecutionMode::Remote => cfg.webdriver_url.as_str(),
        ExecutionMode::LocalGrid => cfg.grid_url.as_deref().ok_or_else(|| {
            VigilError::Config("localgrid execution requires grid_url to be set".into())
        })?,
    };

    let client = ClientBuilder::native()
        .capabilities(caps)
        .connect(endpoint)
        .await?;

    let timeouts = TimeoutConfiguration::new(
        Some(Duration::from_secs(cfg.script_timeout_secs)),
        Some(Duration::from_secs(cfg.page_load_timeout_secs)),
        Some(Duration::from_secs(cfg.implicit_wait_secs)),
    );
    client.update_timeouts(timeouts).await?;

    let guard = cfg.enable_loading_guard.then(|| {
        let selector = cfg
            .loading_indicator
            .clone()
            .unwrap_or_else(|| DEFAULT_INDICATOR_SELECTOR.to_string());
        Arc::new(LoadingGuard::new(Arc::new(ClientProbe::new(
            client.clone(),
            selector,
        ))))
    });

    info!(
        target: "session.factory",
        mode = ?mode,
        browser = browser.wire_name(),
        endpoint,
        guarded = guard.is_some(),
        "browser session provisioned"
    );

    Ok(VigilDriver { client, guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_error_of(err: anyhow::Error) -> String {
        match err.downcast_ref::<VigilError>() {
            Some(VigilError::Config(msg)) => msg.clone(),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_execution_mode_fails_before_any_connection() {
        let cfg = SessionConfig {
            execution_mode: "cloud".into(),
            ..SessionConfig::default()
        };
        let msg = config_error_of(acquire(&cfg).await.unwrap_err());
        assert!(msg.contains("cloud"));
    }

    #[tokio::test]
    async fn unknown_browser_fails_before_any_connection() {
        let cfg = SessionConfig {
            browser: "netscape".into(),
            ..SessionConfig::default()
        };
        let msg = config_error_of(acquire(&cfg).await.unwrap_err());
        assert!(msg.contains("netscape"));
    }

    #[tokio::test]
    async fn localgrid_without_hub_url_is_a_config_error() {
        let cfg = SessionConfig {
            execution_mode: "localgrid".into(),
            grid_url: None,
            ..SessionConfig::default()
        };
        let msg = config_error_of(acquire(&cfg).await.unwrap_err());
        assert!(msg.contains("grid_url"));
    }

    #[tokio::test]
    async fn remote_internet_explorer_is_rejected() {
        let cfg = SessionConfig {
            execution_mode: "remote".into(),
            browser: "ie".into(),
            ..SessionConfig::default()
        };
        let msg = config_error_of(acquire(&cfg).await.unwrap_err());
        assert!(msg.contains("not supported"));
    }
}
