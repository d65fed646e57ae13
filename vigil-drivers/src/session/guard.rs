//! Two-phase wait for the page's loading indicator.
//!
//! Single-page apps surface async work through a transient overlay; clicking
//! through it races the render and flakes the test. The guard polls for the
//! overlay to show up, then polls (much longer) for it to go away, and lets
//! the interaction proceed no matter what it observed. It is a best-effort
//! delay, not a correctness gate: no outcome aborts the wrapped action.

use anyhow::Result;
use async_trait::async_trait;
use fantoccini::{Client, Locator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use vigil_common::VigilError;

/// Default selector for the loading overlay, equivalent to the app's
/// `<app-loader><div class="loader">` markup.
pub const DEFAULT_INDICATOR_SELECTOR: &str = "app-loader div.loader";

/// A timeout/polling-interval pair for one polling phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    timeout: Duration,
    interval: Duration,
}

impl WaitPolicy {
    /// Build a policy; the interval must be positive and strictly shorter
    /// than the timeout.
    pub fn new(timeout: Duration, interval: Duration) -> vigil_common::Result<Self> {
        if timeout.is_zero() || interval.is_zero() {
            return Err(VigilError::Config(
                "wait policy timeout and interval must be positive".into(),
            ));
        }
        if interval >= timeout {
            return Err(VigilError::Config(format!(
                "wait policy interval ({interval:?}) must be shorter than its timeout ({timeout:?})"
            )));
        }
        Ok(Self { timeout, interval })
    }

    /// Short window for the indicator to show up at all.
    pub fn appearance() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            interval: Duration::from_millis(25),
        }
    }

    /// Long window for the indicator to clear once it was seen.
    pub fn disappearance() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            interval: Duration::from_millis(250),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// What the guard observed before letting the interaction through.
///
/// All three collapse to "proceed" at the call site; the distinction exists
/// so tests and logs can tell a quiet page from a slow one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// The indicator never showed up within the appearance window.
    NeverAppeared,
    /// The indicator showed up and was later observed gone.
    Cleared,
    /// The disappearance window elapsed with the indicator still visible.
    StillVisible,
}

/// Visibility probe for the loading indicator.
///
/// The seam between the guard's polling logic and the live session: tests
/// script visibility sequences, production asks the browser.
#[async_trait]
pub trait IndicatorProbe: Send + Sync {
    /// Whether the indicator is currently visible. An absent element is
    /// `Ok(false)`, not an error.
    async fn is_visible(&self) -> Result<bool>;
}

/// Probe backed by a live WebDriver session and a CSS selector.
pub struct ClientProbe {
    client: Client,
    selector: String,
}

impl ClientProbe {
    pub fn new(client: Client, selector: impl Into<String>) -> Self {
        Self {
            client,
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl IndicatorProbe for ClientProbe {
    async fn is_visible(&self) -> Result<bool> {
        match self.client.find(Locator::Css(&self.selector)).await {
            Ok(element) => Ok(element.is_displayed().await?),
            Err(ref e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Blocks the calling task until the loading indicator is not visible.
pub struct LoadingGuard {
    probe: Arc<dyn IndicatorProbe>,
    appearance: WaitPolicy,
    disappearance: WaitPolicy,
}

impl LoadingGuard {
    /// Guard with the default appearance/disappearance policies.
    pub fn new(probe: Arc<dyn IndicatorProbe>) -> Self {
        Self::with_policies(probe, WaitPolicy::appearance(), WaitPolicy::disappearance())
    }

    pub fn with_policies(
        probe: Arc<dyn IndicatorProbe>,
        appearance: WaitPolicy,
        disappearance: WaitPolicy,
    ) -> Self {
        Self {
            probe,
            appearance,
            disappearance,
        }
    }

    /// Wait for the indicator to appear (briefly) and then clear (patiently),
    /// reporting what was observed.
    ///
    /// Infallible by type: probe errors count as "not visible" and nothing
    /// here can abort the interaction that follows.
    pub async fn pause_until_idle(&self) -> IndicatorState {
        let started = Instant::now();

        if !self.poll_for(true, self.appearance).await {
            debug!(target: "session.guard", "loading indicator never appeared; proceeding");
            return IndicatorState::NeverAppeared;
        }

        if self.poll_for(false, self.disappearance).await {
            debug!(
                target: "session.guard",
                elapsed_ms = started.elapsed().as_millis() as u64,
                "loading indicator cleared"
            );
            IndicatorState::Cleared
        } else {
            warn!(
                target: "session.guard",
                elapsed_ms = started.elapsed().as_millis() as u64,
                "loading indicator still visible after the disappearance window; proceeding anyway"
            );
            IndicatorState::StillVisible
        }
    }

    /// Poll until visibility equals `target`; true if observed in time.
    async fn poll_for(&self, target: bool, policy: WaitPolicy) -> bool {
        let deadline = Instant::now() + policy.timeout();
        loop {
            let visible = self.probe.is_visible().await.unwrap_or(false);
            if visible == target {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(policy.interval()).await;
        }
    }
}
