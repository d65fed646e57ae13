//! Driver layer for provisioning guarded browser sessions.
//!
//! This crate turns a [`vigil_config::SessionConfig`] into a live, configured
//! WebDriver session and optionally wraps it so interactions wait out the
//! page's loading overlay.
//!
//! - [`session::factory::acquire`]: execution-mode dispatch and session setup
//! - [`session::options`]: per-browser capability builders
//! - [`session::guard::LoadingGuard`]: two-phase poll for the loading indicator
//! - [`session::page`]: page/element wrappers that apply the guard
pub mod session;
