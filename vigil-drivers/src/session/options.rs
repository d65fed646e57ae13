//! Browser identities, execution modes, and per-browser capability builders.
//!
//! Provisioning is a lookup from `(mode, browser)` to an options-builder;
//! every builder is a pure function producing the W3C capability map handed
//! to the WebDriver service. No connection happens here.

use serde_json::json;
use std::str::FromStr;
use vigil_common::VigilError;
use vigil_config::SessionConfig;
use webdriver::capabilities::Capabilities;

/// Browsers the factory knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
    InternetExplorer,
}

impl Browser {
    /// Value carried in the W3C `browserName` capability.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "MicrosoftEdge",
            Browser::InternetExplorer => "internet explorer",
        }
    }
}

impl FromStr for Browser {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            "edge" | "msedge" | "microsoftedge" => Ok(Browser::Edge),
            "internet_explorer" | "internetexplorer" | "ie" => Ok(Browser::InternetExplorer),
            other => Err(VigilError::Config(format!(
                "unrecognized browser identity '{other}' (expected chrome, firefox, edge, or internet_explorer)"
            ))),
        }
    }
}

/// Where the session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// A WebDriver service on this machine, headed.
    Local,
    /// A CI-style headless session against the configured service.
    Remote,
    /// A Selenium-grid hub reachable at `grid_url`.
    LocalGrid,
}

impl FromStr for ExecutionMode {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ExecutionMode::Local),
            "remote" => Ok(ExecutionMode::Remote),
            "localgrid" | "local_grid" => Ok(ExecutionMode::LocalGrid),
            other => Err(VigilError::Config(format!(
                "unrecognized execution mode '{other}' (expected local, remote, or localgrid)"
            ))),
        }
    }
}

/// Build the capability map for `(mode, browser)`.
///
/// Headless/CI sessions are only provisioned for Chrome and Firefox; asking
/// for anything else is a configuration error rather than a silent fallback.
pub fn capabilities_for(
    mode: ExecutionMode,
    browser: Browser,
    cfg: &SessionConfig,
) -> Result<Capabilities, VigilError> {
    match (mode, browser) {
        (ExecutionMode::Local, Browser::Chrome) => Ok(local_chrome(cfg)),
        (ExecutionMode::Local, Browser::Firefox) => Ok(local_firefox(cfg)),
        (ExecutionMode::Local, Browser::Edge) => Ok(local_edge(cfg)),
        (ExecutionMode::Local, Browser::InternetExplorer) => Ok(local_internet_explorer()),
        (ExecutionMode::Remote | ExecutionMode::LocalGrid, Browser::Chrome) => {
            Ok(remote_chrome(cfg))
        }
        (ExecutionMode::Remote | ExecutionMode::LocalGrid, Browser::Firefox) => {
            Ok(remote_firefox(cfg))
        }
        (ExecutionMode::Remote | ExecutionMode::LocalGrid, other) => Err(VigilError::Config(
            format!(
                "browser '{}' is not supported for headless/grid execution",
                other.wire_name()
            ),
        )),
    }
}

fn base_capabilities(browser: Browser) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!(browser.wire_name()));
    caps
}

fn local_chrome(cfg: &SessionConfig) -> Capabilities {
    let mut caps = base_capabilities(Browser::Chrome);

    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--lang=en".to_string(),
        "--remote-allow-origins=*".to_string(),
        "--disable-notifications".to_string(),
    ];
    if let Some(pattern) = &cfg.auth_server_allowlist {
        args.push(format!("--auth-server-whitelist={pattern}"));
        args.push(format!("--auth-negotiate-delegate-whitelist={pattern}"));
    }

    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "prefs": {
                "profile.default_content_settings.popups": 0,
                "download.default_directory": download_dir_string(cfg),
            },
        }),
    );
    caps
}

fn remote_chrome(cfg: &SessionConfig) -> Capabilities {
    let mut caps = base_capabilities(Browser::Chrome);

    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless",
                "--disable-dev-shm-usage",
                "--disable-web-security",
                "--ignore-certificate-errors",
                "--allow-running-insecure-content",
                "--allow-insecure-localhost",
                "--no-sandbox",
                "--disable-gpu",
                "--incognito",
                "start-maximized",
            ],
            "prefs": {
                "download.default_directory": download_dir_string(cfg),
            },
        }),
    );
    caps
}

fn local_firefox(cfg: &SessionConfig) -> Capabilities {
    let mut caps = base_capabilities(Browser::Firefox);

    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "prefs": {
                "javascript.enabled": true,
                "intl.accept_languages": "en",
                "browser.download.folderList": 2,
                "browser.download.dir": download_dir_string(cfg),
                "browser.helperApps.neverAsk.saveToDisk": "text/csv/xlsx/pdf",
                "browser.download.manager.showWhenStarting": false,
            },
        }),
    );
    caps
}

fn remote_firefox(cfg: &SessionConfig) -> Capabilities {
    let mut caps = base_capabilities(Browser::Firefox);

    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": ["-headless"],
            "prefs": {
                "browser.download.folderList": 2,
                "browser.download.dir": download_dir_string(cfg),
            },
        }),
    );
    caps
}

fn local_edge(cfg: &SessionConfig) -> Capabilities {
    let mut caps = base_capabilities(Browser::Edge);

    caps.insert(
        "ms:edgeOptions".to_string(),
        json!({
            "excludeSwitches": ["enable-automation"],
            "useAutomationExtension": false,
            "prefs": {
                "profile.default_content_settings.popups": 0,
                "profile.default_content_setting_values.notifications": 2,
                "profile.default_content_setting_values.automatic_downloads": 1,
                "download.default_directory": download_dir_string(cfg),
            },
        }),
    );
    caps
}

fn local_internet_explorer() -> Capabilities {
    let mut caps = base_capabilities(Browser::InternetExplorer);
    // Driver defaults are intentional here, matching what IEDriverServer
    // does with an empty options block.
    caps.insert("se:ieOptions".to_string(), json!({}));
    caps
}

fn download_dir_string(cfg: &SessionConfig) -> String {
    cfg.download_dir().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cfg_with_downloads(dir: &str) -> SessionConfig {
        SessionConfig {
            download_dir: Some(PathBuf::from(dir)),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn parses_browser_aliases() {
        assert_eq!("Chrome".parse::<Browser>().unwrap(), Browser::Chrome);
        assert_eq!("msedge".parse::<Browser>().unwrap(), Browser::Edge);
        assert_eq!(
            "IE".parse::<Browser>().unwrap(),
            Browser::InternetExplorer
        );
        assert!(matches!(
            "safari".parse::<Browser>(),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn parses_execution_modes() {
        assert_eq!("local".parse::<ExecutionMode>().unwrap(), ExecutionMode::Local);
        assert_eq!(
            "LocalGrid".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::LocalGrid
        );
        assert!(matches!(
            "cloud".parse::<ExecutionMode>(),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn local_chrome_carries_download_directory() {
        let cfg = cfg_with_downloads("/srv/ci/downloads");
        let caps = capabilities_for(ExecutionMode::Local, Browser::Chrome, &cfg).unwrap();

        assert_eq!(caps["browserName"], "chrome");
        let prefs = &caps["goog:chromeOptions"]["prefs"];
        assert_eq!(prefs["download.default_directory"], "/srv/ci/downloads");
        assert_eq!(prefs["profile.default_content_settings.popups"], 0);
    }

    #[test]
    fn local_chrome_auth_allowlist_is_opt_in() {
        let bare = capabilities_for(
            ExecutionMode::Local,
            Browser::Chrome,
            &SessionConfig::default(),
        )
        .unwrap();
        let args = bare["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a
            .as_str()
            .is_some_and(|s| s.starts_with("--auth-server-whitelist"))));

        let cfg = SessionConfig {
            auth_server_allowlist: Some("*.corp.example".into()),
            ..SessionConfig::default()
        };
        let caps = capabilities_for(ExecutionMode::Local, Browser::Chrome, &cfg).unwrap();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--auth-server-whitelist=*.corp.example")));
        assert!(args.contains(&json!("--auth-negotiate-delegate-whitelist=*.corp.example")));
    }

    #[test]
    fn remote_chrome_is_headless_and_insecure_tolerant() {
        let caps = capabilities_for(
            ExecutionMode::Remote,
            Browser::Chrome,
            &SessionConfig::default(),
        )
        .unwrap();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();

        assert!(args.contains(&json!("--headless")));
        assert!(args.contains(&json!("--ignore-certificate-errors")));
        assert!(args.contains(&json!("--allow-running-insecure-content")));
        assert!(args.contains(&json!("--incognito")));
    }

    #[test]
    fn firefox_prefs_route_downloads_to_custom_dir() {
        let cfg = cfg_with_downloads("/data/dl");
        let caps = capabilities_for(ExecutionMode::Local, Browser::Firefox, &cfg).unwrap();
        let prefs = &caps["moz:firefoxOptions"]["prefs"];

        assert_eq!(prefs["browser.download.folderList"], 2);
        assert_eq!(prefs["browser.download.dir"], "/data/dl");
        assert_eq!(prefs["intl.accept_languages"], "en");
    }

    #[test]
    fn edge_disables_automation_banner() {
        let caps = capabilities_for(
            ExecutionMode::Local,
            Browser::Edge,
            &SessionConfig::default(),
        )
        .unwrap();
        let opts = &caps["ms:edgeOptions"];

        assert_eq!(caps["browserName"], "MicrosoftEdge");
        assert_eq!(opts["excludeSwitches"], json!(["enable-automation"]));
        assert_eq!(opts["useAutomationExtension"], json!(false));
    }

    #[test]
    fn headless_execution_rejects_unsupported_browsers() {
        for browser in [Browser::Edge, Browser::InternetExplorer] {
            let err = capabilities_for(ExecutionMode::Remote, browser, &SessionConfig::default())
                .unwrap_err();
            assert!(matches!(err, VigilError::Config(_)));
        }
    }
}
