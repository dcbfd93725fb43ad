use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{debug, error, info};
use url::Url;

use crate::config::BrowserSettings;
use crate::delay_manager;
use crate::error::RenderError;
use crate::extractor::LISTING_SELECTOR;

/// Chrome flags that hide the usual automation tells.
const STEALTH_FLAGS: [&str; 5] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--start-maximized",
    "--disable-extensions",
    "--no-sandbox",
];

/// Produces the rendered markup of a page.
pub trait PageRenderer {
    fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// Renders pages in a fresh Chrome session per call. One attempt only.
pub struct ChromeRenderer {
    settings: BrowserSettings,
    debug_artifact: PathBuf,
}

impl ChromeRenderer {
    pub fn new(settings: BrowserSettings, debug_artifact: PathBuf) -> Self {
        ChromeRenderer { settings, debug_artifact }
    }

    fn try_render(&self, url: &str) -> Result<String, RenderError> {
        validate_target_url(url)?;

        let session = BrowserSession::launch(&self.settings)?;
        let tab = session.tab();

        info!("Browser navigating to: {}", url);
        tab.navigate_to(url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| RenderError::Navigation(format!("{}: {}", url, e)))?;

        tab.wait_for_element_with_custom_timeout(LISTING_SELECTOR, self.settings.wait_timeout())
            .map_err(|e| {
                RenderError::Timeout(format!(
                    "'{}' after {:?}: {}",
                    LISTING_SELECTOR,
                    self.settings.wait_timeout(),
                    e
                ))
            })?;

        delay_manager::random_render_delay(self.settings.min_delay_secs, self.settings.max_delay_secs);

        let html = tab
            .get_content()
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        save_debug_artifact(&self.debug_artifact, &html)?;
        info!("Saved page HTML to {:?}", self.debug_artifact);

        Ok(html)
    }
}

impl PageRenderer for ChromeRenderer {
    fn render(&self, url: &str) -> Result<String, RenderError> {
        let result = self.try_render(url);
        if let Err(e) = &result {
            error!("Error fetching page: {}", e);
        }
        result
    }
}

/// A launched browser with one open tab. Dropping it closes the tab and then
/// the browser process; a failed close is only logged.
struct BrowserSession {
    tab: Arc<Tab>,
    // dropped after `tab` is closed
    _browser: Browser,
}

impl BrowserSession {
    fn launch(settings: &BrowserSettings) -> Result<Self, RenderError> {
        let user_agent_arg = format!("--user-agent={}", settings.user_agent);

        let mut args: Vec<&OsStr> = STEALTH_FLAGS.iter().map(|f| OsStr::new(*f)).collect();
        args.push(OsStr::new(&user_agent_arg));

        // keep the browser alive for the whole wait plus the pacing delay
        let idle = idle_timeout(settings);

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some(settings.window_size))
            .idle_browser_timeout(idle)
            .args(args)
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| RenderError::Tab(e.to_string()))?;

        Ok(BrowserSession { tab, _browser: browser })
    }

    fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        match self.tab.close(false) {
            Ok(_) => debug!("Browser tab closed"),
            Err(e) => error!("Error closing driver: {}", e),
        }
    }
}

fn idle_timeout(settings: &BrowserSettings) -> Duration {
    settings
        .wait_timeout()
        .saturating_add(settings.max_delay())
        .saturating_add(Duration::from_secs(60))
}

/// Accepts only absolute http(s) URLs with a host.
pub fn validate_target_url(url: &str) -> Result<Url, RenderError> {
    let parsed = Url::parse(url).map_err(|e| RenderError::InvalidUrl(url.to_string(), e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        scheme => Err(RenderError::InvalidUrl(
            url.to_string(),
            format!("unsupported scheme '{}' or missing host", scheme),
        )),
    }
}

/// Overwrites the debug snapshot with the captured markup.
pub fn save_debug_artifact(path: &Path, html: &str) -> Result<(), RenderError> {
    let wrap = |source: std::io::Error| RenderError::Artifact { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, html).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_target_url("https://remoteok.com/remote-sales-marketing-jobs").is_ok());
        assert!(validate_target_url("http://localhost:8080/jobs").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        for bad in ["ftp://remoteok.com", "file:///tmp/page.html", "remoteok.com/jobs", ""] {
            assert!(
                matches!(validate_target_url(bad), Err(RenderError::InvalidUrl(..))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn invalid_url_fails_before_launching_chrome() {
        let renderer = ChromeRenderer::new(BrowserSettings::default(), PathBuf::from("unused.html"));
        assert!(matches!(renderer.render("not a url"), Err(RenderError::InvalidUrl(..))));
    }

    #[test]
    fn debug_artifact_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug/debug.html");
        save_debug_artifact(&path, "<html>old</html>").unwrap();
        save_debug_artifact(&path, "<html>new</html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html>new</html>");
    }

    #[test]
    fn idle_timeout_survives_extreme_settings() {
        let settings = BrowserSettings {
            wait_timeout_secs: u64::MAX,
            max_delay_secs: f64::INFINITY,
            ..BrowserSettings::default()
        };
        assert_eq!(idle_timeout(&settings), Duration::from_secs(600 + 300 + 60));
        assert_eq!(idle_timeout(&BrowserSettings::default()), Duration::from_secs(20 + 5 + 60));
    }

    #[test]
    fn stealth_flags_cover_automation_tells() {
        assert!(STEALTH_FLAGS.iter().any(|f| f.contains("AutomationControlled")));
        assert!(STEALTH_FLAGS.contains(&"--disable-extensions"));
    }

    #[test]
    #[ignore] // Requires Chrome/Chromium and internet
    fn test_render_live_listing() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("debug.html");
        let renderer = ChromeRenderer::new(BrowserSettings::default(), artifact.clone());

        let html = renderer
            .render("https://remoteok.com/remote-sales-marketing-jobs")
            .expect("Chrome/Chromium not installed or site unreachable");
        assert!(html.contains("job"));
        assert!(artifact.exists());
    }
}
