//! Headless Chromium renderer over the DevTools protocol.
//!
//! One browser process is shared by every session. It is launched on first
//! use, health-checked with `Browser.getVersion` before each new session and
//! relaunched if the check fails. Each session gets its own browser context,
//! so no cookies or storage leak between extractions.
//!
//! A session disposes its context on [`RenderSession::close`]. If the
//! session is dropped first (for example when a batch deadline cancels the
//! extraction), disposal is spawned onto the current runtime instead.

use super::{PageRenderer, RenderSession, SessionProfile};
use crate::config::BrowserSettings;
use crate::error::SearchError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetScriptExecutionDisabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{FrameId, NavigateParams};
use chromiumoxide::cdp::browser_protocol::security::SetIgnoreCertificateErrorsParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Switches passed to every launched browser, ahead of any configured extras.
pub const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-extensions",
    "--ignore-certificate-errors",
    "--no-first-run",
    "--no-default-browser-check",
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running browser plus the task pumping its CDP handler.
struct BrowserProcess {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// [`PageRenderer`] backed by a lazily launched, shared Chromium process.
pub struct ChromiumRenderer {
    settings: BrowserSettings,
    process: Mutex<Option<Arc<BrowserProcess>>>,
}

impl ChromiumRenderer {
    /// Create a renderer. No browser is launched until the first session.
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            process: Mutex::new(None),
        }
    }

    /// Launch settings of this renderer.
    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Close the browser if it is running.
    ///
    /// Sessions still open keep the process alive until they are released;
    /// the process is killed when the last one goes away.
    pub async fn shutdown(&self) {
        let Some(process) = self.process.lock().await.take() else {
            return;
        };
        match Arc::try_unwrap(process) {
            Ok(mut process) => {
                tracing::info!("shutting down browser");
                if let Err(e) = process.browser.close().await {
                    tracing::warn!(error = %e, "failed to close browser cleanly");
                }
                if let Err(e) = process.browser.wait().await {
                    tracing::warn!(error = %e, "failed to wait for browser exit");
                }
            }
            Err(_) => {
                tracing::warn!("browser still has open sessions, it will exit when they are released");
            }
        }
    }

    /// The shared browser, launching or relaunching it as needed.
    ///
    /// The health check runs without the lock held, so concurrent sessions
    /// check in parallel. The lock is only held to launch, and sessions that
    /// queued behind a relaunch reuse the new process.
    async fn process(&self) -> Result<Arc<BrowserProcess>, SearchError> {
        let current = self.process.lock().await.clone();

        let stale = match current {
            Some(process) => match process.browser.version().await {
                Ok(_) => return Ok(process),
                Err(e) => {
                    tracing::warn!(error = %e, "browser health check failed, relaunching");
                    Some(process)
                }
            },
            None => None,
        };

        let mut guard = self.process.lock().await;
        if let Some(process) = replacement(guard.as_ref(), stale.as_ref()) {
            return Ok(process);
        }
        let process = Arc::new(launch(&self.settings).await?);
        *guard = Some(Arc::clone(&process));
        Ok(process)
    }
}

/// The process installed since `stale` was observed, if any.
fn replacement<T>(installed: Option<&Arc<T>>, stale: Option<&Arc<T>>) -> Option<Arc<T>> {
    let installed = installed?;
    match stale {
        Some(stale) if Arc::ptr_eq(installed, stale) => None,
        _ => Some(Arc::clone(installed)),
    }
}

async fn launch(settings: &BrowserSettings) -> Result<BrowserProcess, SearchError> {
    tracing::info!(headless = settings.headless, "launching browser");

    let mut builder = BrowserConfig::builder()
        .request_timeout(settings.request_timeout())
        .args(LAUNCH_ARGS.iter().copied())
        .args(settings.extra_args.iter().cloned());
    if !settings.headless {
        builder = builder.with_head();
    }
    if let Some(path) = &settings.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    let config = builder
        .build()
        .map_err(|e| SearchError::Browser(format!("invalid browser config: {e}")))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| SearchError::Browser(format!("failed to launch browser: {e}")))?;

    let handler = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!(error = %e, "browser handler error");
            }
        }
        tracing::debug!("browser handler finished");
    });

    Ok(BrowserProcess { browser, handler })
}

impl PageRenderer for ChromiumRenderer {
    type Session = ChromiumSession;

    async fn open_session(&self, profile: &SessionProfile) -> Result<ChromiumSession, SearchError> {
        let process = self.process().await?;

        let context_id = process
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| SearchError::Browser(format!("failed to create browser context: {e}")))?
            .result
            .browser_context_id;

        // From here on the session's drop guard owns the context.
        let mut session = ChromiumSession {
            process,
            context_id: Some(context_id.clone()),
            page: None,
        };

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id)
            .build()
            .map_err(|e| SearchError::Browser(format!("invalid target params: {e}")))?;
        let page = session
            .process
            .browser
            .new_page(target)
            .await
            .map_err(|e| SearchError::Browser(format!("failed to open page: {e}")))?;

        apply_profile(&page, profile).await?;
        session.page = Some(page);
        Ok(session)
    }
}

async fn apply_profile(page: &Page, profile: &SessionProfile) -> Result<(), SearchError> {
    let browser_err = |e: chromiumoxide::error::CdpError| {
        SearchError::Browser(format!("failed to configure page: {e}"))
    };

    page.execute(SetUserAgentOverrideParams::new(profile.user_agent.clone()))
        .await
        .map_err(browser_err)?;
    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(profile.viewport.width),
        i64::from(profile.viewport.height),
        1.0,
        false,
    ))
    .await
    .map_err(browser_err)?;
    if !profile.javascript_enabled {
        page.execute(SetScriptExecutionDisabledParams::new(true))
            .await
            .map_err(browser_err)?;
    }
    if profile.ignore_https_errors {
        page.execute(SetIgnoreCertificateErrorsParams::new(true))
            .await
            .map_err(browser_err)?;
    }
    Ok(())
}

/// One browser context holding one page.
pub struct ChromiumSession {
    process: Arc<BrowserProcess>,
    context_id: Option<BrowserContextId>,
    page: Option<Page>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, SearchError> {
        self.page
            .as_ref()
            .ok_or_else(|| SearchError::Browser("session has no page".into()))
    }
}

impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<Option<u16>, SearchError> {
        let page = self.page()?;
        let nav_err = |e: chromiumoxide::error::CdpError| SearchError::Navigation(e.to_string());

        // Subscribe before navigating so the document response is not missed.
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(nav_err)?;

        let navigation = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(nav_err)?
            .result;
        // Chromium reports 4xx/5xx responses with an empty body as a
        // navigation error; the document status still wins if one arrived.
        if navigation.error_text.is_none() {
            loop {
                let state: String = page
                    .evaluate("document.readyState")
                    .await
                    .map_err(nav_err)?
                    .into_value()
                    .map_err(|e| SearchError::Parse(format!("document.readyState: {e}")))?;
                if state != "loading" {
                    break;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        let mut statuses = Vec::new();
        while let Some(Some(event)) = responses.next().now_or_never() {
            statuses.extend(document_status(&event, &navigation.frame_id));
        }
        navigation_outcome(statuses, navigation.error_text, url)
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), SearchError> {
        let page = self.page()?;
        while page.find_element(selector).await.is_err() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SearchError> {
        self.page()?
            .content()
            .await
            .map_err(|e| SearchError::Browser(format!("failed to read page content: {e}")))
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "failed to close page");
            }
        }
        if let Some(context_id) = self.context_id.take() {
            dispose_context(&self.process, context_id).await;
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        let Some(context_id) = self.context_id.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let process = Arc::clone(&self.process);
                handle.spawn(async move {
                    dispose_context(&process, context_id).await;
                });
            }
            Err(_) => {
                tracing::warn!("session dropped outside a runtime, browser context leaked");
            }
        }
    }
}

/// Status of `event` if it is the main-document response of `frame_id`.
fn document_status(event: &EventResponseReceived, frame_id: &FrameId) -> Option<u16> {
    if event.r#type == ResourceType::Document && event.frame_id.as_ref() == Some(frame_id) {
        u16::try_from(event.response.status).ok()
    } else {
        None
    }
}

/// Classify a navigation from the document statuses seen, in arrival order,
/// and the error text `Page.navigate` returned.
///
/// The last observed status wins, so a redirect chain reports its final
/// response. An error only surfaces when no document response arrived.
fn navigation_outcome(
    statuses: impl IntoIterator<Item = u16>,
    error_text: Option<String>,
    url: &str,
) -> Result<Option<u16>, SearchError> {
    match (statuses.into_iter().last(), error_text) {
        (Some(status), _) => Ok(Some(status)),
        (None, Some(error_text)) => Err(SearchError::Navigation(format!("{error_text} at {url}"))),
        (None, None) => Ok(None),
    }
}

async fn dispose_context(process: &BrowserProcess, context_id: BrowserContextId) {
    if let Err(e) = process
        .browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        tracing::debug!(error = %e, "failed to dispose browser context");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Viewport;

    #[test]
    fn launch_args_harden_the_browser() {
        for arg in ["--no-sandbox", "--disable-dev-shm-usage", "--ignore-certificate-errors"] {
            assert!(LAUNCH_ARGS.contains(&arg), "missing {arg}");
        }
    }

    #[test]
    fn empty_body_error_status_keeps_its_code() {
        let outcome = navigation_outcome(
            [404],
            Some("net::ERR_HTTP_RESPONSE_CODE_FAILURE".to_owned()),
            "https://a.com/missing",
        );
        assert_eq!(outcome.expect("status observed"), Some(404));
    }

    #[test]
    fn error_without_response_is_navigation_error() {
        let outcome = navigation_outcome(
            [],
            Some("net::ERR_NAME_NOT_RESOLVED".to_owned()),
            "https://nowhere.invalid/",
        );
        match outcome {
            Err(SearchError::Navigation(message)) => {
                assert_eq!(message, "net::ERR_NAME_NOT_RESOLVED at https://nowhere.invalid/");
            }
            other => panic!("expected navigation error, got {other:?}"),
        }
    }

    #[test]
    fn redirect_chain_reports_final_status() {
        let outcome = navigation_outcome([301, 200], None, "https://a.com/");
        assert_eq!(outcome.expect("ok"), Some(200));
    }

    #[test]
    fn no_document_response_is_none() {
        let outcome = navigation_outcome([], None, "https://a.com/");
        assert_eq!(outcome.expect("ok"), None);
    }

    #[test]
    fn relaunch_is_shared_by_queued_sessions() {
        let old = Arc::new(1);
        let relaunched = Arc::new(2);

        // Nothing installed: launch.
        assert!(replacement::<i32>(None, None).is_none());
        // The failed process is still installed: relaunch.
        assert!(replacement(Some(&old), Some(&old)).is_none());
        // Another session already relaunched: reuse it.
        let reused = replacement(Some(&relaunched), Some(&old)).expect("reuse");
        assert!(Arc::ptr_eq(&reused, &relaunched));
        // First launch raced with another session: reuse it.
        let reused = replacement(Some(&relaunched), None).expect("reuse");
        assert!(Arc::ptr_eq(&reused, &relaunched));
    }

    #[tokio::test]
    async fn renderer_is_lazy() {
        let renderer = ChromiumRenderer::new(BrowserSettings::default());
        assert!(renderer.process.lock().await.is_none());
        // Shutting down a renderer that never launched is a no-op.
        renderer.shutdown().await;
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome or Chromium"]
    async fn renders_a_live_page() {
        let renderer = ChromiumRenderer::new(BrowserSettings::default());
        let profile = SessionProfile {
            user_agent: crate::http::random_user_agent().to_owned(),
            viewport: Viewport::default(),
            javascript_enabled: true,
            ignore_https_errors: true,
        };
        let mut session = renderer.open_session(&profile).await.expect("session");
        let status = session.navigate("https://example.com/").await.expect("navigate");
        assert_eq!(status, Some(200));
        session.wait_for_selector("body").await.expect("body");
        let html = session.content().await.expect("content");
        assert!(html.contains("Example Domain"));
        session.close().await;
        renderer.shutdown().await;
    }
}
