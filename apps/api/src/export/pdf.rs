//! PDF rendering of a resume through headless Chrome.
//!
//! The artboard's print view is loaded in a headless tab, each layout page
//! is captured as its own PDF at the page element's natural dimensions, and
//! the per-page documents are merged into one file. Chrome disconnects are
//! common enough under load that captures retry on the known transient
//! failure signatures; anything else fails the request immediately.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{info, warn};

use crate::document::Resume;
use crate::errors::AppError;
use crate::export::merge::merge_pdfs;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);
const FONT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const FONT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const PX_PER_INCH: f64 = 96.0;

/// Chrome failure signatures worth retrying: the browser or its CDP channel
/// went away mid-capture. Render errors in the page itself are not here.
const TRANSIENT_SIGNATURES: [&str; 6] = [
    "frame was detached",
    "Target closed",
    "Session closed",
    "Protocol error",
    "WebSocket",
    "ECONNRESET",
];

pub fn is_transient_failure(message: &str) -> bool {
    TRANSIENT_SIGNATURES.iter().any(|s| message.contains(s))
}

pub struct PdfExporter {
    artboard_url: String,
}

impl PdfExporter {
    pub fn new(artboard_url: impl Into<String>) -> Self {
        PdfExporter {
            artboard_url: artboard_url.into(),
        }
    }

    fn print_url(&self, resume: &Resume) -> String {
        format!(
            "{}/{}/printer",
            self.artboard_url.trim_end_matches('/'),
            resume.id
        )
    }

    /// Renders `resume` to a single merged PDF.
    pub async fn export(&self, resume: &Resume) -> Result<Vec<u8>, AppError> {
        let url = self.print_url(resume);
        let page_count = resume.data.metadata.layout.len();
        let custom_css = resume
            .data
            .metadata
            .css
            .visible
            .then(|| resume.data.metadata.css.value.clone());

        let mut attempt = 1;
        loop {
            let url = url.clone();
            let custom_css = custom_css.clone();
            let result =
                tokio::task::spawn_blocking(move || capture(&url, page_count, custom_css.as_deref()))
                    .await
                    .map_err(|e| AppError::Internal(e.into()))?;

            match result {
                Ok(bytes) => {
                    info!(resume_id = %resume.id, pages = page_count, "pdf rendered");
                    return Ok(bytes);
                }
                Err(e) if attempt < MAX_ATTEMPTS && is_transient_failure(&format!("{e:#}")) => {
                    warn!(attempt, error = %e, "transient capture failure, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(AppError::Render(format!("{e:#}"))),
            }
        }
    }
}

/// One full capture pass: navigate, gate on fonts, inject CSS, print each
/// layout page, merge. Runs on the blocking pool.
fn capture(url: &str, page_count: usize, custom_css: Option<&str>) -> Result<Vec<u8>> {
    let browser = Browser::new(LaunchOptions {
        headless: true,
        window_size: Some((1920, 1080)),
        ..Default::default()
    })
    .map_err(|e| anyhow!("failed to launch browser: {e}"))?;

    let tab = browser.new_tab().map_err(|e| anyhow!("{e}"))?;
    tab.navigate_to(url).map_err(|e| anyhow!("{e}"))?;
    tab.wait_until_navigated().map_err(|e| anyhow!("{e}"))?;

    wait_for_fonts(&tab);

    if let Some(css) = custom_css {
        inject_css(&tab, css)?;
    }

    let mut page_pdfs = Vec::with_capacity(page_count);
    for page in 0..page_count {
        let (width_px, height_px) = page_dimensions(&tab, page)?;
        let pdf = tab
            .print_to_pdf(Some(PrintToPdfOptions {
                print_background: Some(true),
                paper_width: Some(width_px / PX_PER_INCH),
                paper_height: Some(height_px / PX_PER_INCH),
                margin_top: Some(0.0),
                margin_bottom: Some(0.0),
                margin_left: Some(0.0),
                margin_right: Some(0.0),
                page_ranges: Some(format!("{}", page + 1)),
                ..Default::default()
            }))
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("printing page {page}"))?;
        page_pdfs.push(pdf);
    }

    merge_pdfs(page_pdfs)
}

/// Blocks until `document.fonts` settles or the timeout expires. Expiry
/// degrades to fallback fonts rather than failing the export.
fn wait_for_fonts(tab: &headless_chrome::Tab) {
    let deadline = std::time::Instant::now() + FONT_WAIT_TIMEOUT;
    loop {
        let loaded = tab
            .evaluate("document.fonts.status === 'loaded'", false)
            .ok()
            .and_then(|r| r.value)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if loaded {
            return;
        }
        if std::time::Instant::now() >= deadline {
            warn!("fonts not ready in time, printing with fallback fonts");
            return;
        }
        std::thread::sleep(FONT_POLL_INTERVAL);
    }
}

fn inject_css(tab: &headless_chrome::Tab, css: &str) -> Result<()> {
    let script = format!(
        "const style = document.createElement('style'); \
         style.textContent = {}; \
         document.head.appendChild(style); true",
        serde_json::to_string(css)?
    );
    tab.evaluate(&script, false).map_err(|e| anyhow!("{e}"))?;
    Ok(())
}

/// Natural CSS-pixel dimensions of the page element with the given index.
fn page_dimensions(tab: &headless_chrome::Tab, page: usize) -> Result<(f64, f64)> {
    let script = format!(
        "const el = document.querySelectorAll('[data-page]')[{page}]; \
         JSON.stringify({{ w: el.scrollWidth, h: el.scrollHeight }})"
    );
    let raw = tab
        .evaluate(&script, false)
        .map_err(|e| anyhow!("{e}"))?
        .value
        .ok_or_else(|| anyhow!("page {page} not found in print view"))?;
    let dims: serde_json::Value =
        serde_json::from_str(raw.as_str().ok_or_else(|| anyhow!("bad dimensions payload"))?)?;
    let width = dims["w"].as_f64().ok_or_else(|| anyhow!("bad page width"))?;
    let height = dims["h"].as_f64().ok_or_else(|| anyhow!("bad page height"))?;
    Ok((width, height))
}
