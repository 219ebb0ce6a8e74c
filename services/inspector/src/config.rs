use std::time::Duration;

use anyhow::{bail, Context, Result};
use curation::{SessionConfig, Size};
use dataset_api::ClientConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub viewport: Size,
    pub menu: Size,
    pub log_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = var("INSPECTOR_API_URL").context("Missing required env var: INSPECTOR_API_URL")?;

        let timeout_secs: u64 = match var("INSPECTOR_TIMEOUT_SECS") {
            Some(v) => v.parse().context("INSPECTOR_TIMEOUT_SECS must be a whole number of seconds")?,
            None => 30,
        };
        let viewport = match var("INSPECTOR_VIEWPORT") {
            Some(v) => parse_size(&v).context("INSPECTOR_VIEWPORT must look like 1280x720")?,
            None => Size::new(1280, 720),
        };
        let menu = match var("INSPECTOR_MENU_SIZE") {
            Some(v) => parse_size(&v).context("INSPECTOR_MENU_SIZE must look like 220x96")?,
            None => Size::new(220, 96),
        };
        let log_capacity: usize = match var("INSPECTOR_LOG_CAPACITY") {
            Some(v) => v.parse().context("INSPECTOR_LOG_CAPACITY must be a number")?,
            None => 500,
        };

        // fail fast, fail loud
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            bail!("INSPECTOR_API_URL must start with http:// or https://");
        }
        if timeout_secs == 0 {
            bail!("INSPECTOR_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            viewport,
            menu,
            log_capacity,
        })
    }

    pub fn client(&self) -> ClientConfig {
        ClientConfig { base_url: self.api_url.clone(), timeout: self.timeout }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig { viewport: self.viewport, menu: self.menu, log_capacity: self.log_capacity }
    }
}

/// `WIDTHxHEIGHT`, both positive.
fn parse_size(s: &str) -> Result<Size> {
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .with_context(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: i32 = w.trim().parse().with_context(|| format!("bad width in {s:?}"))?;
    let height: i32 = h.trim().parse().with_context(|| format!("bad height in {s:?}"))?;
    if width <= 0 || height <= 0 {
        bail!("size must be positive, got {s:?}");
    }
    Ok(Size::new(width, height))
}
