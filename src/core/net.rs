// src/core/net.rs
// Blocking HTTP implementation of the page-fetch capability.
//
// A plain GET returns the server-rendered page, so the marker is checked
// against the body `navigate` already fetched. While it is missing the URL is
// re-fetched at most `max_repolls` times, doubling the delay each time and
// never past the timeout. A block page costs a handful of requests, not one
// every poll interval.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;

use crate::config::consts::{MAX_MARKER_REPOLLS, POLL_INTERVAL_MS};
use crate::config::SiteOptions;
use crate::error::FetchError;
use crate::fetch::{Marker, PageFetcher};

pub struct HttpFetcher {
    client: Option<Client>,
    url: Option<String>,
    body: Option<String>,
    poll: Duration,
    max_repolls: u32,
}

impl HttpFetcher {
    pub fn new(site: &SiteOptions, request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(site.user_agent.as_str())
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::Startup(e.to_string()))?;
        Ok(Self {
            client: Some(client),
            url: None,
            body: None,
            poll: Duration::from_millis(POLL_INTERVAL_MS),
            max_repolls: MAX_MARKER_REPOLLS,
        })
    }

    /// First re-poll delay; later ones double.
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// `0` means the marker is checked against the navigated body only.
    pub fn with_max_repolls(mut self, max_repolls: u32) -> Self {
        self.max_repolls = max_repolls;
        self
    }

    fn get(&self, url: &str) -> Result<String, FetchError> {
        let client = self.client.as_ref().ok_or(FetchError::Closed)?;
        let resp = client
            .get(url)
            .send()
            .map_err(|source| FetchError::Http { url: s!(url), source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: s!(url), status: status.as_u16() });
        }
        resp.text().map_err(|source| FetchError::Http { url: s!(url), source })
    }
}

impl PageFetcher for HttpFetcher {
    fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        logd!("GET {url}");
        self.body = None;
        self.url = Some(s!(url));
        self.body = Some(self.get(url)?);
        Ok(())
    }

    fn wait_for(&mut self, marker: &Marker, timeout: Duration) -> Result<bool, FetchError> {
        let url = self.url.clone().ok_or(FetchError::NotNavigated)?;
        let started = Instant::now();
        let mut delay = self.poll;
        let mut repolls = 0u32;
        loop {
            if self.body.as_deref().is_some_and(|b| marker.is_present(b)) {
                return Ok(true);
            }
            if repolls >= self.max_repolls || started.elapsed() + delay > timeout {
                logd!("{} missing on {url} after {repolls} re-polls", marker.name());
                return Ok(false);
            }
            thread::sleep(delay);
            repolls += 1;
            delay = delay.saturating_mul(2);
            logd!("re-polling {url} for {} ({repolls}/{})", marker.name(), self.max_repolls);
            self.body = Some(self.get(&url)?);
        }
    }

    fn markup(&self) -> Result<String, FetchError> {
        if self.client.is_none() {
            return Err(FetchError::Closed);
        }
        self.body.clone().ok_or(FetchError::NotNavigated)
    }

    fn close(&mut self) {
        self.client = None;
        self.body = None;
        self.url = None;
    }
}
