// src/fetch.rs
//! Page-fetch capability.
//!
//! The pipeline only needs "go to URL", "wait until the page looks loaded",
//! and "give me the markup". [`PageFetcher`] is that seam; `core::net`
//! provides the HTTP implementation and tests script their own.
//!
//! A run owns exactly one fetcher, wrapped in a [`Session`] so it is closed on
//! every exit path.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::error::FetchError;
use crate::specs;

/// What "the page is ready" means for a given page kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Index page: at least one link under the hero path prefix.
    HeroLinks { prefix: String },
    /// Counters page: a win-rate/matches table with enough rows.
    MatchupTable,
}

impl Marker {
    pub fn name(&self) -> &'static str {
        match self {
            Marker::HeroLinks { .. } => "hero-links",
            Marker::MatchupTable => "matchup-table",
        }
    }

    pub fn is_present(&self, markup: &str) -> bool {
        match self {
            Marker::HeroLinks { prefix } => specs::heroes::has_hero_links(markup, prefix),
            Marker::MatchupTable => specs::counters::has_ready_table(markup),
        }
    }
}

pub trait PageFetcher {
    /// Load `url`, replacing whatever page was loaded before.
    fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Block until `marker` is present in the current page or `timeout`
    /// elapses. `Ok(false)` means the wait ran out.
    fn wait_for(&mut self, marker: &Marker, timeout: Duration) -> Result<bool, FetchError>;

    /// Raw markup of the current page.
    fn markup(&self) -> Result<String, FetchError>;

    /// Release the underlying resource. Must be idempotent.
    fn close(&mut self);
}

/// Navigate, wait for `marker`, and return the markup.
/// A wait that runs out is a transient [`FetchError::MarkerTimeout`].
pub fn fetch_page<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    url: &str,
    marker: &Marker,
    timeout: Duration,
) -> Result<String, FetchError> {
    fetcher.navigate(url)?;
    if !fetcher.wait_for(marker, timeout)? {
        return Err(FetchError::MarkerTimeout {
            url: s!(url),
            marker: marker.name(),
            secs: timeout.as_secs(),
        });
    }
    fetcher.markup()
}

/// Exclusively owned fetcher; closed when dropped.
pub struct Session<F: PageFetcher> {
    inner: F,
}

impl<F: PageFetcher> Session<F> {
    pub fn open(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: PageFetcher> Deref for Session<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.inner
    }
}

impl<F: PageFetcher> DerefMut for Session<F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.inner
    }
}

impl<F: PageFetcher> Drop for Session<F> {
    fn drop(&mut self) {
        logd!("closing fetch session");
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe {
        closed: Rc<Cell<u32>>,
        page: Option<String>,
        ready: bool,
    }

    impl PageFetcher for Probe {
        fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
            self.page = Some(format!("<html>{url}</html>"));
            Ok(())
        }
        fn wait_for(&mut self, _marker: &Marker, _timeout: Duration) -> Result<bool, FetchError> {
            Ok(self.ready)
        }
        fn markup(&self) -> Result<String, FetchError> {
            self.page.clone().ok_or(FetchError::NotNavigated)
        }
        fn close(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    #[test]
    fn session_closes_on_drop_even_when_unwinding() {
        let closed = Rc::new(Cell::new(0));
        {
            let _s = Session::open(Probe { closed: closed.clone(), page: None, ready: true });
        }
        assert_eq!(closed.get(), 1);

        let closed2 = Rc::new(Cell::new(0));
        let c = closed2.clone();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _s = Session::open(Probe { closed: c, page: None, ready: true });
            panic!("boom");
        }));
        assert!(res.is_err());
        assert_eq!(closed2.get(), 1);
    }

    #[test]
    fn fetch_page_reports_marker_timeout() {
        let mut p = Probe { closed: Rc::new(Cell::new(0)), page: None, ready: false };
        let err = fetch_page(&mut p, "https://x/heroes/axe/counters", &Marker::MatchupTable, Duration::from_secs(3))
            .unwrap_err();
        assert!(matches!(err, FetchError::MarkerTimeout { secs: 3, .. }));

        p.ready = true;
        let html = fetch_page(&mut p, "u", &Marker::MatchupTable, Duration::from_secs(3)).unwrap();
        assert_eq!(html, "<html>u</html>");
    }
}
