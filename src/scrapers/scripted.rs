//! Session provider that replays scripted pages instead of driving a browser.
//!
//! Steps are consumed in navigation order, so the n-th `navigate` call gets
//! the n-th step regardless of the URL. Every call is recorded in a shared
//! [`SessionLog`] for assertions.

use crate::error::BrowserError;
use crate::scrapers::dom::{self, HtmlElement};
use crate::scrapers::traits::{BrowserPage, SessionProvider};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// What the next navigation produces
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// Navigation succeeds and the page renders this HTML
    Page(String),
    /// Navigation exceeds its time budget
    Timeout,
    /// Navigation fails outright
    Fail(String),
    /// Navigation succeeds but every DOM query errors
    BrokenDom(String),
}

#[derive(Debug, Default, Clone)]
pub struct SessionLog {
    pub acquired: usize,
    pub released: usize,
    pub navigations: Vec<String>,
    pub timeouts: Vec<Duration>,
}

pub struct ScriptedSession {
    steps: Vec<ScriptedStep>,
    fail_acquire: bool,
    log: Arc<Mutex<SessionLog>>,
}

impl ScriptedSession {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps,
            fail_acquire: false,
            log: Arc::default(),
        }
    }

    /// A provider whose pages can never be opened
    pub fn unavailable() -> Self {
        Self {
            fail_acquire: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn log(&self) -> SessionLog {
        lock(&self.log).clone()
    }
}

#[async_trait]
impl SessionProvider for ScriptedSession {
    type Page = ScriptedPage;

    async fn acquire_page(&self) -> Result<ScriptedPage, BrowserError> {
        if self.fail_acquire {
            return Err(BrowserError::Session("no browser available".to_string()));
        }
        lock(&self.log).acquired += 1;
        Ok(ScriptedPage {
            steps: self.steps.clone(),
            state: Mutex::default(),
            log: Arc::clone(&self.log),
        })
    }

    fn release_page(&self, _page: ScriptedPage) {
        lock(&self.log).released += 1;
    }
}

#[derive(Debug, Default)]
struct PageState {
    cursor: usize,
    loaded: Option<ScriptedStep>,
    rendered: Option<ScriptedStep>,
}

pub struct ScriptedPage {
    steps: Vec<ScriptedStep>,
    state: Mutex<PageState>,
    log: Arc<Mutex<SessionLog>>,
}

impl ScriptedPage {
    fn rendered_html(&self, selector: &str) -> Result<String, BrowserError> {
        match &lock(&self.state).rendered {
            Some(ScriptedStep::Page(html)) => Ok(html.clone()),
            Some(ScriptedStep::BrokenDom(reason)) => Err(query_error(selector, reason)),
            _ => Err(query_error(selector, "page has not been rendered")),
        }
    }

    fn check_dom(&self, selector: &str) -> Result<(), BrowserError> {
        self.rendered_html(selector).map(|_| ())
    }
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    type Element = HtmlElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        {
            let mut log = lock(&self.log);
            log.navigations.push(url.to_string());
            log.timeouts.push(timeout);
        }

        let mut state = lock(&self.state);
        let step = self.steps.get(state.cursor).cloned();
        state.cursor += 1;
        state.rendered = None;
        match step {
            Some(ScriptedStep::Timeout) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
            Some(ScriptedStep::Fail(reason)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason,
            }),
            Some(step) => {
                state.loaded = Some(step);
                Ok(())
            }
            None => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "no scripted page left".to_string(),
            }),
        }
    }

    async fn wait_for_network_idle(&self) -> Result<(), BrowserError> {
        let mut state = lock(&self.state);
        state.rendered = state.loaded.take();
        Ok(())
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<HtmlElement>, BrowserError> {
        let html = self.rendered_html(selector)?;
        dom::select_all(&html, selector)
    }

    async fn query_selector(
        &self,
        element: &HtmlElement,
        selector: &str,
    ) -> Result<Option<HtmlElement>, BrowserError> {
        self.check_dom(selector)?;
        element.select_first(selector)
    }

    async fn get_attribute(
        &self,
        element: &HtmlElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.check_dom(name)?;
        Ok(element.attribute(name))
    }

    async fn inner_text(&self, element: &HtmlElement) -> Result<String, BrowserError> {
        Ok(element.inner_text())
    }
}

fn query_error(selector: &str, reason: &str) -> BrowserError {
    BrowserError::Query {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
