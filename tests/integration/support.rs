//! Shared test doubles

use async_trait::async_trait;
use handmade_crawler::crawler::{
    CrawlEngine, EngineSettings, FetchError, FetchResponse, Fetcher, HtmlLinkExtractor,
};
use handmade_crawler::storage::MemoryStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A fetcher that answers from a script and records every request
///
/// URLs without a scripted answer get an empty 404.
#[derive(Debug, Clone, Default)]
pub struct FakeFetcher {
    responses: Arc<Mutex<HashMap<String, Result<FetchResponse, FetchError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn respond(self, url: &str, result: Result<FetchResponse, FetchError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), result);
        self
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.respond(
            url,
            Ok(FetchResponse::new(
                200,
                [("Content-Type", "text/html; charset=utf-8")],
                body,
            )),
        )
    }

    pub fn robots(self, host_origin: &str, body: &str) -> Self {
        let url = format!("{}/robots.txt", host_origin);
        self.respond(
            &url,
            Ok(FetchResponse::new(200, [("Content-Type", "text/plain")], body)),
        )
    }

    pub fn status(self, url: &str, status: u16, content_type: &str) -> Self {
        self.respond(
            url,
            Ok(FetchResponse::new(status, [("Content-Type", content_type)], "")),
        )
    }

    pub fn unreachable(self, url: &str) -> Self {
        self.respond(
            url,
            Err(FetchError::Unreachable {
                url: url.to_string(),
                reason: "dns error: no such host".to_string(),
            }),
        )
    }

    pub fn transport_error(self, url: &str) -> Self {
        self.respond(
            url,
            Err(FetchError::Transport {
                url: url.to_string(),
                reason: "invalid HTTP response".to_string(),
            }),
        )
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| *r == url).count()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(FetchResponse::new(404, Vec::<(String, String)>::new(), "")))
    }
}

pub type TestEngine = CrawlEngine<FakeFetcher, HtmlLinkExtractor, MemoryStore>;

pub fn engine(fetcher: &FakeFetcher, store: MemoryStore) -> TestEngine {
    engine_with(fetcher, store, EngineSettings::default())
}

pub fn engine_with(fetcher: &FakeFetcher, store: MemoryStore, settings: EngineSettings) -> TestEngine {
    CrawlEngine::from_store(fetcher.clone(), HtmlLinkExtractor::new(), store, settings).unwrap()
}
