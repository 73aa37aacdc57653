// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use shadowrecon::core::cancel::CancelSignal;
use shadowrecon::core::models::ProbeResult;
use shadowrecon::core::probe::{ProbeRequest, Prober};
use shadowrecon::core::scanner::ScanContext;
use shadowrecon::core::wordlists::{BuiltinWordlists, WordlistProvider};

/// A `Prober` backed by a closure, recording every URL it was asked for.
pub struct FnProber<F> {
    respond: F,
    requests: Mutex<Vec<String>>,
}

impl<F> FnProber<F>
where
    F: Fn(&ProbeRequest) -> ProbeResult + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self { respond, requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> Prober for FnProber<F>
where
    F: Fn(&ProbeRequest) -> ProbeResult + Send + Sync,
{
    async fn request(&self, request: ProbeRequest) -> ProbeResult {
        self.requests.lock().unwrap().push(request.url.to_string());
        (self.respond)(&request)
    }
}

/// Answers 200 for the given paths and 404 for everything else.
pub fn paths_prober(found: &[&str]) -> FnProber<impl Fn(&ProbeRequest) -> ProbeResult + Send + Sync> {
    let found: HashSet<String> = found.iter().map(|p| p.to_string()).collect();
    FnProber::new(move |request: &ProbeRequest| {
        let status = if found.contains(request.url.path()) { 200 } else { 404 };
        html(request, status, "<html><body>ok</body></html>")
    })
}

pub fn html(request: &ProbeRequest, status: u16, body: &str) -> ProbeResult {
    let headers = HashMap::from([("content-type".to_string(), "text/html".to_string())]);
    ProbeResult::response(request.url.as_str(), status, headers, body)
}

/// Built-in lists with some categories replaced.
#[derive(Default)]
pub struct StaticWordlists {
    lists: HashMap<&'static str, Vec<String>>,
}

impl StaticWordlists {
    pub fn with(mut self, category: &'static str, words: &[&str]) -> Self {
        self.lists.insert(category, words.iter().map(|w| w.to_string()).collect());
        self
    }
}

impl WordlistProvider for StaticWordlists {
    fn get(&self, category: &str) -> Vec<String> {
        match self.lists.get(category) {
            Some(words) => words.clone(),
            None => BuiltinWordlists.get(category),
        }
    }
}

pub fn context<'a>(
    prober: &'a dyn Prober,
    wordlists: &'a dyn WordlistProvider,
    schemes: &'a [String],
    cancel: &'a CancelSignal,
) -> ScanContext<'a> {
    ScanContext { prober, wordlists, concurrency: 10, retries: 0, deep: false, schemes, cancel }
}

pub fn https() -> Vec<String> {
    vec!["https".to_string()]
}
