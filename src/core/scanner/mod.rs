// src/core/scanner/mod.rs

// Discovery engines, the crawler and the passive analyzers. Each engine
// implements one of the role traits below so the orchestrator can swap in
// alternatives (or test doubles) without caring how discovery happens.
pub mod crawler;
pub mod directory_scanner;
pub mod dns_scanner;
pub mod fingerprint_scanner;
pub mod parameter_scanner;
pub mod ssl_scanner;
pub mod subdomain_scanner;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::future::{self as std_future, Future};

use crate::core::cancel::CancelSignal;
use crate::core::error::ScanError;
use crate::core::models::{DirectoryFinding, ParameterFinding, Technology};
use crate::core::probe::Prober;
use crate::core::target::Target;
use crate::core::wordlists::WordlistProvider;

use self::crawler::CrawlReport;

// --- Shared Context ---

/// Everything a stage borrows from the orchestrator for the length of one target.
#[derive(Clone, Copy)]
pub struct ScanContext<'a> {
    pub prober: &'a dyn Prober,
    pub wordlists: &'a dyn WordlistProvider,
    /// Upper bound on concurrently dispatched units of work.
    pub concurrency: usize,
    pub retries: u32,
    pub deep: bool,
    pub schemes: &'a [String],
    pub cancel: &'a CancelSignal,
}

/// What a discovery engine found, plus how many candidates it tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery<T> {
    pub findings: Vec<T>,
    pub probed: usize,
    pub failed: usize,
}

impl<T> Discovery<T> {
    pub fn empty() -> Self {
        Self { findings: Vec::new(), probed: 0, failed: 0 }
    }
}

// --- Role Traits ---

#[async_trait]
pub trait SubdomainSource: Send + Sync {
    async fn discover(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Discovery<String>, ScanError>;
}

#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn discover(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Discovery<DirectoryFinding>, ScanError>;
}

#[async_trait]
pub trait ParameterSource: Send + Sync {
    async fn discover(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Discovery<ParameterFinding>, ScanError>;
}

#[async_trait]
pub trait TechnologySource: Send + Sync {
    async fn detect(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Vec<Technology>, ScanError>;
}

#[async_trait]
pub trait CrawlSource: Send + Sync {
    async fn crawl(&self, target: &Target, ctx: ScanContext<'_>) -> Result<CrawlReport, ScanError>;
}

// --- Fan-out Helpers ---

/// Runs `task` over `items` with at most `concurrency` futures in flight,
/// collecting results in completion order. No new item starts once `cancel`
/// is raised.
pub async fn fan_out<I, F, Fut>(items: I, concurrency: usize, cancel: &CancelSignal, task: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items)
        .take_while(|_| std_future::ready(!cancel.is_cancelled()))
        .map(task)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

/// Like `fan_out`, but results come back in input order.
pub async fn fan_out_ordered<I, F, Fut>(items: I, concurrency: usize, cancel: &CancelSignal, task: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items)
        .take_while(|_| std_future::ready(!cancel.is_cancelled()))
        .map(task)
        .buffered(concurrency.max(1))
        .collect()
        .await
}
