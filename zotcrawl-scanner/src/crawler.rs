use crate::error::{Result, ScanError};
use crate::extractor::LinkExtractor;
use crate::filter::{CrawlTarget, ScopePolicy};
use crate::normalize::normalize_absolute;
use crate::result::{CrawlResult, FetchResult, PageRecord};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(CrawlResult) + Send + Sync>;
pub type PageCallback = Arc<dyn Fn(PageRecord) + Send + Sync>;

const USER_AGENT: &str = "zotcrawl/0.1 (UCI ICS scoped crawler)";
const MAX_REDIRECTS: usize = 5;
const MAX_EMPTY_ITERATIONS: usize = 10;

type WorkItem = (String, usize);

pub struct Crawler {
    extractor: LinkExtractor,
    visited: Arc<Mutex<HashSet<String>>>,
    results: Arc<Mutex<Vec<CrawlResult>>>,
    max_depth: usize,
    max_pages: Option<usize>,
    timeout_secs: u64,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    page_callback: Option<PageCallback>,
}

/// State shared by every worker of one crawl.
struct WorkerContext {
    client: Client,
    extractor: LinkExtractor,
    queues: Vec<Mutex<VecDeque<WorkItem>>>,
    visited: Arc<Mutex<HashSet<String>>>,
    results: Arc<Mutex<Vec<CrawlResult>>>,
    in_flight: AtomicUsize,
    fetched: AtomicUsize,
    max_depth: usize,
    max_pages: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    page_callback: Option<PageCallback>,
}

struct FetchedPage {
    fetch: FetchResult,
    content_type: Option<String>,
    content_length: Option<u64>,
    response_time: Duration,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            extractor: LinkExtractor::new(),
            visited: Arc::new(Mutex::new(HashSet::new())),
            results: Arc::new(Mutex::new(Vec::new())),
            max_depth: 3,
            max_pages: None,
            timeout_secs: timeout_secs.max(1),
            progress_callback: None,
            result_callback: None,
            page_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Stop fetching once this many pages have been requested.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_policy(mut self, policy: ScopePolicy) -> Self {
        self.extractor = self.extractor.with_policy(policy);
        self
    }

    pub fn with_minimum_words(mut self, minimum_words: usize) -> Self {
        self.extractor = self.extractor.with_minimum_words(minimum_words);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn with_page_callback(mut self, callback: PageCallback) -> Self {
        self.page_callback = Some(callback);
        self
    }

    fn build_client(&self) -> Result<Client> {
        // Redirects are followed only while they stay in scope.
        let policy = self.extractor.policy().clone();
        let redirect = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if policy.classify(attempt.url()).is_admit() {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect)
            .build()?;
        Ok(client)
    }

    pub async fn crawl(&self, seeds: &[String], workers: usize) -> Result<Vec<CrawlResult>> {
        let workers = workers.max(1);
        info!(
            "Starting crawl of {} seed(s) with {} workers",
            seeds.len(),
            workers
        );

        let mut frontier: Vec<CrawlTarget> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let url = normalize_absolute(seed)?;
            let target = self
                .extractor
                .policy()
                .admit(url)
                .map_err(|verdict| ScanError::SeedRejected {
                    url: seed.clone(),
                    verdict,
                })?;
            frontier.push(target);
        }

        let context = Arc::new(WorkerContext {
            client: self.build_client()?,
            extractor: self.extractor.clone(),
            queues: (0..workers).map(|_| Mutex::new(VecDeque::new())).collect(),
            visited: self.visited.clone(),
            results: self.results.clone(),
            in_flight: AtomicUsize::new(0),
            fetched: AtomicUsize::new(0),
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            progress_callback: self.progress_callback.clone(),
            result_callback: self.result_callback.clone(),
            page_callback: self.page_callback.clone(),
        });

        // Seeds are spread over the worker queues at depth 0
        let seed_urls: Vec<String> = frontier.into_iter().map(String::from).collect();
        context.enqueue(seed_urls, 0).await;

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| tokio::spawn(run_worker(context.clone(), worker_id)))
            .collect();

        for outcome in futures::future::join_all(handles).await {
            outcome?;
        }

        let results = self.results.lock().await;
        info!("Crawl complete. Visited {} URLs", results.len());
        Ok(results.clone())
    }

    pub async fn get_visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(context: Arc<WorkerContext>, worker_id: usize) {
    debug!("Worker {} started", worker_id);
    let mut empty_iterations = 0;

    loop {
        let Some((url, depth)) = context.next_item(worker_id).await else {
            // Only stop once nobody holds work that could still produce links
            if context.in_flight.load(Ordering::SeqCst) == 0 && context.all_queues_empty().await {
                empty_iterations += 1;
                if empty_iterations >= MAX_EMPTY_ITERATIONS {
                    break;
                }
            } else {
                empty_iterations = 0;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        };

        empty_iterations = 0;
        context.process(worker_id, url, depth).await;
        context.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    debug!("Worker {} finished", worker_id);
}

impl WorkerContext {
    /// Pop from the worker's own queue, or steal from the back of another.
    async fn next_item(&self, worker_id: usize) -> Option<WorkItem> {
        let count = self.queues.len();
        for offset in 0..count {
            let Some(queue) = self.queues.get((worker_id + offset) % count) else {
                continue;
            };
            let mut queue = queue.lock().await;
            let item = if offset == 0 {
                queue.pop_front()
            } else {
                queue.pop_back()
            };
            if item.is_some() {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                return item;
            }
        }
        None
    }

    async fn all_queues_empty(&self) -> bool {
        for queue in &self.queues {
            if !queue.lock().await.is_empty() {
                return false;
            }
        }
        true
    }

    /// Mark unseen URLs visited and distribute them round-robin.
    async fn enqueue(&self, urls: Vec<String>, depth: usize) {
        let mut target_worker = 0;
        for url in urls {
            let is_new = self.visited.lock().await.insert(url.clone());
            if !is_new {
                continue;
            }
            if let Some(queue) = self.queues.get(target_worker) {
                queue.lock().await.push_back((url, depth));
            }
            target_worker = (target_worker + 1) % self.queues.len();
        }
    }

    async fn process(&self, worker_id: usize, url: String, depth: usize) {
        if depth >= self.max_depth {
            debug!("Skipping {} at depth {}", url, depth);
            self.record(CrawlResult::skipped(url, worker_id, depth)).await;
            return;
        }
        let slot = self.fetched.fetch_add(1, Ordering::SeqCst);
        if self.max_pages.is_some_and(|max| slot >= max) {
            debug!("Page budget exhausted, skipping {}", url);
            self.record(CrawlResult::skipped(url, worker_id, depth)).await;
            return;
        }

        if let Some(ref callback) = self.progress_callback {
            callback(worker_id, url.clone());
        }

        let result = match fetch_page(&self.client, &url).await {
            Ok(page) => {
                // Links resolve against where the redirects ended up
                if page.fetch.url != url {
                    debug!("{} redirected to {}", url, page.fetch.url);
                    self.visited.lock().await.insert(page.fetch.url.clone());
                }
                let extraction = self.extractor.extract(&page.fetch.url, &page.fetch);

                let mut result = CrawlResult::new(url.clone(), worker_id, depth);
                result.status_code = page.fetch.status;
                result.content_type = page.content_type;
                result.content_length = page.content_length;
                result.response_time = page.response_time;
                result.links_found = extraction.link_strings();

                if let Some(record) = extraction.record {
                    result.page_stored = true;
                    if let Some(ref callback) = self.page_callback {
                        callback(record);
                    }
                }

                debug!(
                    "[Worker {}] {} gave {} admitted links",
                    worker_id,
                    url,
                    result.links_found.len()
                );
                self.enqueue(result.links_found.clone(), depth + 1).await;
                result
            }
            Err(e) => {
                warn!("Crawl error for {}: {}", url, e);
                CrawlResult::with_error(url, worker_id, depth, e.to_string())
            }
        };

        self.record(result).await;
    }

    async fn record(&self, result: CrawlResult) {
        if let Some(ref callback) = self.result_callback {
            callback(result.clone());
        }
        self.results.lock().await.push(result);
    }
}

async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    debug!("Fetching {}", url);

    let start = Instant::now();
    let response = client.get(url).send().await?;
    let response_time = start.elapsed();

    let final_url = response.url().to_string();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let content_length = response.content_length();

    // Only HTML bodies are read; an untyped body is assumed to be HTML
    let is_html = content_type
        .as_ref()
        .is_none_or(|ct| ct.contains("text/html"));
    let content = if is_html {
        Some(response.text().await?)
    } else {
        debug!("Not reading {:?} body of {}", content_type, final_url);
        None
    };

    Ok(FetchedPage {
        fetch: FetchResult {
            url: final_url,
            error: None,
            status,
            content,
        },
        content_type,
        content_length,
        response_time,
    })
}
