use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::api_types::*;
use crate::models::Post;

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com";
pub const FACEBOOK_POSTS_ACTOR: &str = "apify/facebook-posts-scraper";
pub const DEFAULT_RESULTS_LIMIT: usize = 20;

const WAIT_FOR_FINISH_SECS: u32 = 60;
const DATASET_PAGE_SIZE: usize = 1000;

/// Thin client over the parts of the Apify v2 API the writer needs:
/// start an actor run, wait for it, read its default dataset.
pub struct ApifyClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: usize,
}

impl ApifyClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            page_size: DATASET_PAGE_SIZE,
        })
    }

    #[cfg(test)]
    fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Start `actor_id` with `input` and block until the run reaches a
    /// terminal status. Any status other than SUCCEEDED is an error.
    pub async fn call_actor(&self, actor_id: &str, input: &ApiRunInput) -> Result<ApiRun> {
        // the API addresses actors as "user~name"
        let url = format!("{}/v2/acts/{}/runs", self.base_url, actor_id.replace('/', "~"));
        debug!("Starting actor run - actor={}, results_limit={}", actor_id, input.results_limit);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {}", url))?;

        let mut run = resp
            .json::<ApiEnvelope<ApiRun>>()
            .await
            .with_context(|| format!("Decoding JSON for {}", url))?
            .data;

        while !run.is_terminal() {
            debug!("Waiting for actor run - run_id={}, status={}", run.id, run.status);
            run = self.get_run(&run.id).await?;
        }

        if !run.succeeded() {
            bail!(
                "Actor run {} finished with status {}{}",
                run.id,
                run.status,
                run.status_message
                    .as_deref()
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            );
        }
        Ok(run)
    }

    async fn get_run(&self, run_id: &str) -> Result<ApiRun> {
        let url = format!("{}/v2/actor-runs/{}", self.base_url, run_id);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("waitForFinish", WAIT_FOR_FINISH_SECS)])
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {}", url))?;

        Ok(resp
            .json::<ApiEnvelope<ApiRun>>()
            .await
            .with_context(|| format!("Decoding JSON for {}", url))?
            .data)
    }

    /// Read every item of a dataset, in dataset order.
    pub async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>> {
        let url = format!("{}/v2/datasets/{}/items", self.base_url, dataset_id);
        let mut items = Vec::new();
        let mut offset = 0usize;

        loop {
            let resp = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("clean", "true"), ("format", "json")])
                .query(&[("offset", offset), ("limit", self.page_size)])
                .send()
                .await
                .with_context(|| format!("Request failed for {}", url))?
                .error_for_status()
                .with_context(|| format!("HTTP error for {}", url))?;

            let page: Vec<Value> = resp
                .json()
                .await
                .with_context(|| format!("Decoding JSON for {}", url))?;

            let n = page.len();
            debug!("Dataset page - dataset={}, offset={}, items={}", dataset_id, offset, n);
            items.extend(page);
            offset += n;

            if n < self.page_size {
                break;
            }
        }
        Ok(items)
    }
}

/// Where session posts come from.
#[async_trait(?Send)]
pub trait PostSource {
    async fn fetch_posts(&self, profile_url: &str, limit: usize) -> Result<Vec<Post>>;
}

#[async_trait(?Send)]
impl PostSource for ApifyClient {
    async fn fetch_posts(&self, profile_url: &str, limit: usize) -> Result<Vec<Post>> {
        fetch_posts(self, profile_url, limit).await
    }
}

pub fn dataset_console_url(dataset_id: &str) -> String {
    format!("https://console.apify.com/storage/datasets/{}", dataset_id)
}

/// Accept only absolute http(s) URLs as profile targets.
pub fn parse_profile_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid profile URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Profile URL must be http or https, got {}", url.scheme());
    }
    Ok(url)
}

/// Scrape up to `limit` posts from a Facebook profile.
pub async fn fetch_posts(client: &ApifyClient, profile_url: &str, limit: usize) -> Result<Vec<Post>> {
    let start = std::time::Instant::now();
    let profile = parse_profile_url(profile_url)?;

    let input = ApiRunInput {
        // validated above, but sent as typed
        start_urls: vec![ApiStartUrl { url: profile_url.trim().to_string() }],
        results_limit: limit,
    };
    let run = client.call_actor(FACEBOOK_POSTS_ACTOR, &input).await?;

    info!("💾 Check your data here: {}", dataset_console_url(&run.default_dataset_id));

    let items = client.dataset_items(&run.default_dataset_id).await?;
    let posts: Vec<Post> = items
        .iter()
        .map(|item| {
            if !item.is_object() {
                warn!("Dataset item is not an object, keeping an empty post");
            }
            let post = Post::from_item(item);
            debug!(
                "Post - text={:?}, likes={:?}, comments={:?}, shares={:?}",
                post.text, post.likes, post.comments, post.shares
            );
            post
        })
        .collect();

    info!(
        "Post fetch completed - profile={}, duration={:.2}s, posts={}",
        profile,
        start.elapsed().as_secs_f32(),
        posts.len()
    );
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;

    fn run_body(status: &str) -> Value {
        json!({"data": {"id": "run1", "status": status, "defaultDatasetId": "ds1"}})
    }

    #[tokio::test]
    async fn fetch_posts_runs_actor_and_normalizes_items() {
        let server = MockServer::start_async().await;
        let start = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/acts/apify~facebook-posts-scraper/runs")
                    .header("authorization", "Bearer secret")
                    .json_body(json!({
                        "startUrls": [{"url": "https://www.facebook.com/hunkims"}],
                        "resultsLimit": 5
                    }));
                then.status(201).json_body(run_body("SUCCEEDED"));
            })
            .await;
        let items = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/datasets/ds1/items")
                    .query_param("offset", "0");
                then.status(200).json_body(json!([
                    {"text": "first", "likes": 10, "comments": 2, "shares": 1},
                    {"text": "second"},
                    {"likes": 7}
                ]));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "secret").unwrap();
        let posts = fetch_posts(&client, "https://www.facebook.com/hunkims", 5)
            .await
            .unwrap();

        start.assert_async().await;
        items.assert_async().await;
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].text.as_deref(), Some("first"));
        assert_eq!(posts[0].likes, Some(10));
        assert_eq!(posts[1].text.as_deref(), Some("second"));
        assert_eq!(posts[1].likes, None);
        assert_eq!(posts[2].text, None);
        assert_eq!(posts[2].likes, Some(7));
    }

    #[tokio::test]
    async fn call_actor_waits_until_run_is_terminal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/acts/apify~facebook-posts-scraper/runs");
                then.status(201).json_body(run_body("RUNNING"));
            })
            .await;
        let wait = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/actor-runs/run1")
                    .query_param("waitForFinish", "60");
                then.status(200).json_body(run_body("SUCCEEDED"));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "secret").unwrap();
        let input = ApiRunInput {
            start_urls: vec![],
            results_limit: 1,
        };
        let run = client.call_actor(FACEBOOK_POSTS_ACTOR, &input).await.unwrap();
        assert!(run.succeeded());
        assert_eq!(wait.hits_async().await, 1);
    }

    #[tokio::test]
    async fn failed_run_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/acts/apify~facebook-posts-scraper/runs");
                then.status(201).json_body(json!({
                    "data": {
                        "id": "run1",
                        "status": "FAILED",
                        "defaultDatasetId": "ds1",
                        "statusMessage": "page not reachable"
                    }
                }));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "secret").unwrap();
        let err = fetch_posts(&client, "https://www.facebook.com/hunkims", 20)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("FAILED"), "{msg}");
        assert!(msg.contains("page not reachable"), "{msg}");
    }

    #[tokio::test]
    async fn auth_failure_propagates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/acts/apify~facebook-posts-scraper/runs");
                then.status(401).json_body(json!({"error": {"type": "token-not-valid"}}));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "bad").unwrap();
        let err = fetch_posts(&client, "https://www.facebook.com/hunkims", 20)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP error"));
    }

    #[tokio::test]
    async fn dataset_items_pages_in_order() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/datasets/ds1/items")
                    .query_param("offset", "0")
                    .query_param("limit", "2");
                then.status(200).json_body(json!([{"text": "a"}, {"text": "b"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/datasets/ds1/items")
                    .query_param("offset", "2")
                    .query_param("limit", "2");
                then.status(200).json_body(json!([{"text": "c"}]));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "secret")
            .unwrap()
            .with_page_size(2);
        let items = client.dataset_items("ds1").await.unwrap();
        let texts: Vec<_> = items.iter().map(|i| i["text"].as_str().unwrap()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn profile_url_is_sent_as_typed() {
        let server = MockServer::start_async().await;
        let start = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/acts/apify~facebook-posts-scraper/runs")
                    .json_body(json!({
                        "startUrls": [{"url": "https://www.facebook.com"}],
                        "resultsLimit": 20
                    }));
                then.status(201).json_body(run_body("SUCCEEDED"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/datasets/ds1/items");
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "secret").unwrap();
        let posts = fetch_posts(&client, "  https://www.facebook.com ", 20).await.unwrap();
        assert!(posts.is_empty());
        start.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_profile_url_makes_no_request() {
        let server = MockServer::start_async().await;
        let start = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(201).json_body(run_body("SUCCEEDED"));
            })
            .await;

        let client = ApifyClient::new(&server.base_url(), "secret").unwrap();
        assert!(fetch_posts(&client, "not a url", 20).await.is_err());
        assert!(fetch_posts(&client, "ftp://example.com/x", 20).await.is_err());
        assert_eq!(start.hits_async().await, 0);
    }

    #[test]
    fn console_url_points_at_dataset() {
        assert_eq!(
            dataset_console_url("abc"),
            "https://console.apify.com/storage/datasets/abc"
        );
    }
}
