use serde::{Deserialize, Serialize};

/// Actor input for `apify/facebook-posts-scraper`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRunInput {
    pub start_urls: Vec<ApiStartUrl>,
    pub results_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStartUrl {
    pub url: String,
}

/// Apify wraps every object response in `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRun {
    pub id: String,
    pub status: String,            // "READY" | "RUNNING" | "SUCCEEDED" | "FAILED" | ...
    pub default_dataset_id: String,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl ApiRun {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "ABORTED" | "TIMED-OUT"
        )
    }

    pub fn succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }
}
