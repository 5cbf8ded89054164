//! Resource operations of the LiveSurf API.

use serde_json::{Value, json};

use crate::error::ApiError;
use crate::http::{ApiResponse, LiveSurfClient, Method};

type ApiResult = Result<ApiResponse, ApiError>;

impl LiveSurfClient {
    pub async fn categories(&self) -> ApiResult {
        self.get("categories/").await
    }

    pub async fn countries(&self) -> ApiResult {
        self.get("countries/").await
    }

    pub async fn languages(&self) -> ApiResult {
        self.get("languages/").await
    }

    pub async fn sources_ad(&self) -> ApiResult {
        self.get("sources/ad/").await
    }

    pub async fn sources_messengers(&self) -> ApiResult {
        self.get("sources/messengers/").await
    }

    pub async fn sources_search(&self) -> ApiResult {
        self.get("sources/search/").await
    }

    pub async fn sources_social(&self) -> ApiResult {
        self.get("sources/social/").await
    }

    pub async fn user(&self) -> ApiResult {
        self.get("user/").await
    }

    pub async fn set_auto_mode(&self) -> ApiResult {
        self.post("user/automode/", None).await
    }

    pub async fn set_manual_mode(&self) -> ApiResult {
        self.post("user/manualmode/", None).await
    }

    // Groups

    pub async fn groups(&self) -> ApiResult {
        self.get("group/all/").await
    }

    pub async fn group(&self, id: u64) -> ApiResult {
        self.get(&format!("group/{}/", id)).await
    }

    pub async fn create_group(&self, data: Value) -> ApiResult {
        self.post("group/create/", Some(data)).await
    }

    pub async fn update_group(&self, id: u64, data: Value) -> ApiResult {
        self.patch(&format!("group/{}/", id), Some(data)).await
    }

    pub async fn delete_group(&self, id: u64) -> ApiResult {
        self.delete(&format!("group/{}/", id)).await
    }

    pub async fn clone_group(&self, id: u64, data: Option<Value>) -> ApiResult {
        self.post(&format!("group/{}/clone/", id), data).await
    }

    pub async fn add_group_credits(&self, id: u64, credits: i64) -> ApiResult {
        self.post(
            &format!("group/{}/add_credits/", id),
            Some(json!({ "credits": credits })),
        )
        .await
    }

    // Pages

    pub async fn page(&self, id: u64) -> ApiResult {
        self.get(&format!("page/{}/", id)).await
    }

    pub async fn create_page(&self, data: Value) -> ApiResult {
        self.post("page/create/", Some(data)).await
    }

    pub async fn update_page(&self, id: u64, data: Value) -> ApiResult {
        self.patch(&format!("page/{}/", id), Some(data)).await
    }

    pub async fn delete_page(&self, id: u64) -> ApiResult {
        self.delete(&format!("page/{}/", id)).await
    }

    pub async fn clone_page(&self, id: u64) -> ApiResult {
        self.page_action(id, "clone").await
    }

    pub async fn move_page_up(&self, id: u64) -> ApiResult {
        self.page_action(id, "up").await
    }

    pub async fn move_page_down(&self, id: u64) -> ApiResult {
        self.page_action(id, "down").await
    }

    pub async fn start_page(&self, id: u64) -> ApiResult {
        self.page_action(id, "start").await
    }

    pub async fn stop_page(&self, id: u64) -> ApiResult {
        self.page_action(id, "stop").await
    }

    async fn page_action(&self, id: u64, action: &str) -> ApiResult {
        self.post(&format!("page/{}/{}/", id, action), None).await
    }

    /// Compiled page statistics filtered by `params`, URL-encoded into the query.
    pub async fn stats<K, V>(&self, params: &[(K, V)]) -> ApiResult
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.stats_url(params)?;
        self.request_url(Method::Get, url, None).await
    }

    fn stats_url<K, V>(&self, params: &[(K, V)]) -> Result<String, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = reqwest::Url::parse(&self.endpoint_url("pages-compiled-stats/"))
            .map_err(|e| ApiError::Config(format!("invalid stats URL: {}", e)))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        }
        Ok(url.to_string())
    }
}
