use crate::error::{Error, Result};
use crate::models::{Issue, SearchPage, SearchQuery};
use base64::Engine;
use reqwest::{Client, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 既定のページサイズ（Jira Cloudの検索APIの上限に合わせた値）
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// 既定のリクエストタイムアウト
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SEARCH_ENDPOINT: &str = "/search";

#[derive(Debug, Clone)]
pub enum Auth {
    Basic { username: String, api_token: String },
    Bearer { token: String },
}

/// クライアントの接続設定
///
/// 認証情報・接続先・ページサイズ・タイムアウトを明示的に渡す。
/// プロセス全体で共有するセッション状態は持たない。
#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub auth: Auth,
    pub page_size: u32,
    pub timeout: Duration,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into();

        // Validate URL
        let _ = Url::parse(&base_url)
            .map_err(|_| Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        Ok(Self {
            base_url,
            auth,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// 環境変数から設定を作成
    ///
    /// 必須: `JIRA_URL`, `JIRA_USER`, `JIRA_API_TOKEN`
    /// 任意: `JIRA_PAGE_SIZE`, `JIRA_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        use std::env;

        let base_url = env::var("JIRA_URL")
            .map_err(|_| Error::ConfigurationMissing("JIRA_URL not found in environment".to_string()))?;

        let username = env::var("JIRA_USER")
            .map_err(|_| Error::ConfigurationMissing("JIRA_USER not found in environment".to_string()))?;

        let api_token = env::var("JIRA_API_TOKEN")
            .map_err(|_| Error::ConfigurationMissing("JIRA_API_TOKEN not found in environment".to_string()))?;

        let auth = Auth::Basic { username, api_token };
        let mut config = Self::new(base_url, auth)?;

        if let Ok(value) = env::var("JIRA_PAGE_SIZE") {
            let page_size = value.trim().parse::<u32>().map_err(|_| {
                Error::InvalidConfiguration(format!("JIRA_PAGE_SIZE is not a number: {}", value))
            })?;
            config = config.page_size(page_size);
        }

        if let Ok(value) = env::var("JIRA_TIMEOUT_SECS") {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                Error::InvalidConfiguration(format!("JIRA_TIMEOUT_SECS is not a number: {}", value))
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// ページサイズを設定
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// リクエストタイムアウトを設定
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// REST APIのルートURL（末尾スラッシュを除いた base_url + `/rest/api/3`）
    pub fn api_root(&self) -> String {
        format!("{}/rest/api/3", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(crate) client: Client,
    pub(crate) config: Arc<JiraConfig>,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        if config.page_size == 0 {
            return Err(Error::InvalidConfiguration(
                "page size must be at least 1".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // 認証ヘッダーを追加
        match &config.auth {
            Auth::Basic { username, api_token } => {
                let auth_value = format!("{}:{}", username, api_token);
                let encoded = base64::engine::general_purpose::STANDARD.encode(auth_value.as_bytes());
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Basic {}", encoded))
                        .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?,
                );
            }
            Auth::Bearer { token } => {
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Bearer {}", token))
                        .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub(crate) async fn get<T>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.config.api_root(), endpoint);

        let response = self.client
            .get(&url)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Transport { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Protocol(format!("unexpected response body: {}", e)))
    }

    /// 指定オフセットから1ページ分を取得
    pub async fn search_page(&self, query: &SearchQuery, start_at: u64) -> Result<SearchPage> {
        let mut params = vec![
            ("jql", query.jql().to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", self.config.page_size.to_string()),
        ];
        if !query.fields().is_empty() {
            params.push(("fields", query.fields().to_string()));
        }

        self.get(SEARCH_ENDPOINT, &params).await
    }

    /// 検索条件に一致するすべてのIssueを取得
    ///
    /// オフセット0からページサイズずつ進め、オフセットがサーバーの報告する `total`
    /// 以上になった時点で終了する。ページは順番に取得し、サーバーの並び順のまま連結する。
    /// どのページで失敗しても途中までの結果は返さない。
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Issue>> {
        let page_size = u64::from(self.config.page_size);
        let mut start_at = 0u64;
        let mut requests = 0usize;
        let mut issues = Vec::new();

        loop {
            let response = self.search_page(query, start_at).await?;
            let reported_max = response.max_results;
            let (total, page) = response.into_parts()?;
            requests += 1;
            debug!(start_at, total, received = page.len(), "fetched search page");

            // サーバー側で maxResults が切り詰められるとオフセットの間の課題を取りこぼす
            let received = page.len() as u64;
            if !page.is_empty() && received < page_size && start_at + received < total {
                warn!(
                    start_at,
                    total,
                    received,
                    page_size,
                    reported_max,
                    "search page is shorter than the configured page size; issues may be skipped"
                );
            }

            // 進めないページが続くと終了できない
            if page.is_empty() && start_at < total {
                warn!(start_at, total, "search returned an empty page before reaching total");
                return Err(Error::Protocol(format!(
                    "empty page at offset {} while total is {}",
                    start_at, total
                )));
            }

            issues.extend(page);
            start_at += page_size;

            if start_at >= total {
                break;
            }
        }

        info!(jql = query.jql(), requests, issues = issues.len(), "search completed");
        Ok(issues)
    }
}
