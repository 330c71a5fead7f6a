use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::{
    CachePolicy, Error, FieldMapping, JiraConfig, RecordExtractor, RecordFilter, SearchQuery,
};

/// ダッシュボード設定の抽象化トレイト
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// ダッシュボード設定を保存
    async fn save_dashboard(&mut self, config: &DashboardConfig) -> Result<(), Error>;

    /// ダッシュボード設定を読み込み
    async fn load_dashboard(&self, id: &str) -> Result<Option<DashboardConfig>, Error>;

    /// 全ダッシュボード設定を一覧取得
    async fn list_dashboards(&self) -> Result<Vec<DashboardConfig>, Error>;

    /// ダッシュボード設定を削除
    async fn delete_dashboard(&mut self, id: &str) -> Result<bool, Error>;

    /// 設定ストアを初期化
    async fn initialize(&mut self) -> Result<(), Error>;

    /// 設定ストアをクリア
    async fn clear(&mut self) -> Result<(), Error>;
}

/// ダッシュボード1画面分の設定
///
/// 認証情報は含めない（環境変数から読む）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 設定ID（ファイル名に使う）
    pub id: String,
    /// 表示名
    pub name: String,
    /// JQL
    pub query: String,
    /// フィールドIDの対応
    #[serde(default)]
    pub mapping: FieldMapping,
    /// 初期表示のフィルター
    #[serde(default)]
    pub filter: RecordFilter,
    /// 検索のページサイズ（未設定なら接続設定の値を使う）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// リクエストタイムアウト（秒、未設定なら接続設定の値を使う）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// ジオコーディングキャッシュの退避方針
    #[serde(default)]
    pub geocode_cache: CachePolicy,
    /// 最後に更新された日時
    pub updated_at: DateTime<Utc>,
}

impl DashboardConfig {
    /// 新しいダッシュボード設定を作成
    pub fn new(id: impl Into<String>, name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query: query.into(),
            mapping: FieldMapping::default(),
            filter: RecordFilter::default(),
            page_size: None,
            timeout_secs: None,
            geocode_cache: CachePolicy::Unbounded,
            updated_at: Utc::now(),
        }
    }

    pub fn mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self.updated_at = Utc::now();
        self
    }

    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self.updated_at = Utc::now();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self.updated_at = Utc::now();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self.updated_at = Utc::now();
        self
    }

    pub fn geocode_cache(mut self, policy: CachePolicy) -> Self {
        self.geocode_cache = policy;
        self.updated_at = Utc::now();
        self
    }

    /// マッピングから射影を組み立てた検索クエリ
    pub fn search_query(&self) -> Result<SearchQuery, Error> {
        SearchQuery::new(self.query.clone(), self.mapping.projection())
    }

    /// マッピングに従うレコード変換器
    pub fn extractor(&self) -> RecordExtractor {
        RecordExtractor::new(self.mapping.clone())
    }

    /// 設定されているページサイズとタイムアウトだけを接続設定に上書きする
    pub fn apply_to(&self, mut config: JiraConfig) -> JiraConfig {
        if let Some(page_size) = self.page_size {
            config = config.page_size(page_size);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// JSON形式のファイルベース設定ストア
pub struct FileConfigStore {
    /// 設定ディレクトリのパス
    config_dir: PathBuf,
}

impl FileConfigStore {
    /// 新しいファイル設定ストアを作成
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// デフォルトの設定ディレクトリでファイル設定ストアを作成
    pub fn default_config_dir() -> Result<Self, Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigurationMissing("設定ディレクトリが見つかりません".to_string()))?
            .join("ticket-records");

        Ok(Self::new(config_dir))
    }

    /// ダッシュボード設定ディレクトリのパスを取得
    fn dashboards_dir(&self) -> PathBuf {
        self.config_dir.join("dashboards")
    }

    /// ダッシュボード設定ファイルのパスを取得
    fn dashboard_path(&self, id: &str) -> Result<PathBuf, Error> {
        // IDはそのままファイル名になる
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(Error::InvalidInput(format!("invalid dashboard id: {:?}", id)));
        }
        Ok(self.dashboards_dir().join(format!("{}.json", id)))
    }

    /// JSONファイルに書き込み
    async fn write_json_file<T>(&self, path: &Path, data: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        // 親ディレクトリを作成
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json_data = serde_json::to_string_pretty(data)
            .map_err(|e| Error::SerializationError(format!("JSON serialization failed: {}", e)))?;

        let mut file = fs::File::create(path).await?;
        file.write_all(json_data.as_bytes()).await?;
        file.sync_all().await?;

        debug!(path = %path.display(), "wrote config file");
        Ok(())
    }

    /// JSONファイルから読み込み
    async fn read_json_file<T>(&self, path: &Path) -> Result<Option<T>, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !path.exists() {
            return Ok(None);
        }

        let mut file = fs::File::open(path).await?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&contents)
            .map_err(|e| Error::SerializationError(format!("JSON deserialization failed: {}", e)))?;

        Ok(Some(data))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn save_dashboard(&mut self, config: &DashboardConfig) -> Result<(), Error> {
        let path = self.dashboard_path(&config.id)?;
        self.write_json_file(&path, config).await
    }

    async fn load_dashboard(&self, id: &str) -> Result<Option<DashboardConfig>, Error> {
        let path = self.dashboard_path(id)?;
        self.read_json_file(&path).await
    }

    async fn list_dashboards(&self) -> Result<Vec<DashboardConfig>, Error> {
        let dashboards_dir = self.dashboards_dir();

        if !dashboards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dashboards_dir).await?;
        let mut configs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match self.read_json_file::<DashboardConfig>(&path).await {
                    Ok(Some(config)) => configs.push(config),
                    Ok(None) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable dashboard config"),
                }
            }
        }

        // 更新日時でソート（新しい順）
        configs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(configs)
    }

    async fn delete_dashboard(&mut self, id: &str) -> Result<bool, Error> {
        let path = self.dashboard_path(id)?;

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await?;

        Ok(true)
    }

    async fn initialize(&mut self) -> Result<(), Error> {
        // 設定ディレクトリとサブディレクトリを作成
        fs::create_dir_all(&self.config_dir).await?;
        fs::create_dir_all(self.dashboards_dir()).await?;

        Ok(())
    }

    async fn clear(&mut self) -> Result<(), Error> {
        if self.config_dir.exists() {
            fs::remove_dir_all(&self.config_dir).await?;
        }

        Ok(())
    }
}
