use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;

/// 住所ジオコーディングの結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// 住所を座標に変換するバックエンドの抽象化トレイト
///
/// 見つからない住所は `Ok(None)`、バックエンド自体の失敗は `Err`。
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;
}

/// 既定の最小問い合わせ間隔
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// 連続する問い合わせの間に最小間隔を空けるラッパー
pub struct RateLimitedGeocoder<G> {
    inner: G,
    min_delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<G: Geocoder> RateLimitedGeocoder<G> {
    pub fn new(inner: G, min_delay: Duration) -> Self {
        Self {
            inner,
            min_delay,
            last_call: Mutex::new(None),
        }
    }

    /// 既定の間隔（[`DEFAULT_MIN_DELAY`]）で包む
    pub fn with_default_delay(inner: G) -> Self {
        Self::new(inner, DEFAULT_MIN_DELAY)
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for RateLimitedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }

        let result = self.inner.geocode(address).await;
        *last_call = Some(Instant::now());
        result
    }
}

/// キャッシュの退避方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CachePolicy {
    /// 上限なし。プロセスが生きている間すべて保持する
    #[default]
    Unbounded,
    /// 最も長く参照されていない住所から退避する
    ///
    /// 参照順の更新は線形探索なので、1回の参照は保持件数に比例する。
    /// ダッシュボード1画面分の住所数を想定している。
    Lru { capacity: usize },
}

/// キャッシュの統計情報
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// 住所文字列をキーにしたジオコーディング結果のメモ化
///
/// 「見つからない」結果もキャッシュする。バックエンドのエラーはキャッシュしない。
pub struct GeocodeCache<G> {
    geocoder: G,
    policy: CachePolicy,
    entries: HashMap<String, Option<Coordinates>>,
    // LRU順（先頭が最も古い）。Unboundedでは使わない
    recency: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl<G: Geocoder> GeocodeCache<G> {
    pub fn new(geocoder: G, policy: CachePolicy) -> Self {
        Self {
            geocoder,
            policy,
            entries: HashMap::new(),
            recency: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// 住所の座標を取得（キャッシュ優先）
    pub async fn lookup(&mut self, address: &str) -> Result<Option<Coordinates>> {
        if let Some(cached) = self.entries.get(address).copied() {
            self.hits += 1;
            self.touch(address);
            debug!(address, "geocode cache hit");
            return Ok(cached);
        }

        self.misses += 1;
        let result = self.geocoder.geocode(address).await?;
        self.insert(address, result);
        debug!(address, found = result.is_some(), "geocode cache miss");
        Ok(result)
    }

    /// 住所を順番に解決する。途中でエラーになった場合はそこで中断する。
    pub async fn lookup_all(&mut self, addresses: &[String]) -> Result<Vec<Option<Coordinates>>> {
        let mut results = Vec::with_capacity(addresses.len());
        for address in addresses {
            results.push(self.lookup(address).await?);
        }
        Ok(results)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    // 線形探索（O(n)）
    fn touch(&mut self, address: &str) {
        if let CachePolicy::Lru { .. } = self.policy {
            if let Some(pos) = self.recency.iter().position(|a| a == address) {
                if let Some(key) = self.recency.remove(pos) {
                    self.recency.push_back(key);
                }
            }
        }
    }

    fn insert(&mut self, address: &str, value: Option<Coordinates>) {
        match self.policy {
            CachePolicy::Unbounded => {
                self.entries.insert(address.to_string(), value);
            }
            CachePolicy::Lru { capacity } => {
                if capacity == 0 {
                    return;
                }
                while self.entries.len() >= capacity {
                    let Some(oldest) = self.recency.pop_front() else {
                        break;
                    };
                    self.entries.remove(&oldest);
                    debug!(address = oldest.as_str(), "geocode cache evicted");
                }
                self.entries.insert(address.to_string(), value);
                self.recency.push_back(address.to_string());
            }
        }
    }
}
