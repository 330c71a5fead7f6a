use super::Issue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 検索クエリ（JQL）とフィールド射影の組
///
/// 作成後は変更しない。ページごとに同じクエリを使い回す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    jql: String,
    fields: String,
}

impl SearchQuery {
    /// 新しい検索クエリを作成
    ///
    /// `fields` はカンマ区切りのフィールドID一覧。空の場合はサーバーの既定に従う。
    pub fn new(jql: impl Into<String>, fields: impl Into<String>) -> Result<Self> {
        let jql = jql.into();
        if jql.trim().is_empty() {
            return Err(Error::InvalidInput("JQL query must not be empty".to_string()));
        }

        Ok(Self {
            jql,
            fields: fields.into(),
        })
    }

    pub fn jql(&self) -> &str {
        &self.jql
    }

    pub fn fields(&self) -> &str {
        &self.fields
    }
}

/// 検索APIの1ページ分のレスポンス
///
/// 形が不正なレスポンスをプロトコルエラーとして扱えるよう、`total` と `issues` は
/// `Option` のまま受ける。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "startAt")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u64>,

    #[serde(rename = "maxResults")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
}

impl SearchPage {
    /// `total` と `issues` の存在を検証して取り出す
    pub fn into_parts(self) -> Result<(u64, Vec<Issue>)> {
        let total = match self.total {
            Some(total) if total >= 0 => total as u64,
            Some(total) => {
                return Err(Error::Protocol(format!(
                    "search response reported negative total: {}",
                    total
                )));
            }
            None => {
                return Err(Error::Protocol(
                    "search response is missing 'total'".to_string(),
                ));
            }
        };

        let issues = self.issues.ok_or_else(|| {
            Error::Protocol("search response is missing 'issues'".to_string())
        })?;

        Ok((total, issues))
    }
}
