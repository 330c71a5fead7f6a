use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::FieldValue;

/// 検索APIが返すチケット
///
/// フィールドはプロバイダごとに形が異なるため、型付けせず生のJSONのまま保持する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(rename = "self")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    // 標準フィールドもカスタムフィールドも同じマップに入る
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl Issue {
    /// キーとフィールドからIssueを作成
    pub fn new(key: impl Into<String>, fields: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id: None,
            key: key.into(),
            self_url: None,
            fields,
        }
    }

    /// 生のフィールド値を取得
    pub fn raw_field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// フィールド値を形状ごとに分類して取得
    pub fn field(&self, name: &str) -> FieldValue<'_> {
        FieldValue::classify(self.raw_field(name))
    }
}
