use serde::{Deserialize, Serialize};

use crate::models::{Issue, Record};

/// 住所スロットの取得元
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum AddressSource {
    /// 住所スロットは常に空文字列
    #[default]
    Unmapped,
    /// 都市と州を `", "` で連結して合成する
    Composite,
    /// 専用のフィールドから読む
    Field(String),
}

/// レコードの各スロットと生フィールドIDの対応
///
/// カスタムフィールドIDはテナントごと・時期ごとに異なるため、外部設定として扱う。
/// 未設定のスロットは常に空文字列になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: AddressSource,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
}

impl FieldMapping {
    /// すべて未設定のマッピング
    pub fn new() -> Self {
        Self {
            store: None,
            city: None,
            state: None,
            address: AddressSource::Unmapped,
            technician: None,
            equipment: None,
        }
    }

    pub fn store(mut self, field: impl Into<String>) -> Self {
        self.store = Some(field.into());
        self
    }

    pub fn city(mut self, field: impl Into<String>) -> Self {
        self.city = Some(field.into());
        self
    }

    pub fn state(mut self, field: impl Into<String>) -> Self {
        self.state = Some(field.into());
        self
    }

    pub fn address(mut self, source: AddressSource) -> Self {
        self.address = source;
        self
    }

    pub fn technician(mut self, field: impl Into<String>) -> Self {
        self.technician = Some(field.into());
        self
    }

    pub fn equipment(mut self, field: impl Into<String>) -> Self {
        self.equipment = Some(field.into());
        self
    }

    /// 検索時に要求するフィールド射影（カンマ区切り、重複なし、スロット順）
    pub fn projection(&self) -> String {
        let address_field = match &self.address {
            AddressSource::Field(field) => Some(field),
            AddressSource::Unmapped | AddressSource::Composite => None,
        };

        let mut fields: Vec<&str> = Vec::new();
        for field in [
            self.store.as_ref(),
            self.city.as_ref(),
            self.state.as_ref(),
            address_field,
            self.technician.as_ref(),
            self.equipment.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            if !fields.contains(&field.as_str()) {
                fields.push(field);
            }
        }

        fields.join(",")
    }
}

impl Default for FieldMapping {
    /// `summary` を機器スロットに割り当てる以外は未設定
    fn default() -> Self {
        Self::new().equipment("summary")
    }
}

/// 都市と州から住所を合成する
///
/// どちらかが空でも区切りは残す（`", SP"` や `"Campinas, "`）。
pub fn compose_address(city: &str, state: &str) -> String {
    format!("{}, {}", city, state)
}

/// Issueを平坦なRecordへ変換する
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    mapping: FieldMapping,
}

impl RecordExtractor {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// 1件のIssueをRecordに変換する。失敗しない。
    pub fn extract(&self, issue: &Issue) -> Record {
        let city = self.slot(issue, self.mapping.city.as_deref());
        let state = self.slot(issue, self.mapping.state.as_deref());
        let address = match &self.mapping.address {
            AddressSource::Unmapped => String::new(),
            AddressSource::Composite => compose_address(&city, &state),
            AddressSource::Field(field) => self.slot(issue, Some(field.as_str())),
        };

        Record {
            ticket_id: issue.key.clone(),
            store: self.slot(issue, self.mapping.store.as_deref()),
            city,
            state,
            address,
            technician: self.slot(issue, self.mapping.technician.as_deref()),
            equipment: self.slot(issue, self.mapping.equipment.as_deref()),
        }
    }

    /// 並び順を保ったまま全件を変換
    pub fn extract_all(&self, issues: &[Issue]) -> Vec<Record> {
        issues.iter().map(|issue| self.extract(issue)).collect()
    }

    fn slot(&self, issue: &Issue, field: Option<&str>) -> String {
        field.map(|name| issue.field(name).to_text()).unwrap_or_default()
    }
}
