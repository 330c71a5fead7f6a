use serde::{Deserialize, Serialize};

/// 表示層に渡す平坦なチケットレコード
///
/// すべてのスロットは常に文字列（空文字列を含む）で、入れ子や欠損はない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// チケットキー
    pub ticket_id: String,
    /// 店舗名
    pub store: String,
    pub city: String,
    pub state: String,
    /// ジオコーディングに渡す住所
    pub address: String,
    /// 担当技術者
    pub technician: String,
    /// 交換対象の機器（またはサマリー）
    pub equipment: String,
}

impl Record {
    /// チケットキーだけを持ち、他のスロットが空のレコード
    pub fn empty(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            ..Self::default()
        }
    }

    /// 技術者が割り当てられていないかどうか
    pub fn lacks_technician(&self) -> bool {
        self.technician.trim().is_empty()
    }
}
