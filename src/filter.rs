use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::Record;

/// レコードの絞り込み条件
///
/// 空の選択は「すべて一致」として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// 州
    #[serde(default)]
    pub states: Vec<String>,
    /// 都市
    #[serde(default)]
    pub cities: Vec<String>,
    /// 交換対象の機器
    #[serde(default)]
    pub equipment: Vec<String>,
    /// 技術者未割り当てのチケットだけを残す
    #[serde(default)]
    pub only_missing_technician: bool,
}

impl RecordFilter {
    /// 新しいフィルターを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 州でフィルタ
    pub fn states(mut self, states: Vec<String>) -> Self {
        self.states = states;
        self
    }

    /// 都市でフィルタ
    pub fn cities(mut self, cities: Vec<String>) -> Self {
        self.cities = cities;
        self
    }

    /// 機器でフィルタ
    pub fn equipment(mut self, equipment: Vec<String>) -> Self {
        self.equipment = equipment;
        self
    }

    /// 技術者未割り当てのみ
    pub fn only_missing_technician(mut self, only: bool) -> Self {
        self.only_missing_technician = only;
        self
    }

    /// フィルターが空かどうか判定
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
            && self.cities.is_empty()
            && self.equipment.is_empty()
            && !self.only_missing_technician
    }

    /// レコードがフィルター条件に一致するか判定
    pub fn matches(&self, record: &Record) -> bool {
        if !self.states.is_empty() && !self.states.contains(&record.state) {
            return false;
        }

        if !self.cities.is_empty() && !self.cities.contains(&record.city) {
            return false;
        }

        if !self.equipment.is_empty() && !self.equipment.contains(&record.equipment) {
            return false;
        }

        if self.only_missing_technician && !record.lacks_technician() {
            return false;
        }

        true
    }

    /// 一致するレコードだけを元の順序で返す
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// 絞り込み条件の選択肢
///
/// いずれもソート済み・重複なし・空文字列を除く。
pub struct FilterOptions;

impl FilterOptions {
    /// 州の選択肢
    pub fn states(records: &[Record]) -> Vec<String> {
        distinct(records.iter().map(|r| r.state.as_str()))
    }

    /// 都市の選択肢。州が選択されていればその州の都市に限定する。
    pub fn cities(records: &[Record], selected_states: &[String]) -> Vec<String> {
        distinct(
            records
                .iter()
                .filter(|r| selected_states.is_empty() || selected_states.contains(&r.state))
                .map(|r| r.city.as_str()),
        )
    }

    /// 機器の選択肢
    pub fn equipment(records: &[Record]) -> Vec<String> {
        distinct(records.iter().map(|r| r.equipment.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
