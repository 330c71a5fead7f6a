use tracing::info;

use crate::error::Result;
use crate::extractor::RecordExtractor;
use crate::models::{Record, SearchQuery};
use crate::JiraClient;

/// 検索して全件をレコードに変換する
///
/// 検索がどのページで失敗してもレコードは1件も返さない。
/// 一致なしは空の `Vec` で、エラーではない。
pub async fn fetch_records(
    client: &JiraClient,
    query: &SearchQuery,
    extractor: &RecordExtractor,
) -> Result<Vec<Record>> {
    let issues = client.search(query).await?;
    let records = extractor.extract_all(&issues);

    info!(jql = query.jql(), records = records.len(), "extracted records");
    Ok(records)
}
