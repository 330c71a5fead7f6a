/// ページネーション統合テスト
///
/// モックサーバーに対して検索の全件取得を検証します：
/// 1. リクエスト回数（ceil(total / page_size)）
/// 2. ページをまたいだ並び順
/// 3. 2xx以外のレスポンスでの即時中断
/// 4. 終了できないレスポンスの検出

use serde_json::json;
use ticket_records::{Auth, Error, JiraClient, JiraConfig, SearchQuery};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// `startAt` / `maxResults` に従って `total` 件を切り出して返すレスポンダー
///
/// `cap` があれば `maxResults` をその値に切り詰める（Jira側の上限を模す）。
struct PagedResponder {
    total: usize,
    cap: Option<usize>,
}

impl PagedResponder {
    fn new(total: usize) -> Self {
        Self { total, cap: None }
    }

    fn capped(total: usize, cap: usize) -> Self {
        Self { total, cap: Some(cap) }
    }
}

impl Respond for PagedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == name)
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(0)
        };
        let start_at = param("startAt");
        let requested = param("maxResults");
        let max_results = self.cap.map_or(requested, |cap| requested.min(cap));

        let end = (start_at + max_results).min(self.total);
        let issues: Vec<_> = (start_at..end)
            .map(|n| json!({ "key": format!("FSA-{}", n + 1), "fields": { "summary": format!("Chamado {}", n + 1) } }))
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "startAt": start_at,
            "maxResults": max_results,
            "total": self.total,
            "issues": issues
        }))
    }
}

fn client_for(server: &MockServer, page_size: u32) -> JiraClient {
    let config = JiraConfig::new(
        server.uri(),
        Auth::Basic {
            username: "test@example.com".to_string(),
            api_token: "test_token".to_string(),
        },
    )
    .unwrap()
    .page_size(page_size);

    JiraClient::new(config).unwrap()
}

fn query() -> SearchQuery {
    SearchQuery::new("project = FSA", "summary").unwrap()
}

fn page(start_at: u64, total: i64, keys: &[&str]) -> ResponseTemplate {
    let issues: Vec<_> = keys.iter().map(|key| json!({ "key": key, "fields": {} })).collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "startAt": start_at,
        "total": total,
        "issues": issues
    }))
}

#[tokio::test]
async fn test_request_count_matches_page_math() {
    // (total, page_size)
    let cases = [
        (1usize, 1u32),
        (5, 1),
        (7, 3),
        (9, 3),
        (100, 100),
        (101, 100),
        (250, 100),
        (250, 1000),
    ];

    for (total, page_size) in cases {
        // Given: total件を持つサーバー
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .respond_with(PagedResponder::new(total))
            .mount(&server)
            .await;

        // When: 全件検索
        let issues = client_for(&server, page_size).search(&query()).await.unwrap();

        // Then: ceil(total / page_size) 回のリクエストで total 件
        let expected_requests = total.div_ceil(page_size as usize);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), expected_requests, "total={} page_size={}", total, page_size);
        assert_eq!(issues.len(), total, "total={} page_size={}", total, page_size);
    }
}

#[tokio::test]
async fn test_zero_total_needs_single_request() {
    // Given: 一致0件のサーバー
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/search"))
        .respond_with(PagedResponder::new(0))
        .mount(&server)
        .await;

    // When: 全件検索
    let issues = client_for(&server, 100).search(&query()).await.unwrap();

    // Then: totalを知るための1回だけで、空の結果はエラーではない
    assert!(issues.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_offsets_advance_by_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/search"))
        .respond_with(PagedResponder::new(7))
        .mount(&server)
        .await;

    client_for(&server, 3).search(&query()).await.unwrap();

    let offsets: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "startAt")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default()
        })
        .collect();

    assert_eq!(offsets, vec!["0", "3", "6"]);
}

#[tokio::test]
async fn test_pages_are_concatenated_in_server_order() {
    // Given: 並び順がキー順ではないページ
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "0"))
        .respond_with(page(0, 5, &["FSA-9", "FSA-2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "2"))
        .respond_with(page(2, 5, &["FSA-7", "FSA-1"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "4"))
        .respond_with(page(4, 5, &["FSA-5"]))
        .mount(&server)
        .await;

    // When: 全件検索
    let issues = client_for(&server, 2).search(&query()).await.unwrap();

    // Then: サーバーの順序のまま連結される
    let keys: Vec<&str> = issues.iter().map(|issue| issue.key.as_str()).collect();
    assert_eq!(keys, vec!["FSA-9", "FSA-2", "FSA-7", "FSA-1", "FSA-5"]);
}

#[tokio::test]
async fn test_error_on_later_page_aborts_search() {
    // Given: 2ページ目で500を返すサーバー
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "0"))
        .respond_with(page(0, 4, &["FSA-1", "FSA-2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    // When: 全件検索
    let result = client_for(&server, 2).search(&query()).await;

    // Then: 途中までの結果は返らずTransportエラー
    match result {
        Err(Error::Transport { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("Expected Transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_first_page_error_stops_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server, 100).search(&query()).await;

    assert!(matches!(result, Err(Error::Transport { status: 403, .. })));
}

#[tokio::test]
async fn test_missing_total_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "issues": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server, 100).search(&query()).await;

    match result {
        Err(Error::Protocol(message)) => assert!(message.contains("total")),
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_issues_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 3 })))
        .mount(&server)
        .await;

    let result = client_for(&server, 100).search(&query()).await;

    assert!(matches!(result, Err(Error::Protocol(_))));
}

#[tokio::test]
async fn test_empty_page_before_total_is_protocol_error() {
    // Given: totalは残っているのに空ページを返し続けるサーバー
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page(0, 50, &[]))
        .mount(&server)
        .await;

    // When: 全件検索
    let result = client_for(&server, 10).search(&query()).await;

    // Then: ループせずに1回でプロトコルエラー
    assert!(matches!(result, Err(Error::Protocol(_))));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_shrinking_total_stops_early() {
    // Given: 2ページ目でtotalが減るサーバー
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "0"))
        .respond_with(page(0, 6, &["FSA-1", "FSA-2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startAt", "2"))
        .respond_with(page(2, 4, &["FSA-3", "FSA-4"]))
        .mount(&server)
        .await;

    // When: 全件検索
    let issues = client_for(&server, 2).search(&query()).await.unwrap();

    // Then: 最新のtotalで終了する
    assert_eq!(issues.len(), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_server_capped_page_keeps_configured_offsets() {
    // Given: maxResultsを2件に切り詰めるサーバー
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/search"))
        .respond_with(PagedResponder::capped(7, 2))
        .mount(&server)
        .await;

    // When: ページサイズ3で全件検索
    let issues = client_for(&server, 3).search(&query()).await.unwrap();

    // Then: オフセットは設定どおり0, 3, 6と進み、エラーにはならない
    let offsets: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "startAt")
                .map(|(_, value)| value.into_owned())
        })
        .collect();
    assert_eq!(offsets, vec!["0", "3", "6"]);

    // 切り詰められた分（FSA-3, FSA-6）は取得されない
    let keys: Vec<&str> = issues.iter().map(|issue| issue.key.as_str()).collect();
    assert_eq!(keys, vec!["FSA-1", "FSA-2", "FSA-4", "FSA-5", "FSA-7"]);
}
