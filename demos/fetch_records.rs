/// チケットを取得してレコードをJSON Linesで出力する使用例
///
/// 実行前に環境変数を設定してください：
/// export JIRA_URL=https://your-instance.atlassian.net
/// export JIRA_USER=your-email@example.com
/// export JIRA_API_TOKEN=your-api-token
///
/// 保存済みのダッシュボード設定を使う場合：
/// export TICKET_DASHBOARD=troca
///
/// 実行方法：
/// RUST_LOG=ticket_records=debug cargo run --example fetch_records -- "project = FSA"

use dotenv::dotenv;
use ticket_records::{
    ConfigStore, DashboardConfig, FileConfigStore, JiraClient, JiraConfig, fetch_records,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    // 引数のJQLはダッシュボードの検索条件より優先する
    let jql = std::env::args().nth(1);

    // ダッシュボード設定があればマッピングとページサイズをそこから取る
    let mut dashboard = match std::env::var("TICKET_DASHBOARD") {
        Ok(id) => FileConfigStore::default_config_dir()?
            .load_dashboard(&id)
            .await?
            .ok_or_else(|| format!("ダッシュボード設定が見つかりません: {}", id))?,
        Err(_) => DashboardConfig::new("adhoc", "Ad hoc", "order by created DESC"),
    };
    if let Some(jql) = jql {
        dashboard.query = jql;
    }

    // JIRA_PAGE_SIZE / JIRA_TIMEOUT_SECS はダッシュボードに指定がなければそのまま使われる
    let config = JiraConfig::from_env().inspect_err(|e| {
        eprintln!("接続設定を読み込めません（JIRA_URL / JIRA_USER / JIRA_API_TOKEN を確認してください）: {}", e);
    })?;
    let client = JiraClient::new(dashboard.apply_to(config))?;

    let records = fetch_records(&client, &dashboard.search_query()?, &dashboard.extractor()).await?;

    if records.is_empty() {
        eprintln!("一致するチケットはありません");
    }

    let visible = dashboard.filter.apply(&records);
    for record in visible {
        println!("{}", serde_json::to_string(record)?);
    }

    Ok(())
}
