//! End-to-end sync scenarios: a wiremock SelectLine deployment on one
//! side, a fresh migrated Postgres from the sqlx test harness on the
//! other. Ignored by default; run with `cargo test -- --ignored` against
//! a reachable `DATABASE_URL`.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slsync_client::SelectLineClient;
use slsync_core::SelectLineConfig;
use slsync_db::{count_articles, count_groups, get_article_by_external_id};
use slsync_sync::{sync_all, sync_articles, sync_groups};

fn mock_config(base_url: &str) -> SelectLineConfig {
    SelectLineConfig {
        base_url: base_url.to_string(),
        username: "sync".to_string(),
        password: "secret".to_string(),
        app_key: "app".to_string(),
        login_path: "api/Login".to_string(),
        groups_path: "api/ArticleGroups".to_string(),
        articles_path: "api/Articles".to_string(),
        auth_header: "Authorization".to_string(),
        auth_prefix: "LoginId ".to_string(),
        page_param: "page".to_string(),
        page_size_param: "items".to_string(),
        group_filter_param: "articleGroup".to_string(),
        page_size: 100,
        request_timeout_secs: 5,
        max_retries: 1,
        retry_backoff_ms: 0,
    }
}

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AccessToken": "tok-1",
            "ExpiresIn": 3600
        })))
        .mount(server)
        .await;
}

async fn mock_groups(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/ArticleGroups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_articles(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/Articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn sync_all_skips_articles_without_a_mirrored_group(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    mock_groups(
        &server,
        json!([
            { "Number": "G1", "Name": "Boxes" },
            { "Number": "G2", "Name": "Tape" }
        ]),
    )
    .await;
    mock_articles(
        &server,
        json!([
            { "Number": "A1", "ArticleGroup": "G1", "Name": "Small box", "IsShopArticle": true },
            { "Number": "A2", "ArticleGroup": "G2", "Name": "Packing tape", "IsShopArticle": true },
            { "Number": "A3", "ArticleGroup": "G3", "Name": "Mystery", "IsShopArticle": true }
        ]),
    )
    .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    let report = sync_all(&pool, &mut client).await.unwrap();

    assert_eq!(report.groups.read, 2);
    assert_eq!(report.groups.upserts, 2);
    assert_eq!(report.groups.failures, 0);

    assert_eq!(report.articles.read, 3);
    assert_eq!(report.articles.upserts, 2);
    assert_eq!(report.articles.skipped_missing_group, 1);
    assert_eq!(report.articles.failures, 0);

    assert_eq!(count_groups(&pool).await.unwrap().total, 2);
    assert_eq!(count_articles(&pool).await.unwrap().total, 2);
    assert!(get_article_by_external_id(&pool, "A3")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn repeated_sync_runs_are_idempotent(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    mock_groups(&server, json!([{ "Number": "G1", "Name": "Boxes" }])).await;
    mock_articles(
        &server,
        json!([
            { "Number": "A1", "ArticleGroup": "G1", "Name": "Small box", "IsShopArticle": true }
        ]),
    )
    .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    sync_all(&pool, &mut client).await.unwrap();
    let second = sync_all(&pool, &mut client).await.unwrap();

    assert_eq!(second.groups.upserts, 1);
    assert_eq!(second.articles.upserts, 1);
    assert_eq!(count_groups(&pool).await.unwrap().total, 1);
    assert_eq!(count_articles(&pool).await.unwrap().total, 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn one_bad_record_does_not_abort_the_article_phase(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    mock_groups(&server, json!([{ "Number": "G1", "Name": "Boxes" }])).await;
    // "\u{0}" is rejected by Postgres TEXT columns, forcing a per-record
    // upsert failure for A2 only.
    mock_articles(
        &server,
        json!([
            { "Number": "A1", "ArticleGroup": "G1", "Name": "Fine", "IsShopArticle": true },
            { "Number": "A2", "ArticleGroup": "G1", "Name": "Bro\u{0}ken", "IsShopArticle": true },
            { "Number": "A3", "ArticleGroup": "G1", "Name": "Also fine", "IsShopArticle": true }
        ]),
    )
    .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    sync_groups(&pool, &mut client).await.unwrap();
    let report = sync_articles(&pool, &mut client).await.unwrap();

    assert_eq!(report.read, 3);
    assert_eq!(report.upserts, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(count_articles(&pool).await.unwrap().total, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn records_without_external_ids_count_as_failures(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    mock_groups(
        &server,
        json!([
            { "Number": "G1", "Name": "Boxes" },
            { "Name": "No number here" }
        ]),
    )
    .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    let report = sync_groups(&pool, &mut client).await.unwrap();

    assert_eq!(report.read, 2);
    assert_eq!(report.upserts, 1);
    assert_eq!(report.failures, 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn bulk_group_fetch_failure_aborts_the_run(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/ArticleGroups"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    let result = sync_all(&pool, &mut client).await;

    assert!(result.is_err(), "a failed bulk fetch must abort the run");
    assert_eq!(count_groups(&pool).await.unwrap().total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn group_rename_propagates_on_next_run(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;

    let first = Mock::given(method("GET"))
        .and(path("/api/ArticleGroups"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "Number": "G1", "Name": "Boxes" }])),
        )
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    sync_groups(&pool, &mut client).await.unwrap();
    drop(first);

    mock_groups(&server, json!([{ "Number": "G1", "Name": "Cartons" }])).await;
    sync_groups(&pool, &mut client).await.unwrap();

    let row = slsync_db::get_group_by_external_id(&pool, "G1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.name, "Cartons");
    assert_eq!(count_groups(&pool).await.unwrap().total, 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn enrichment_merges_detail_into_attributes(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    mock_groups(&server, json!([{ "Number": "G1", "Name": "Boxes" }])).await;
    mock_articles(
        &server,
        json!([
            { "Number": "A1", "ArticleGroup": "G1", "Name": "Small box",
              "IsShopArticle": true, "Price": 9.9 }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/Articles/A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Stock": 40,
            "Price": 11.0
        })))
        .mount(&server)
        .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    sync_all(&pool, &mut client).await.unwrap();

    let row = get_article_by_external_id(&pool, "A1")
        .await
        .unwrap()
        .unwrap();
    assert!(row.attributes_enriched_at.is_none());

    let (enriched, outcome) =
        slsync_sync::ensure_article_enriched(&pool, &mut client, row, 7).await;
    assert_eq!(outcome, slsync_sync::EnrichOutcome::Enriched);
    assert_eq!(enriched.attributes["Stock"], 40);
    assert_eq!(enriched.attributes["Price"], 11.0);
    assert!(enriched.attributes_enriched_at.is_some());

    // A second call within the freshness window never re-fetches.
    let (_, outcome) = slsync_sync::ensure_article_enriched(
        &pool,
        &mut client,
        get_article_by_external_id(&pool, "A1").await.unwrap().unwrap(),
        7,
    )
    .await;
    assert_eq!(outcome, slsync_sync::EnrichOutcome::Fresh);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn enrichment_failure_serves_the_stored_row(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_login(&server).await;
    mock_groups(&server, json!([{ "Number": "G1", "Name": "Boxes" }])).await;
    mock_articles(
        &server,
        json!([
            { "Number": "A1", "ArticleGroup": "G1", "Name": "Small box",
              "IsShopArticle": true, "Price": 9.9 }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/Articles/A1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut client = SelectLineClient::new(mock_config(&server.uri())).unwrap();
    sync_all(&pool, &mut client).await.unwrap();

    let row = get_article_by_external_id(&pool, "A1")
        .await
        .unwrap()
        .unwrap();
    let (returned, outcome) =
        slsync_sync::ensure_article_enriched(&pool, &mut client, row, 7).await;
    assert_eq!(outcome, slsync_sync::EnrichOutcome::UnknownSku);
    assert_eq!(returned.attributes["Price"], 9.9);
    assert!(returned.attributes_enriched_at.is_none());
}
