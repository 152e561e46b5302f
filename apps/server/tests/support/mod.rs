#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod shared;

use anyhow::Context as _;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use fittrack::{
    api::create_router,
    config::StoreBackend,
    db::{MemoryDocumentStore, PostgresDocumentStore},
    models::Catalog,
    AppState, Config,
};
use futures::FutureExt as _;
use serde_json::Value;
use sqlx::Connection as _;
use std::{future::Future, pin::Pin, sync::Arc};
use tower::ServiceExt as _;
use url::Url;
use uuid::Uuid;

pub use assertions::*;
pub use builders::*;

/// The full router over a fresh store: in-memory, or a private schema of the
/// test database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    schema: Option<TestSchema>,
}

struct TestSchema {
    name: String,
    admin_database_url: String,
    store: PostgresDocumentStore,
}

impl TestApp {
    pub fn new() -> anyhow::Result<Self> {
        Self::new_with_config(|_| {})
    }

    pub fn new_with_config(configure: impl FnOnce(&mut Config)) -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.database.backend = StoreBackend::Memory;
        configure(&mut config);

        let catalog = Catalog::new(&config.listing).context("build catalog")?;
        let store = Arc::new(MemoryDocumentStore::with_unique_fields(
            catalog.unique_fields(),
        ));
        let state = AppState::with_store(config, store).context("initialize AppState")?;
        let router = create_router(state.clone());

        Ok(Self {
            router,
            state,
            schema: None,
        })
    }

    /// Postgres-backed app in a fresh schema, or `None` when no test database is
    /// configured.
    pub async fn postgres_with_config(
        configure: impl FnOnce(&mut Config),
    ) -> anyhow::Result<Option<Self>> {
        let shared = shared::shared().await?;
        let Some(admin_database_url) = shared.database_url.clone() else {
            return Ok(None);
        };
        let mut config = shared.base_config.clone();
        configure(&mut config);
        config.database.backend = StoreBackend::Postgres;

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let mut admin_conn = sqlx::PgConnection::connect(&admin_database_url)
            .await
            .context("connect admin db for schema create")?;
        sqlx::query(&format!(r#"CREATE SCHEMA "{}""#, schema))
            .execute(&mut admin_conn)
            .await
            .context("create test schema")?;
        let _ = admin_conn.close().await;

        config.database.url = with_search_path(&admin_database_url, &schema)?;
        let store = PostgresDocumentStore::connect(&config.database)
            .await
            .context("connect test schema")?;
        store.migrate().await.context("migrate test schema")?;

        let state = AppState::with_store(config, Arc::new(store.clone()))
            .context("initialize AppState")?;
        let router = create_router(state.clone());

        Ok(Some(Self {
            router,
            state,
            schema: Some(TestSchema {
                name: schema,
                admin_database_url,
                store,
            }),
        }))
    }

    pub fn backend(&self) -> &'static str {
        self.state.store.backend()
    }

    pub async fn cleanup(self) -> anyhow::Result<()> {
        let Some(schema) = self.schema else {
            return Ok(());
        };
        schema.store.pool().close().await;

        let mut admin_conn = sqlx::PgConnection::connect(&schema.admin_database_url)
            .await
            .context("connect admin db for schema drop")?;
        sqlx::query(&format!(r#"DROP SCHEMA "{}" CASCADE"#, schema.name))
            .execute(&mut admin_conn)
            .await
            .context("drop test schema")?;

        Ok(())
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_extra_headers(method, path_and_query, body, &[])
            .await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut request = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header("host", "example.org")
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .body(match body {
                Some(bytes) => Body::from(bytes),
                None => Body::empty(),
            })
            .context("build request")?;

        for (name, value) in extra_headers {
            request.headers_mut().insert(
                name.parse::<HeaderName>().context("parse header name")?,
                value.parse::<HeaderValue>().context("parse header value")?,
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    /// GET and decode the JSON body.
    pub async fn get_json(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, body) = self.request(Method::GET, path_and_query, None).await?;
        let value = serde_json::from_slice(&body).context("decode response body")?;
        Ok((status, value))
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json(&self, path: &str, body: &Value) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, bytes) = self
            .request(Method::POST, path, Some(to_json_body(body)?))
            .await?;
        let value = serde_json::from_slice(&bytes).context("decode response body")?;
        Ok((status, value))
    }

    /// Create a document and return the stored body.
    pub async fn create(&self, collection: &str, body: &Value) -> anyhow::Result<Value> {
        let (status, value) = self.post_json(&format!("/api/{collection}"), body).await?;
        assert_status(status, StatusCode::CREATED, &format!("create {collection}"));
        value
            .get("data")
            .cloned()
            .context("created document in data")
    }

    /// Create a document and return its id.
    pub async fn create_id(&self, collection: &str, body: &Value) -> anyhow::Result<String> {
        let created = self.create(collection, body).await?;
        created["id"]
            .as_str()
            .map(str::to_string)
            .context("created document id")
    }
}

pub type Scenario<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>;

/// Run `scenario` against the in-memory store, then against Postgres when a test
/// database is configured.
pub async fn with_each_store<F>(scenario: F) -> anyhow::Result<()>
where
    F: for<'a> Fn(&'a TestApp) -> Scenario<'a>,
{
    with_each_store_with_config(|_| {}, scenario).await
}

pub async fn with_each_store_with_config<C, F>(configure: C, scenario: F) -> anyhow::Result<()>
where
    C: Fn(&mut Config),
    F: for<'a> Fn(&'a TestApp) -> Scenario<'a>,
{
    let memory = TestApp::new_with_config(&configure)?;
    scenario(&memory).await.context("memory store")?;

    let Some(app) = TestApp::postgres_with_config(&configure).await? else {
        return Ok(());
    };

    let result = std::panic::AssertUnwindSafe(scenario(&app))
        .catch_unwind()
        .await;
    let cleanup_result = app.cleanup().await;

    if let Err(e) = cleanup_result {
        eprintln!("test schema cleanup failed: {e:?}");
    }

    match result {
        Ok(r) => r.context("postgres store"),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn with_search_path(database_url: &str, schema: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(database_url).context("parse database URL")?;
    url.query_pairs_mut()
        .append_pair("options", &format!("-c search_path={}", schema));
    Ok(url.to_string())
}
