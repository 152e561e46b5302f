use anyhow::Context as _;
use fittrack::Config;
use std::sync::Arc;
use tokio::sync::OnceCell;

static SHARED: OnceCell<Arc<SharedTestResources>> = OnceCell::const_new();

pub struct SharedTestResources {
    pub base_config: Config,
    /// Admin URL for per-test schemas; `None` skips the Postgres runs.
    pub database_url: Option<String>,
}

pub async fn shared() -> anyhow::Result<Arc<SharedTestResources>> {
    SHARED
        .get_or_try_init(|| async {
            init_tracing();

            // Only the database section comes from the environment; listing
            // defaults stay fixed so expectations hold on every machine.
            let loaded = Config::load().context("load Config for tests")?;
            let mut config = Config::default();
            config.database = loaded.database;
            let database_url = config.database.test_database_url.clone();
            if database_url.is_none() {
                eprintln!(
                    "FITTRACK__DATABASE__TEST_DATABASE_URL is unset; running the in-memory store only"
                );
            }

            config.database.pool_min_size = 0;
            config.database.pool_max_size = 2;
            config.database.pool_timeout_seconds = 30;

            Ok(Arc::new(SharedTestResources {
                base_config: config,
                database_url,
            }))
        })
        .await
        .cloned()
}

fn init_tracing() {
    use std::sync::OnceLock;
    use tracing_subscriber::prelude::*;
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "fittrack=info,sqlx=warn".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}
