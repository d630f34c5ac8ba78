use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use common::storage::BlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::{AppConfig, StorageBackend};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;

    let db = server::database::init_db(&config.database.url).await?;
    info!("Connected to the database and synced the schema");

    let blob_store: Arc<dyn BlobStore> = match config.storage.backend {
        StorageBackend::S3 => Arc::new(S3BlobStore::new(
            &config.storage.bucket,
            &config.storage.region,
            config.storage.endpoint.as_deref(),
        )?),
        StorageBackend::Filesystem => {
            Arc::new(FilesystemBlobStore::new(config.storage.base_path.clone()).await?)
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let app = server::build_router(AppState {
        db,
        blob_store,
        config,
    });

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // One JSON object per line when requested, for log shippers.
    if std::env::var("CATALOG_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
