use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use ::common::storage::filesystem::FilesystemBlobStore;
use server::config::{
    AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageBackend, StorageConfig,
};
use server::state::AppState;

pub mod routes {
    pub const HEALTHZ: &str = "/healthz";
    pub const USER: &str = "/v2/user";
    pub const PRODUCT: &str = "/v2/product";

    pub fn user(id: i64) -> String {
        format!("/v2/user/{id}")
    }

    pub fn product(id: i64) -> String {
        format!("/v2/product/{id}")
    }

    pub fn images(product_id: i64) -> String {
        format!("/v2/product/{product_id}/image")
    }

    pub fn image(product_id: i64, image_id: i64) -> String {
        format!("/v2/product/{product_id}/image/{image_id}")
    }
}

/// Default credentials registered by `register_default_users`.
pub const ALICE: (&str, &str) = ("alice@example.com", "wonderland");
pub const BOB: (&str, &str) = ("bob@example.com", "builder");

/// A tiny but valid-enough PNG payload (magic bytes + padding).
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];

/// A running test server backed by a tempdir SQLite database and a tempdir
/// filesystem blob store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    /// Root of the filesystem blob store, for on-disk assertions.
    pub blob_root: PathBuf,
    _tmp: tempfile::TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");

        let db_path = tmp.path().join("catalog.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let blob_root = tmp.path().join("blobs");
        let blob_store = Arc::new(
            FilesystemBlobStore::new(blob_root.clone())
                .await
                .expect("Failed to initialize blob store"),
        );

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                bucket: String::new(),
                region: "us-east-1".to_string(),
                endpoint: None,
                base_path: blob_root.clone(),
                max_upload_size: 1024 * 1024,
            },
        };

        let app = server::build_router(AppState {
            db: db.clone(),
            blob_store,
            config,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server crashed");
        });

        TestApp {
            addr,
            client: Client::new(),
            db,
            blob_root,
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, creds: Option<(&str, &str)>) -> TestResponse {
        send(self.client.get(self.url(path)), creds).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        creds: Option<(&str, &str)>,
    ) -> TestResponse {
        send(self.client.post(self.url(path)).json(body), creds).await
    }

    pub async fn put_json(
        &self,
        path: &str,
        body: &Value,
        creds: Option<(&str, &str)>,
    ) -> TestResponse {
        send(self.client.put(self.url(path)).json(body), creds).await
    }

    pub async fn patch_json(
        &self,
        path: &str,
        body: &Value,
        creds: Option<(&str, &str)>,
    ) -> TestResponse {
        send(self.client.patch(self.url(path)).json(body), creds).await
    }

    pub async fn delete(&self, path: &str, creds: Option<(&str, &str)>) -> TestResponse {
        send(self.client.delete(self.url(path)), creds).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        creds: Option<(&str, &str)>,
    ) -> TestResponse {
        send(self.client.post(self.url(path)).multipart(form), creds).await
    }

    /// Register a user, asserting success, and return the new user's id.
    pub async fn register(&self, username: &str, password: &str) -> i64 {
        let res = self
            .post_json(
                routes::USER,
                &json!({
                    "username": username,
                    "password": password,
                    "first_name": "Test",
                    "last_name": "User"
                }),
                None,
            )
            .await;
        assert_eq!(res.status, 201, "Registration failed: {}", res.text);
        res.body["id"].as_i64().expect("user id missing")
    }

    /// Register the ALICE and BOB fixtures; returns (alice_id, bob_id).
    pub async fn register_default_users(&self) -> (i64, i64) {
        let alice = self.register(ALICE.0, ALICE.1).await;
        let bob = self.register(BOB.0, BOB.1).await;
        (alice, bob)
    }

    /// Create a product owned by `creds`, asserting success; returns its id.
    pub async fn create_product(&self, creds: (&str, &str), sku: &str) -> i64 {
        let res = self
            .post_json(
                routes::PRODUCT,
                &json!({
                    "name": "Widget",
                    "description": "A widget",
                    "sku": sku,
                    "manufacturer": "Acme",
                    "quantity": 5
                }),
                Some(creds),
            )
            .await;
        assert_eq!(res.status, 201, "Product creation failed: {}", res.text);
        res.body["id"].as_i64().expect("product id missing")
    }

    /// Upload a PNG named `file_name`, asserting success; returns the body.
    pub async fn upload_png(
        &self,
        creds: (&str, &str),
        product_id: i64,
        file_name: &str,
    ) -> Value {
        let form = reqwest::multipart::Form::new().part("image", png_part(file_name));
        let res = self
            .post_multipart(&routes::images(product_id), form, Some(creds))
            .await;
        assert_eq!(res.status, 201, "Image upload failed: {}", res.text);
        res.body
    }
}

/// Build a multipart PNG file part.
pub fn png_part(file_name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("valid mime")
}

async fn send(builder: reqwest::RequestBuilder, creds: Option<(&str, &str)>) -> TestResponse {
    let builder = match creds {
        Some((username, password)) => builder.basic_auth(username, Some(password)),
        None => builder,
    };
    let res = builder.send().await.expect("Request failed");
    let status = res.status().as_u16();
    let text = res.text().await.expect("Failed to read body");
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    TestResponse { status, text, body }
}
