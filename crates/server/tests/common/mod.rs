//! Common test utilities for API testing with mocks.
//!
//! Builds the real router over a scheduler whose jobs drive a monitor wired
//! to mock upstreams and a temporary SQLite store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use showrunner_core::{
    placer::{FsMover, PathTranslator, PlacerConfig},
    store::SqliteMediaStore,
    testing::{
        MockDownloadClient, MockEpisodeListProvider, MockMetadataProvider, MockReleaseSearcher,
    },
    Config, JobStatus, Monitor, MonitorConfig, MonitorServices, Scheduler,
};
use showrunner_server::{create_router, AppState};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use showrunner_core::testing::fixtures;

/// In-process router with a registered, not started, scheduler.
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<SqliteMediaStore>,
    pub metadata: Arc<MockMetadataProvider>,
    pub client: Arc<MockDownloadClient>,
    _temp_dir: TempDir,
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.database.path = temp_dir.path().join("test.db");
        config.placer = PlacerConfig::default().with_library_root(temp_dir.path().join("library"));
        config.monitor = MonitorConfig {
            run_discovery_on_start: false,
            ..Default::default()
        };

        let store = Arc::new(
            SqliteMediaStore::new(&config.database.path).expect("Failed to create store"),
        );
        let metadata = Arc::new(MockMetadataProvider::new());
        let client = Arc::new(MockDownloadClient::new());

        let services = MonitorServices {
            store: store.clone(),
            metadata: metadata.clone(),
            episode_list: Arc::new(MockEpisodeListProvider::new()),
            searcher: Arc::new(MockReleaseSearcher::new()),
            download_client: client.clone(),
            mover: Arc::new(FsMover::new(config.placer.clone())),
            path_translator: PathTranslator::new(&config.path_mappings),
            events: None,
        };
        let monitor = Arc::new(Monitor::new(services, &config.download));

        let scheduler = Scheduler::new();
        monitor
            .register_jobs(&scheduler, &config.monitor)
            .expect("Failed to register jobs");

        let state = Arc::new(AppState::new(config, scheduler));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            store,
            metadata,
            client,
            _temp_dir: temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Poll job status until `done` holds for the named job.
    pub async fn wait_for_job<F>(&self, name: &str, done: F) -> JobStatus
    where
        F: Fn(&JobStatus) -> bool,
    {
        for _ in 0..100 {
            let status = self
                .state
                .scheduler()
                .status()
                .into_iter()
                .find(|s| s.name == name)
                .expect("job is registered");
            if done(&status) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job '{}' did not reach the expected state", name);
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
