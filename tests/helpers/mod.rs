#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use noteport::config::NoteportConfig;
use noteport::dataview::engine::MetadataQueryEngine;
use noteport::dataview::QueryEngine;
use noteport::note::patch::PatchOptions;
use noteport::rpc::dispatch::Dispatcher;
use noteport::rpc::gateway::{self, AppState, API_KEY_HEADER};
use noteport::tools::NoteTools;
use noteport::vault::memory::MemoryVault;
use noteport::vault::DocumentStore;

pub const TEST_KEY: &str = "test-key";

/// A small vault with headings, block references, and frontmatter.
pub fn sample_vault() -> Arc<MemoryVault> {
    Arc::new(
        MemoryVault::with_documents(
            "sample",
            [
                (
                    "projects/alpha.md",
                    "---\nstatus: active\ntags: [project]\n---\n# Alpha\n\n## Goals\nShip it\n\n## Notes\nA quiet cat ^note1\n",
                ),
                ("daily/2024-01-01.md", "# Monday\n- [ ] water plants\n- [x] call mom\n"),
                ("README.md", "Welcome. The cat sat on the mat.\n"),
            ],
        )
        .unwrap(),
    )
}

pub fn test_config(max_requests: u32) -> NoteportConfig {
    let mut config = NoteportConfig::default();
    config.server.api_key = TEST_KEY.into();
    config.rate_limit.max_requests = max_requests;
    config
}

pub fn tools_for(store: Arc<dyn DocumentStore>) -> NoteTools {
    let engine: Arc<dyn QueryEngine> = Arc::new(MetadataQueryEngine::new(store.clone()));
    NoteTools::new(store, Some(engine), PatchOptions::default())
}

/// Gateway router over `store` with the test key and the given quota.
pub fn test_app(store: Arc<dyn DocumentStore>, max_requests: u32) -> Router {
    let config = test_config(max_requests);
    let dispatcher = Dispatcher::new(tools_for(store));
    gateway::router(AppState::new(&config, dispatcher))
}

pub fn rpc_request(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rpc")
        .header(API_KEY_HEADER, TEST_KEY)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
