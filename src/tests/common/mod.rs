// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;

use serde_json::Value;

use crate::client::VarhubClient;
use crate::config::settings::ClientConfiguration;

/// Make test logs visible under RUST_LOG; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Standard response envelope with a single query result.
pub fn rest_body(results: Vec<Value>) -> Value {
    json!({
        "apiVersion": "v2",
        "responses": [{
            "numResults": results.len(),
            "numMatches": results.len(),
            "results": results
        }]
    })
}

pub fn login_body(token: &str) -> Value {
    rest_body(vec![json!({ "token": token })])
}

pub fn status_body(name: &str, message: &str) -> Value {
    rest_body(vec![json!({
        "internal": {
            "status": { "name": name, "date": "20240101000000", "message": message }
        }
    })])
}

pub fn error_body(message: &str) -> Value {
    json!({
        "events": [{ "type": "ERROR", "message": message }],
        "responses": []
    })
}

pub fn test_config(addr: SocketAddr) -> ClientConfiguration {
    ClientConfiguration::new(format!("http://{}", addr)).expect("test configuration")
}

pub fn test_client(addr: SocketAddr) -> VarhubClient {
    VarhubClient::new(test_config(addr)).expect("test client")
}

/// All sub-clients of a facade, for token staleness assertions.
pub fn all_clients(client: &VarhubClient) -> Vec<&crate::rest::resource::ResourceClient> {
    vec![
        &client.users,
        &client.projects,
        &client.studies,
        &client.files,
        &client.jobs,
        &client.samples,
        &client.individuals,
        &client.families,
        &client.cohorts,
        &client.panels,
        &client.variants,
        &client.meta,
    ]
}
