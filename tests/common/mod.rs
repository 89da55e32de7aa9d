//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use account_service::config::{SeedAccount, SeedBeneficiary, ServiceConfig};
use account_service::http::HttpServer;
use account_service::lifecycle::{seed_accounts, Shutdown};
use account_service::observability::MetricsObserver;

/// A seeded server running on an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub updates: mpsc::UnboundedSender<ServiceConfig>,
    pub list_counter: Arc<MetricsObserver>,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests authenticate as `user` with the password equal to the name.
    pub fn get(&self, path: &str, user: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).basic_auth(user, Some(user))
    }

    pub fn post(&self, path: &str, user: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).basic_auth(user, Some(user))
    }

    pub fn put(&self, path: &str, user: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).basic_auth(user, Some(user))
    }

    pub fn delete(&self, path: &str, user: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).basic_auth(user, Some(user))
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// John Doe's account with two beneficiaries at 50% each.
pub fn john_doe() -> SeedAccount {
    let beneficiary = |name: &str| SeedBeneficiary {
        name: name.into(),
        allocation: "0.5".parse().unwrap(),
    };
    SeedAccount {
        number: "1234567890".into(),
        name: "John Doe".into(),
        beneficiaries: vec![beneficiary("Jane Doe"), beneficiary("Junior Doe")],
    }
}

/// Start a server with `config`, seeded with John Doe when no seed is given.
pub async fn start_service(mut config: ServiceConfig) -> TestService {
    if config.seed.is_empty() {
        config.seed.push(john_doe());
    }

    let server = HttpServer::new(config.clone()).unwrap();
    seed_accounts(server.manager(), &config.seed).await.unwrap();
    let list_counter = server.list_counter();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (updates, config_updates) = mpsc::unbounded_channel();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let client = reqwest::Client::new();
    // Any answer will do: without the anonymous health rule this is a 401.
    for _ in 0..50 {
        if client.get(format!("http://{addr}/health")).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestService {
        addr,
        client,
        updates,
        list_counter,
        shutdown,
    }
}
