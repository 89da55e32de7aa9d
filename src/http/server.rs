//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the account store, manager, credentials and policy from config
//! - Create Axum Router with all handlers
//! - Attach observers per operation
//! - Wire up middleware (tracing, request ID, timeout, body limit, metrics)
//! - Serve until shutdown, applying user registry reloads

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    handler::Handler,
    http::Request,
    middleware::{self, from_fn_with_state},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::health::{AccountHealthCheck, HealthIndicator};
use crate::http::handlers;
use crate::http::middleware::{observe_operation, track_requests, ObservedOperation};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::manager::AccountManager;
use crate::observability::metrics::ACCOUNT_LIST_COUNTER;
use crate::observability::{ops, Interceptor, LoggingObserver, MetricsObserver, Observer};
use crate::security::{
    access_control_middleware, AccessControlState, AuthorizationPolicy, InMemoryCredentials,
    PolicyError,
};
use crate::store::{AccountStore, InMemoryAccountStore, ObservedStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: AccountManager,
    pub health: Arc<dyn HealthIndicator>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid authorization rules: {0}")]
    Policy(#[from] PolicyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the account service.
pub struct HttpServer {
    router: Router,
    manager: AccountManager,
    credentials: Arc<InMemoryCredentials>,
    list_counter: Arc<MetricsObserver>,
}

impl HttpServer {
    /// Create a server backed by a fresh in-memory store.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let store = InMemoryAccountStore::with_first_id(config.store.first_id);
        Self::with_store(config, store)
    }

    pub fn with_store<S>(config: ServiceConfig, store: S) -> Result<Self, ServerError>
    where
        S: AccountStore + 'static,
    {
        let list_counter = Arc::new(MetricsObserver::new(ACCOUNT_LIST_COUNTER));

        let mut interceptor = Interceptor::new();
        if config.observability.observers_enabled {
            interceptor.attach(ops::ACCOUNT_LIST, list_counter.clone());
            let logging: Arc<dyn Observer> = Arc::new(LoggingObserver::new());
            for operation in ops::STORE_READS {
                interceptor.attach(operation, logging.clone());
            }
        }
        let interceptor = Arc::new(interceptor);
        tracing::debug!(observers = ?interceptor, "Interceptor configured");

        let store: Arc<dyn AccountStore> = Arc::new(ObservedStore::new(store, interceptor.clone()));
        let manager = AccountManager::new(store);

        let credentials = Arc::new(InMemoryCredentials::new(&config.security.users));
        let policy = AuthorizationPolicy::from_config(config.security.rules.as_deref())?;
        tracing::info!(
            users = credentials.len(),
            rules = policy.rules().len(),
            "Security configured"
        );

        let access = AccessControlState {
            policy: Arc::new(policy),
            credentials: credentials.clone(),
            realm: Arc::from(config.security.realm.as_str()),
        };
        let state = AppState {
            manager: manager.clone(),
            health: Arc::new(AccountHealthCheck::new(manager.clone())),
        };

        let router = Self::build_router(&config, state, access, &interceptor);
        Ok(Self {
            router,
            manager,
            credentials,
            list_counter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        access: AccessControlState,
        interceptor: &Arc<Interceptor>,
    ) -> Router {
        let observe = |operation| ObservedOperation::new(interceptor.clone(), operation);

        // Everything here sits behind the rule table, including the fallback.
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/accounts",
                get(handlers::account_summary
                    .layer(from_fn_with_state(observe(ops::ACCOUNT_LIST), observe_operation)))
                .post(handlers::create_account
                    .layer(from_fn_with_state(observe(ops::ACCOUNT_CREATE), observe_operation))),
            )
            .route(
                "/accounts/{id}",
                get(handlers::account_details
                    .layer(from_fn_with_state(observe(ops::ACCOUNT_FETCH), observe_operation))),
            )
            .route(
                "/accounts/{id}/beneficiaries",
                axum::routing::post(handlers::add_beneficiary
                    .layer(from_fn_with_state(observe(ops::BENEFICIARY_ADD), observe_operation)))
                .put(handlers::update_allocations
                    .layer(from_fn_with_state(observe(ops::BENEFICIARY_ALLOCATE), observe_operation))),
            )
            .route(
                "/accounts/{id}/beneficiaries/{name}",
                get(handlers::beneficiary_details
                    .layer(from_fn_with_state(observe(ops::BENEFICIARY_FETCH), observe_operation)))
                .delete(handlers::remove_beneficiary
                    .layer(from_fn_with_state(observe(ops::BENEFICIARY_REMOVE), observe_operation))),
            )
            .route("/authorities", get(handlers::authorities))
            .fallback(handlers::not_found)
            .layer(from_fn_with_state(access, access_control_middleware));

        api.with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = request_id(req).unwrap_or("-"),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let credentials = self.credentials.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                credentials.replace(&config.security.users);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn manager(&self) -> &AccountManager {
        &self.manager
    }

    /// The observer counting "list all accounts" calls.
    pub fn list_counter(&self) -> Arc<MetricsObserver> {
        self.list_counter.clone()
    }

}
