//! Route definitions and sub-API mount points

use axum::{routing::get, Router};

use super::handlers;
use super::state::AppState;
use crate::docs::OperationDoc;

/// Prefix the simulation sub-API is nested under
pub const SIMULATION_PREFIX: &str = "/api";
/// Prefix the score sub-API is nested under
pub const SCORE_PREFIX: &str = "/api/score";

/// Routers supplied by the simulation and score sub-APIs.
///
/// The handlers themselves live outside this crate; the backend only
/// decides where they are mounted and which of them sit behind the gate.
#[derive(Default)]
pub struct ApiMounts {
    pub(crate) simulation: Router,
    pub(crate) score: Router,
    pub(crate) protected_score: Router,
    pub(crate) operations: Vec<OperationDoc>,
}

impl ApiMounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes nested under `/api`
    pub fn simulation(mut self, router: Router) -> Self {
        self.simulation = self.simulation.merge(router);
        self
    }

    /// Public routes nested under `/api/score`
    pub fn score(mut self, router: Router) -> Self {
        self.score = self.score.merge(router);
        self
    }

    /// Routes nested under `/api/score` that require `x-api-key`
    pub fn protected_score(mut self, router: Router) -> Self {
        self.protected_score = self.protected_score.merge(router);
        self
    }

    /// Register an operation in the generated API documentation
    pub fn document(mut self, operation: OperationDoc) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(&self) -> &[OperationDoc] {
        &self.operations
    }
}

/// Liveness and health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
}
