//! Usage-metered gate
//!
//! Authorizes a request, runs the protected handler and writes exactly one
//! usage record for every attempt that can be attributed to a key. Timing
//! starts before verification so authorization latency is included.
//!
//! A handler error or panic is recorded as 500 and then propagated. If the
//! gate future is dropped mid-handler (client disconnect, timeout), a drop
//! guard spawns the 500 record onto the current runtime.

use std::future::Future;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::UsageRecord;
use crate::infrastructure::api_key::{Authorization, KeyVerifier};
use crate::infrastructure::observability::{record_gate_decision, GateOutcome};
use crate::infrastructure::usage::UsageLedgerTrait;

use super::credential::RequestMetadata;

/// Status recorded when the handler fails, panics or is cancelled
const FAULT_STATUS: u16 = 500;

/// Status recorded for a rejected credential that maps to a key
const REJECTED_STATUS: u16 = 401;

/// Why the gate refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("API key is required")]
    MissingCredential,
    /// Malformed, unknown and deactivated credentials are indistinguishable
    #[error("Invalid API key")]
    InvalidCredential,
}

/// Error returned from [`UsageGate::guard`]
#[derive(Debug, Error)]
pub enum GateError<E> {
    #[error(transparent)]
    Rejected(#[from] GateRejection),
    #[error("handler failed: {0}")]
    Handler(E),
}

/// Responses the gate can read a status code from
pub trait GatedResponse {
    fn status_code(&self) -> u16;
}

impl<B> GatedResponse for axum::http::Response<B> {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// Wraps protected handlers with authorization and usage accounting
pub struct UsageGate {
    verifier: Arc<KeyVerifier>,
    ledger: Arc<dyn UsageLedgerTrait>,
}

impl std::fmt::Debug for UsageGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageGate")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl UsageGate {
    pub fn new(verifier: Arc<KeyVerifier>, ledger: Arc<dyn UsageLedgerTrait>) -> Self {
        Self { verifier, ledger }
    }

    /// Authorize `credential` and run `handler` with the admitted key id.
    pub async fn guard<F, Fut, R, E>(
        &self,
        credential: Option<String>,
        metadata: RequestMetadata,
        handler: F,
    ) -> Result<R, GateError<E>>
    where
        F: FnOnce(ApiKeyId) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: GatedResponse,
    {
        let started = Instant::now();

        let Some(credential) = credential else {
            record_gate_decision(GateOutcome::MissingCredential);
            debug!(endpoint = %metadata.endpoint, "Rejected request without API key");
            return Err(GateRejection::MissingCredential.into());
        };

        let key_id = match self.verifier.authorize(&credential).await {
            Authorization::Granted(key_id) => key_id,
            Authorization::Denied(resolved) => {
                record_gate_decision(GateOutcome::Rejected);

                if let Some(key_id) = resolved {
                    debug!(key_id = %key_id, endpoint = %metadata.endpoint, "Rejected inactive API key");
                    let record = build_record(key_id, &metadata, REJECTED_STATUS, started);
                    self.ledger.record(record).await;
                } else {
                    debug!(endpoint = %metadata.endpoint, "Rejected unknown API key");
                }

                return Err(GateRejection::InvalidCredential.into());
            }
        };

        let mut pending = PendingRecord {
            ledger: self.ledger.clone(),
            key_id,
            metadata,
            started,
            armed: true,
        };

        let outcome = AssertUnwindSafe(handler(key_id)).catch_unwind().await;

        match outcome {
            Ok(Ok(response)) => {
                record_gate_decision(GateOutcome::Admitted);
                let record = pending.complete(response.status_code());
                self.ledger.record(record).await;
                Ok(response)
            }
            Ok(Err(fault)) => {
                record_gate_decision(GateOutcome::HandlerFault);
                let record = pending.complete(FAULT_STATUS);
                self.ledger.record(record).await;
                Err(GateError::Handler(fault))
            }
            Err(panic) => {
                record_gate_decision(GateOutcome::HandlerFault);
                warn!(key_id = %key_id, "Gated handler panicked");
                let record = pending.complete(FAULT_STATUS);
                self.ledger.record(record).await;
                resume_unwind(panic)
            }
        }
    }
}

fn build_record(
    key_id: ApiKeyId,
    metadata: &RequestMetadata,
    status_code: u16,
    started: Instant,
) -> UsageRecord {
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    UsageRecord::new(key_id, &metadata.endpoint, &metadata.method, status_code)
        .with_response_time_ms(elapsed_ms)
        .with_ip_address(&metadata.ip_address)
        .with_user_agent(&metadata.user_agent)
}

/// Accounting owed for an admitted request
struct PendingRecord {
    ledger: Arc<dyn UsageLedgerTrait>,
    key_id: ApiKeyId,
    metadata: RequestMetadata,
    started: Instant,
    armed: bool,
}

impl PendingRecord {
    fn complete(&mut self, status_code: u16) -> UsageRecord {
        self.armed = false;
        build_record(self.key_id, &self.metadata, status_code, self.started)
    }
}

impl Drop for PendingRecord {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        record_gate_decision(GateOutcome::HandlerFault);
        let record = build_record(self.key_id, &self.metadata, FAULT_STATUS, self.started);

        match Handle::try_current() {
            Ok(handle) => {
                debug!(key_id = %self.key_id, "Gated request cancelled, recording fault");
                let ledger = self.ledger.clone();
                handle.spawn(async move { ledger.record(record).await });
            }
            Err(_) => {
                warn!(key_id = %self.key_id, "No runtime to record cancelled request usage");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Response, StatusCode};

    use crate::domain::usage::{MockUsageRepository, UsageQuery, UsageRepository};
    use crate::domain::DomainError;
    use crate::infrastructure::api_key::{ApiKeyService, InMemoryApiKeyRepository};
    use crate::infrastructure::usage::{InMemoryUsageRepository, UsageLedger};

    struct Fixture {
        service: ApiKeyService,
        ledger: Arc<UsageLedger>,
        usage: Arc<InMemoryUsageRepository>,
        gate: Arc<UsageGate>,
    }

    fn fixture() -> Fixture {
        let keys = Arc::new(InMemoryApiKeyRepository::new());
        let usage = Arc::new(InMemoryUsageRepository::default());
        let ledger = Arc::new(UsageLedger::new(usage.clone()));
        let verifier = Arc::new(KeyVerifier::new(keys.clone()));

        Fixture {
            service: ApiKeyService::new(keys),
            gate: Arc::new(UsageGate::new(verifier, ledger.clone())),
            ledger,
            usage,
        }
    }

    fn metadata(endpoint: &str) -> RequestMetadata {
        RequestMetadata::new(endpoint, "GET")
    }

    fn respond(status: StatusCode) -> Result<Response<Body>, Infallible> {
        Ok(Response::builder().status(status).body(Body::empty()).unwrap())
    }

    async fn total_usage(ledger: &UsageLedger) -> u64 {
        ledger.all_keys_usage(30).await.unwrap().values().sum()
    }

    #[tokio::test]
    async fn test_admitted_request_is_recorded() {
        let f = fixture();
        let issued = f.service.issue("k", None).await.unwrap();

        let response = f
            .gate
            .guard(Some(issued.key.clone()), metadata("/v1/keys/verify"), |key_id| async move {
                assert_eq!(key_id, issued.id);
                respond(StatusCode::OK)
            })
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let stats = f.ledger.stats_for_key(&issued.id, 30).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.requests_by_endpoint.get("/v1/keys/verify"), Some(&1));
    }

    #[tokio::test]
    async fn test_handler_status_is_recorded_verbatim() {
        let f = fixture();
        let issued = f.service.issue("k", None).await.unwrap();

        let response = f
            .gate
            .guard(Some(issued.key.clone()), metadata("/x"), |_| async {
                respond(StatusCode::NOT_FOUND)
            })
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let stats = f.ledger.stats_for_key(&issued.id, 30).await.unwrap().unwrap();
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_missing_credential_writes_nothing() {
        let f = fixture();

        let result = f
            .gate
            .guard(None, metadata("/x"), |_| async { respond(StatusCode::OK) })
            .await;

        assert!(matches!(
            result,
            Err(GateError::Rejected(GateRejection::MissingCredential))
        ));
        assert!(f.ledger.overall_stats(30).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_credential_writes_nothing() {
        let f = fixture();
        f.service.issue("k", None).await.unwrap();
        let before = total_usage(&f.ledger).await;

        let result = f
            .gate
            .guard(Some("not-a-valid-key".to_string()), metadata("/x"), |_| async {
                respond(StatusCode::OK)
            })
            .await;

        assert!(matches!(
            result,
            Err(GateError::Rejected(GateRejection::InvalidCredential))
        ));
        assert_eq!(total_usage(&f.ledger).await, before);
    }

    #[tokio::test]
    async fn test_deactivated_key_is_recorded_as_401() {
        let f = fixture();
        let issued = f.service.issue("k", None).await.unwrap();
        f.service.deactivate(&issued.id).await.unwrap();

        let result = f
            .gate
            .guard(Some(issued.key.clone()), metadata("/x"), |_| async {
                if true {
                    panic!("handler must not run for a deactivated key");
                }
                respond(StatusCode::OK)
            })
            .await;

        assert!(matches!(
            result,
            Err(GateError::Rejected(GateRejection::InvalidCredential))
        ));
        let stats = f.ledger.stats_for_key(&issued.id, 30).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_ci_runner_scenario() {
        let f = fixture();
        let issued = f.service.issue("ci-runner", None).await.unwrap();

        for _ in 0..3 {
            f.gate
                .guard(Some(issued.key.clone()), metadata("/v1/keys/verify"), |_| async {
                    respond(StatusCode::OK)
                })
                .await
                .unwrap();
        }

        let failed = f
            .gate
            .guard(Some(issued.key.clone()), metadata("/v1/jobs"), |_| async {
                Err::<Response<Body>, _>("boom")
            })
            .await;
        assert!(matches!(failed, Err(GateError::Handler("boom"))));

        let stats = f.ledger.stats_for_key(&issued.id, 30).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.requests_by_endpoint.values().sum::<u64>(), 4);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_recorded_and_propagated() {
        let f = fixture();
        let issued = f.service.issue("k", None).await.unwrap();
        let gate = f.gate.clone();
        let key = issued.key.clone();

        let joined = tokio::spawn(async move {
            gate.guard(Some(key), metadata("/x"), |_| async {
                if true {
                    panic!("handler exploded");
                }
                respond(StatusCode::OK)
            })
            .await
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        let stats = f.ledger.stats_for_key(&issued.id, 30).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_slow_requests_are_recorded_independently() {
        let f = fixture();
        let issued = f.service.issue("k", None).await.unwrap();

        let slow = |_: ApiKeyId| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            respond(StatusCode::OK)
        };

        let (a, b) = tokio::join!(
            f.gate.guard(Some(issued.key.clone()), metadata("/slow"), slow),
            f.gate.guard(Some(issued.key.clone()), metadata("/slow"), slow),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());

        let records = f
            .usage
            .query(&UsageQuery::new().with_key(issued.id))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id(), records[1].id());
        for record in &records {
            assert_eq!(record.status_code, 200);
            assert!(
                record.response_time_ms >= 50,
                "response time {}ms is below the handler delay",
                record.response_time_ms
            );
        }
    }

    #[tokio::test]
    async fn test_cancelled_handler_is_recorded_as_fault() {
        let f = fixture();
        let issued = f.service.issue("k", None).await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            f.gate.guard(Some(issued.key.clone()), metadata("/slow"), |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                respond(StatusCode::OK)
            }),
        )
        .await;
        assert!(result.is_err());

        // The fault record is written by a spawned task
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stats = f.ledger.stats_for_key(&issued.id, 30).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_ledger_failure_does_not_fail_request() {
        let keys = Arc::new(InMemoryApiKeyRepository::new());
        let service = ApiKeyService::new(keys.clone());
        let issued = service.issue("k", None).await.unwrap();

        let mut usage = MockUsageRepository::new();
        usage
            .expect_record()
            .times(1)
            .returning(|_| Err(DomainError::storage("disk full")));
        let gate = UsageGate::new(
            Arc::new(KeyVerifier::new(keys)),
            Arc::new(UsageLedger::new(Arc::new(usage))),
        );

        let response = gate
            .guard(Some(issued.key), metadata("/x"), |_| async { respond(StatusCode::OK) })
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
