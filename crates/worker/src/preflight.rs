//! 迁移前的目标可达性检查
//!
//! 结果只作为提示：不可达的目标只产生警告，批次照常执行。

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use migrator_core::{MirrorTransport, TransferOperation, TransferRequest};
use migrator_domain::{BatchSettings, MigrationTask, RemoteEndpoint, TransferSettings};
use tracing::{debug, warn, Instrument, Span};

use crate::credentials::CredentialResolver;

pub struct PreflightValidator {
    transport: Arc<dyn MirrorTransport>,
    resolver: CredentialResolver,
    probe_timeout: Duration,
    /// 同时进行的探测数上限
    max_concurrent: usize,
    span: Span,
}

impl PreflightValidator {
    pub fn new(transport: Arc<dyn MirrorTransport>, settings: &TransferSettings) -> Self {
        Self {
            transport,
            resolver: CredentialResolver::new(settings.host_key_policy),
            probe_timeout: settings.probe_timeout.min(TransferSettings::MAX_PROBE_TIMEOUT),
            max_concurrent: BatchSettings::default().max_concurrent,
            span: tracing::info_span!("preflight"),
        }
    }

    /// 与批次并发上限保持一致，避免一次启动过多git进程
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// 列举远端引用，任何失败（网络、认证、超时）都返回 `false`
    pub async fn probe<E: RemoteEndpoint + ?Sized>(&self, endpoint: &E) -> bool {
        let prepared = match self.resolver.prepare(endpoint.url(), endpoint.auth()) {
            Ok(prepared) => prepared,
            Err(e) => {
                debug!("探测前解析凭据失败: url={}, error={}", endpoint.url(), e);
                return false;
            }
        };

        let request = TransferRequest::new(prepared.url.clone(), self.probe_timeout)
            .with_environment(prepared.environment.clone());
        let call = self.transport.run(TransferOperation::RemoteProbe, &request);

        match tokio::time::timeout(self.probe_timeout, call).await {
            Ok(Ok(output)) if output.is_success() => true,
            Ok(Ok(output)) => {
                debug!(
                    "探测失败: url={}, diagnostics={}",
                    endpoint.url(),
                    prepared.redact(&output.diagnostics())
                );
                false
            }
            Ok(Err(e)) => {
                debug!("探测出错: url={}, error={}", endpoint.url(), prepared.redact(&e.to_string()));
                false
            }
            Err(_) => {
                debug!(
                    "探测超时: url={}, timeout={}s",
                    endpoint.url(),
                    self.probe_timeout.as_secs()
                );
                false
            }
        }
    }

    /// 以有界并发探测所有目标，按任务顺序返回不可达的目标URL
    pub async fn check_destinations(&self, tasks: &[Arc<MigrationTask>]) -> Vec<String> {
        let span = self.span.clone();
        async {
            let results: Vec<_> = stream::iter(tasks)
                .map(|task| async move { (task, self.probe(&task.destination).await) })
                .buffered(self.max_concurrent)
                .collect()
                .await;

            results
                .into_iter()
                .filter(|(_, reachable)| !reachable)
                .map(|(task, _)| {
                    warn!(
                        "目标仓库不可达: task={}, destination={}",
                        task.name, task.destination.url
                    );
                    task.destination.url.clone()
                })
                .collect()
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_domain::{AuthCredential, DestinationEndpoint};
    use migrator_testing_utils::{FakeBehavior, FakeTransport, MigrationTaskBuilder};

    fn validator(transport: &FakeTransport) -> PreflightValidator {
        PreflightValidator::new(Arc::new(transport.clone()), &TransferSettings::default())
    }

    #[tokio::test]
    async fn test_probe_reachable() {
        let transport = FakeTransport::new();
        let endpoint = DestinationEndpoint::new("https://dest.example.com/org/a.git");
        assert!(validator(&transport).probe(&endpoint).await);

        let calls = transport.calls_for(TransferOperation::RemoteProbe);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].local_path.is_none());
    }

    #[tokio::test]
    async fn test_probe_failure_is_false() {
        let transport = FakeTransport::new().on(
            TransferOperation::RemoteProbe,
            "dest.example.com",
            vec![FakeBehavior::fail("fatal: could not read from remote")],
        );
        let endpoint = DestinationEndpoint::new("https://dest.example.com/org/a.git");
        assert!(!validator(&transport).probe(&endpoint).await);
    }

    #[tokio::test]
    async fn test_probe_port_error_is_false() {
        let transport = FakeTransport::new().on(
            TransferOperation::RemoteProbe,
            "dest",
            vec![FakeBehavior::PortError("spawn failed".to_string())],
        );
        let endpoint = DestinationEndpoint::new("https://dest.example.com/org/a.git");
        assert!(!validator(&transport).probe(&endpoint).await);
    }

    #[tokio::test]
    async fn test_probe_timeout_is_false() {
        let transport =
            FakeTransport::new().on(TransferOperation::RemoteProbe, "dest", vec![FakeBehavior::Hang]);
        let settings = TransferSettings {
            probe_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let validator = PreflightValidator::new(Arc::new(transport), &settings);
        let endpoint = DestinationEndpoint::new("https://dest.example.com/org/a.git");
        assert!(!validator.probe(&endpoint).await);
    }

    #[tokio::test]
    async fn test_probe_uses_endpoint_credentials() {
        let transport = FakeTransport::new();
        let endpoint = DestinationEndpoint::new("https://dest.example.com/org/a.git")
            .with_auth(AuthCredential::token("abc123"));
        assert!(validator(&transport).probe(&endpoint).await);
        assert_eq!(
            transport.calls()[0].url,
            "https://abc123@dest.example.com/org/a.git"
        );
    }

    #[tokio::test]
    async fn test_probe_with_bad_credentials_is_false() {
        let transport = FakeTransport::new();
        let endpoint = DestinationEndpoint::new("https://dest.example.com/org/a.git")
            .with_auth(AuthCredential::token(""));
        assert!(!validator(&transport).probe(&endpoint).await);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_probe_timeout_is_capped() {
        let settings = TransferSettings {
            probe_timeout: Duration::from_secs(60),
            ..Default::default()
        };
        let validator = PreflightValidator::new(Arc::new(FakeTransport::new()), &settings);
        assert_eq!(validator.probe_timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_check_destinations_reports_unreachable() {
        let transport = FakeTransport::new().on(
            TransferOperation::RemoteProbe,
            "/org/beta.git",
            vec![FakeBehavior::fail("fatal: repository not found")],
        );
        let tasks = vec![
            MigrationTaskBuilder::new("alpha").build_arc(),
            MigrationTaskBuilder::new("beta").build_arc(),
        ];

        let unreachable = validator(&transport).check_destinations(&tasks).await;
        assert_eq!(unreachable, vec!["https://dest.example.com/org/beta.git".to_string()]);
        assert_eq!(transport.calls_for(TransferOperation::RemoteProbe).len(), 2);
    }

    #[tokio::test]
    async fn test_check_destinations_bounds_concurrent_probes() {
        let transport = FakeTransport::new().with_delay(Duration::from_millis(20));
        let validator = validator(&transport).with_max_concurrent(4);
        let tasks = migrator_testing_utils::numbered_tasks(40);

        let unreachable = validator.check_destinations(&tasks).await;

        assert!(unreachable.is_empty());
        assert_eq!(transport.calls_for(TransferOperation::RemoteProbe).len(), 40);
        assert!(transport.tracker().max_observed() <= 4);
        assert!(transport.tracker().max_observed() >= 2);
        assert_eq!(transport.tracker().current(), 0);
    }
}
