use async_trait::async_trait;

use singtown_core::Client;

use crate::{
    error::ExecResult,
    proc::{ProcConfig, ProcRunner},
};

/// Subprocess execution with output routed into the task log.
#[async_trait]
pub trait SubprocessExt {
    /// Run `command` through the shell and wait for it to exit.
    async fn run_subprocess(&self, command: &str, ignore_stdout: bool) -> ExecResult<()>;

    /// Run a fully configured process.
    async fn run_process(&self, cfg: ProcConfig) -> ExecResult<()>;
}

#[async_trait]
impl SubprocessExt for Client {
    async fn run_subprocess(&self, command: &str, ignore_stdout: bool) -> ExecResult<()> {
        self.run_process(ProcConfig::shell(command).ignore_stdout(ignore_stdout))
            .await
    }

    async fn run_process(&self, cfg: ProcConfig) -> ExecResult<()> {
        ProcRunner::new(cfg).run(self.log_buffer()).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use singtown_core::{
        ClientConfig,
        model::{Task, TaskStatus},
        transport::LocalTransport,
    };

    fn task() -> Task {
        serde_json::from_value(serde_json::json!({
            "project": {"labels": ["cat", "dog"], "type": "CLASSIFICATION"},
            "epochs": 1,
        }))
        .unwrap()
    }

    async fn client() -> (Arc<LocalTransport>, Client) {
        let transport = Arc::new(LocalTransport::new(task()));
        let client = Client::with_transport(ClientConfig::default(), transport.clone())
            .await
            .unwrap();
        (transport, client)
    }

    #[tokio::test]
    async fn subprocess_output_is_uploaded_with_the_session() {
        let (transport, client) = client().await;

        client
            .run(|c| async move {
                c.run_subprocess("echo Hello, World!", false).await?;
                Ok::<_, anyhow::Error>(())
            })
            .await
            .unwrap();

        let logs = transport.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].content, "Hello, World!\n");
        assert_eq!(transport.task().unwrap().status, TaskStatus::Success);
    }

    #[tokio::test]
    async fn ignored_output_uploads_no_logs() {
        let (transport, client) = client().await;

        client
            .run(|c| async move {
                c.run_subprocess("echo Hello, World!", true).await?;
                Ok::<_, anyhow::Error>(())
            })
            .await
            .unwrap();

        assert!(transport.logs().is_empty());
    }

    #[tokio::test]
    async fn failing_subprocess_fails_the_task() {
        let (transport, client) = client().await;

        let err = client
            .run(|c| async move {
                c.run_subprocess("invalid_command", false).await?;
                Ok::<_, anyhow::Error>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::ExecError>(),
            Some(crate::ExecError::NonZeroExit { .. })
        ));
        assert_eq!(transport.task().unwrap().status, TaskStatus::Failed);

        let uploaded: String = transport.logs().into_iter().map(|e| e.content).collect();
        assert!(uploaded.contains("invalid_command"));
        assert!(uploaded.ends_with("Exception: non-zero exit code: 127\n"));
    }
}
