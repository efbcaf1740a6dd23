use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, multipart};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use singtown_model::{Annotation, LogEntry, Task, TaskUpdate};

use crate::{
    errors::TransportError,
    transport::Transport,
    util::is_remote_url,
};

const TASKS_PATH: &str = "/api/v1/task/tasks";

/// [`Transport`] over the service's REST API.
///
/// Every request carries the static bearer token.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    host: String,
    token: String,
}

impl HttpTransport {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), host, token)
    }

    /// Use a preconfigured client (proxies, timeouts, TLS roots).
    pub fn with_client(
        client: reqwest::Client,
        host: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            client,
            host,
            token: token.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn task_url(&self, task_id: &str) -> String {
        format!("{}{}/{}", self.host, TASKS_PATH, task_id)
    }

    fn task_sub_url(&self, task_id: &str, sub: &str) -> String {
        format!("{}/{}", self.task_url(task_id), sub)
    }

    async fn send(&self, url: &str, req: RequestBuilder) -> Result<Response, TransportError> {
        trace!(target: "singtown.transport.http", %url, "request");
        let response = req.bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(target: "singtown.transport.http", %url, status = status.as_u16(), "request rejected");
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let response = self.send(url, self.client.get(url)).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_task(&self, task_id: &str) -> Result<Task, TransportError> {
        self.get_json(&self.task_url(task_id)).await
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<(), TransportError> {
        let url = self.task_url(task_id);
        self.send(&url, self.client.post(&url).json(update)).await?;
        Ok(())
    }

    async fn get_dataset(&self, task_id: &str) -> Result<Vec<Annotation>, TransportError> {
        self.get_json(&self.task_sub_url(task_id, "dataset")).await
    }

    async fn post_log(&self, task_id: &str, entry: &LogEntry) -> Result<(), TransportError> {
        let url = self.task_sub_url(task_id, "logs");
        self.send(&url, self.client.post(&url).json(entry)).await?;
        Ok(())
    }

    async fn upload_result(
        &self,
        task_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), TransportError> {
        let url = self.task_sub_url(task_id, "result");
        let part = multipart::Part::bytes(content).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        self.send(&url, self.client.post(&url).multipart(form)).await?;
        Ok(())
    }

    /// Only absolute `http(s)` URLs are accepted; local paths belong to
    /// [`LocalTransport`](crate::LocalTransport).
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        if !is_remote_url(url) {
            debug!(target: "singtown.transport.http", %url, "refusing non-http url");
            return Err(TransportError::UnsupportedUrl(url.to_string()));
        }
        let response = self.send(url, self.client.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use singtown_model::TaskStatus;

    #[test]
    fn urls_are_built_from_host() {
        let t = HttpTransport::new("https://ai.singtown.com/", "token");
        assert_eq!(t.host(), "https://ai.singtown.com");
        assert_eq!(
            t.task_url("42"),
            "https://ai.singtown.com/api/v1/task/tasks/42"
        );
        assert_eq!(
            t.task_sub_url("42", "logs"),
            "https://ai.singtown.com/api/v1/task/tasks/42/logs"
        );
    }

    #[tokio::test]
    async fn fetch_rejects_local_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.0.jpg");
        std::fs::write(&path, b"fake image content").unwrap();

        let t = HttpTransport::new("http://127.0.0.1:9", "");
        for url in [
            path.to_str().unwrap().to_string(),
            format!("file://{}", path.display()),
        ] {
            let err = t.fetch(&url).await.unwrap_err();
            assert!(matches!(err, TransportError::UnsupportedUrl(u) if u == url));
        }
    }

    #[tokio::test]
    async fn connection_failure_is_not_a_status_error() {
        // Port 9 (discard) is closed on test machines.
        let t = HttpTransport::new("http://127.0.0.1:9", "");
        let err = t.get_task("1").await.unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
        assert!(!err.is_status());
    }

    fn sample_task_json() -> serde_json::Value {
        serde_json::json!({
            "id": "7",
            "status": "PENDING",
            "type": "TRAIN",
            "project": {"labels": ["cat", "dog"], "type": "CLASSIFICATION"},
            "model_name": "mobilenet_v2_0.35_128",
            "epochs": 10,
        })
    }

    #[tokio::test]
    async fn get_task_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/task/tasks/7")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(sample_task_json().to_string())
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        let task = t.get_task("7").await.unwrap();

        m.assert_async().await;
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.project.labels, ["cat", "dog"]);
    }

    #[tokio::test]
    async fn malformed_task_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/task/tasks/7")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        let err = t.get_task("7").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[tokio::test]
    async fn rejected_update_keeps_the_status_code() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/api/v1/task/tasks/7")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(serde_json::json!({"status": "RUNNING"})))
            .with_status(500)
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        let err = t
            .update_task("7", &TaskUpdate::status(TaskStatus::Running))
            .await
            .unwrap_err();

        m.assert_async().await;
        assert!(err.is_status());
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn log_is_posted_as_json() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/api/v1/task/tasks/7/logs")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"content": "epoch 1\n"}),
            ))
            .with_status(200)
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        t.post_log("7", &LogEntry::now("epoch 1\n")).await.unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn dataset_is_read_from_its_route() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/task/tasks/7/dataset")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!([
                    {"url": "/media/cat.0.jpg", "subset": "TRAIN", "classification": "cat"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        let dataset = t.get_dataset("7").await.unwrap();

        m.assert_async().await;
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset[0].classification, "cat");
    }

    #[tokio::test]
    async fn result_is_uploaded_as_multipart_file_field() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/api/v1/task/tasks/7/result")
            .match_header("authorization", "Bearer tok")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="result.zip""#.to_string()),
                Matcher::Regex("zip bytes".to_string()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        t.upload_result("7", "result.zip", b"zip bytes".to_vec())
            .await
            .unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn remote_fetch_downloads_bytes() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/media/cat.0.jpg")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body("fake image content")
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), "tok");
        let bytes = t
            .fetch(&format!("{}/media/cat.0.jpg", server.url()))
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(bytes, b"fake image content");
    }
}
