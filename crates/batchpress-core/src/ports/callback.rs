//! CallbackSink port - best-effort completion notification transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{JobId, JobState};
use crate::error::PipelineError;

/// Body POSTed to the externally supplied endpoint when a job turns terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub job_id: JobId,
    pub status: JobState,
    pub output_ref: Option<String>,
}

#[async_trait]
pub trait CallbackSink: Send + Sync {
    /// Deliver one payload. No response contract beyond "it was sent".
    async fn deliver(&self, target: &str, payload: &CallbackPayload) -> Result<(), PipelineError>;
}

/// reqwest-backed sink with a bounded request timeout. Delivery runs on the
/// report path while the unit still holds its concurrency permit, so an
/// endpoint that accepts and never responds must not hang the pipeline.
pub struct HttpCallbackSink {
    client: reqwest::Client,
}

impl HttpCallbackSink {
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Other(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CallbackSink for HttpCallbackSink {
    async fn deliver(&self, target: &str, payload: &CallbackPayload) -> Result<(), PipelineError> {
        self.client
            .post(target)
            .json(payload)
            .send()
            .await
            .map_err(|e| PipelineError::Callback {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn payload_uses_camel_case_keys() {
        let payload = CallbackPayload {
            job_id: JobId::from_ulid(Ulid::new()),
            status: JobState::Completed,
            output_ref: Some("out.csv".to_string()),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("jobId").is_some());
        assert_eq!(value["status"], "completed");
        assert_eq!(value["outputRef"], "out.csv");
    }

    #[tokio::test]
    async fn unresponsive_endpoint_times_out_instead_of_hanging() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and hold them open without ever answering.
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                held.push(socket);
            }
        });

        let sink = HttpCallbackSink::new(Duration::from_millis(200)).unwrap();
        let payload = CallbackPayload {
            job_id: JobId::from_ulid(Ulid::new()),
            status: JobState::Completed,
            output_ref: None,
        };

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            sink.deliver(&format!("http://{addr}/hook"), &payload),
        )
        .await
        .expect("delivery must fail fast, not hang")
        .unwrap_err();
        assert!(matches!(err, PipelineError::Callback { .. }));
    }
}
