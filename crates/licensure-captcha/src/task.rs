//! Solve task state and the solving service's wire format.

use serde::{Deserialize, Serialize};

/// Status of a solve task as last reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Still being solved
    Processing,
    /// Solution available
    Ready,
    /// The service gave up on the task
    Error,
}

impl TaskStatus {
    /// Map a wire status. Unrecognized values count as still processing so
    /// new intermediate states from the service don't break polling.
    #[must_use]
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "ready" => Self::Ready,
            _ => Self::Processing,
        }
    }
}

/// One solve request on the service side.
///
/// Created once per solve, advanced only by polling, dropped after the
/// first `Ready` or when the deadline passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaTask {
    /// Service-assigned task identifier
    pub id: String,
    /// Last known status
    pub status: TaskStatus,
    /// Solution token, empty until ready
    pub token: String,
}

impl CaptchaTask {
    /// A freshly created task.
    #[must_use]
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Processing,
            token: String::new(),
        }
    }

    /// Fold one poll response into the task.
    pub fn apply(&mut self, poll: &TaskResultResponse) {
        if poll.error_id != 0 {
            self.status = TaskStatus::Error;
            return;
        }
        self.status = TaskStatus::from_wire(&poll.status);
        if self.status == TaskStatus::Ready {
            self.token = poll
                .solution
                .as_ref()
                .map(|s| s.token.clone())
                .unwrap_or_default();
        }
    }
}

// Solving service API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskRequest<'a> {
    pub client_key: &'a str,
    pub task: TaskSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskSpec<'a> {
    #[serde(rename = "type")]
    pub task_type: &'a str,
    #[serde(rename = "websiteURL")]
    pub website_url: &'a str,
    #[serde(rename = "websiteKey")]
    pub website_key: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskResponse {
    #[serde(default)]
    pub error_id: i64,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_description: String,
    #[serde(default)]
    pub task_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskResultRequest<'a> {
    pub client_key: &'a str,
    pub task_id: &'a str,
}

/// Poll response from `getTaskResult`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResultResponse {
    /// Non-zero when the service reports a failure
    #[serde(default)]
    pub error_id: i64,
    /// Vendor error code
    #[serde(default)]
    pub error_code: String,
    /// Vendor error description
    #[serde(default)]
    pub error_description: String,
    /// Task status text
    #[serde(default)]
    pub status: String,
    /// Solution, present once ready
    #[serde(default)]
    pub solution: Option<Solution>,
}

/// Solution payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Solution {
    /// The proof-of-solve token
    #[serde(default)]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(json: &str) -> TaskResultResponse {
        serde_json::from_str(json).expect("parse poll response")
    }

    #[test]
    fn test_status_from_wire() {
        assert_eq!(TaskStatus::from_wire("ready"), TaskStatus::Ready);
        assert_eq!(TaskStatus::from_wire("READY"), TaskStatus::Ready);
        assert_eq!(TaskStatus::from_wire("processing"), TaskStatus::Processing);
        assert_eq!(TaskStatus::from_wire("idle"), TaskStatus::Processing);
        assert_eq!(TaskStatus::from_wire(""), TaskStatus::Processing);
    }

    #[test]
    fn test_apply_ready_with_token() {
        let mut task = CaptchaTask::created("task-1");
        task.apply(&poll(
            r#"{"errorId":0,"status":"ready","solution":{"token":"0.abc"}}"#,
        ));
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(task.token, "0.abc");
    }

    #[test]
    fn test_apply_ready_without_solution() {
        let mut task = CaptchaTask::created("task-1");
        task.apply(&poll(r#"{"errorId":0,"status":"ready"}"#));
        assert_eq!(task.status, TaskStatus::Ready);
        assert!(task.token.is_empty());
    }

    #[test]
    fn test_apply_vendor_error() {
        let mut task = CaptchaTask::created("task-1");
        task.apply(&poll(
            r#"{"errorId":1,"errorCode":"ERROR_CAPTCHA_UNSOLVABLE","status":"failed"}"#,
        ));
        assert_eq!(task.status, TaskStatus::Error);
    }

    #[test]
    fn test_apply_processing() {
        let mut task = CaptchaTask::created("task-1");
        task.apply(&poll(r#"{"errorId":0,"status":"processing"}"#));
        assert_eq!(task.status, TaskStatus::Processing);
    }

    #[test]
    fn test_create_request_wire_format() {
        let request = CreateTaskRequest {
            client_key: "CAP-1",
            task: TaskSpec {
                task_type: "AntiTurnstileTaskProxyLess",
                website_url: "https://example.gov/search",
                website_key: "0x4AAA",
            },
        };
        let json = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(json["clientKey"], "CAP-1");
        assert_eq!(json["task"]["type"], "AntiTurnstileTaskProxyLess");
        assert_eq!(json["task"]["websiteURL"], "https://example.gov/search");
        assert_eq!(json["task"]["websiteKey"], "0x4AAA");
    }
}
