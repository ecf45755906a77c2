//! Unit tests for the invocation loop

#[cfg(test)]
mod tests {
    use crate::runtime::run;
    use chrono::Utc;
    use lambda_runtime_client::{Invocation, MockRuntimeClient, RuntimeError};
    use serde_json::json;
    use tempfile::TempDir;

    fn invocation(request_id: &str, payload: serde_json::Value) -> Invocation {
        Invocation {
            request_id: request_id.to_string(),
            deadline: Utc::now(),
            function_arn: None,
            payload,
        }
    }

    fn root() -> TempDir {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
        std::fs::write(dir.path().join("scene.blend"), b"blend").unwrap_or_else(|e| panic!("{e}"));
        dir
    }

    #[tokio::test]
    async fn test_loop_answers_every_invocation() {
        let dir = root();
        let client = MockRuntimeClient::new();
        client.push_invocation(invocation("ok", json!({"httpMethod": "GET"})));
        client.push_invocation(invocation("bad-path", json!({"queryStringParameters": {"path": ".."}})));
        client.push_invocation(invocation("broken", json!(42)));

        let result = run(&client, dir.path()).await;
        assert!(matches!(result, Err(RuntimeError::Api { status: 410, .. })));

        let responses = client.responses();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].0, "ok");
        assert_eq!(responses[0].1["statusCode"], json!(200));
        assert_eq!(responses[1].0, "bad-path");
        assert_eq!(responses[1].1["statusCode"], json!(400));

        let errors = client.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "broken");
        assert_eq!(errors[0].1.error_type, "Handler.InvalidEvent");
        assert!(client.init_errors().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_response_is_reported_and_loop_continues() {
        let dir = root();
        let client = MockRuntimeClient::new();
        client.reject_responses(413);
        client.push_invocation(invocation("too-large", json!({"httpMethod": "GET"})));
        client.push_invocation(invocation("next", json!({"httpMethod": "GET"})));

        let result = run(&client, dir.path()).await;
        assert!(matches!(result, Err(RuntimeError::Api { status: 410, .. })));

        assert!(client.responses().is_empty());
        let errors = client.errors();
        let ids: Vec<&str> = errors.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["too-large", "next"]);
        for (_, report) in &errors {
            assert_eq!(report.error_type, "Runtime.ResponseTooLarge");
        }
    }
}
