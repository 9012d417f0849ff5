use reqwest::Response;

use crate::error::AiError;

/// Upstream error bodies can be large or echo request content.
const MAX_ERROR_BODY: usize = 512;

/// Turn a non-success provider response into [`AiError::LlmHttp`].
pub async fn response_to_error(response: Response, provider: &str) -> AiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated]", &body[..cut])
    } else {
        body
    };

    AiError::LlmHttp {
        provider: provider.to_string(),
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn error_for(status: u16, body: String) -> AiError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        let response = crate::http_client::build_http_client()
            .get(server.uri())
            .send()
            .await
            .unwrap();
        response_to_error(response, "OpenAI").await
    }

    #[tokio::test]
    async fn test_short_body_is_kept() {
        match error_for(429, "rate limited".to_string()).await {
            AiError::LlmHttp {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "OpenAI");
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_long_body_is_truncated_on_char_boundary() {
        // Two-byte characters put the limit in the middle of one.
        let body = "é".repeat(400);
        match error_for(500, body).await {
            AiError::LlmHttp { message, .. } => {
                assert!(message.ends_with("... [truncated]"));
                let kept = message.trim_end_matches("... [truncated]");
                assert!(kept.len() <= MAX_ERROR_BODY);
                assert!(kept.chars().all(|c| c == 'é'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
