use crate::config::LlmConfig;
use crate::core_types::Message;
use crate::errors::ChatError;
use crate::llm::{CompletionOptions, LLM};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

/// OpenAI-compatible chat-completions client (Groq by default).
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: Option<String>,
    api_key_env: String,
    api_base: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_key_env: crate::config::DEFAULT_API_KEY_ENV.to_string(),
            api_base: crate::config::DEFAULT_API_BASE.to_string(),
            model,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Name of the env var reported when the key is missing.
    pub fn with_api_key_env(mut self, api_key_env: String) -> Self {
        self.api_key_env = api_key_env;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, messages: &[Message], options: &CompletionOptions) -> Value {
        json!({
            "model": self.model,
            "messages": self.format_messages(messages),
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        })
    }

    fn format_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content
                })
            })
            .collect()
    }

    fn parse_response(&self, response: &Value) -> Result<String, ChatError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| ChatError::malformed("No choices in response"))?;

        match choice["message"]["content"].as_str() {
            Some(content) if !content.is_empty() => Ok(content.to_string()),
            _ => Err(ChatError::malformed("First choice has no message content")),
        }
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, ChatError> {
        self.ensure_configured()?;
        let api_key = self.api_key.as_deref().unwrap_or_default();

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(messages, options);

        log::debug!(
            "Completion request to {} (model={}, messages={}, temperature={}, max_tokens={})",
            url,
            self.model,
            messages.len(),
            options.temperature,
            options.max_tokens
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let err = ChatError::from(e);
                log::error!("Completion request to {} failed: {}", url, err);
                err
            })?;

        let status = response.status();
        let response_text = response.text().await?;

        log::debug!("Completion response ({}): {}", status, response_text);

        if !status.is_success() {
            log::error!("Upstream returned {}: {}", status, response_text);
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| ChatError::malformed(format!("Invalid JSON response: {}", e)))?;

        self.parse_response(&response_json).inspect_err(|e| {
            log::error!("Unusable completion response: {:?}", e);
        })
    }

    fn ensure_configured(&self) -> Result<(), ChatError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ChatError::configuration(format!(
                "{} environment variable is not set.",
                self.api_key_env
            ))),
        }
    }
}

/// Create an OpenAI-compatible client from configuration
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LLM>, ChatError> {
    if config.api_base.trim().is_empty() {
        return Err(ChatError::configuration("llm.api_base must not be empty"));
    }

    let client = OpenAIClient::new(config.api_key.clone(), config.model.clone())
        .with_api_base(config.api_base.clone())
        .with_api_key_env(config.api_key_env.clone());

    log::info!(
        "Completion gateway configured: base={}, model={}",
        client.api_base,
        client.model
    );
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Message;
    use crate::test_utils::{MockCompletionServer, MockReply};
    use std::time::Duration;

    fn client_for(server: &MockCompletionServer) -> OpenAIClient {
        OpenAIClient::new(Some("gsk-test".to_string()), "llama-3.1-8b-instant".to_string())
            .with_api_base(format!("{}/openai/v1/", server.address()))
    }

    fn transcript() -> Vec<Message> {
        vec![
            Message::system("You are a farming assistant."),
            Message::user("Hello"),
        ]
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAIClient::new(Some("k".to_string()), "llama-3.1-8b-instant".to_string());
        let options = CompletionOptions::default().with_temperature(0.3).with_max_tokens(200);
        let body = client.build_request_body(&transcript(), &options);

        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["max_tokens"], 200);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_parse_response_rejects_missing_or_empty_content() {
        let client = OpenAIClient::new(Some("k".to_string()), "m".to_string());

        let ok = json!({"choices": [{"message": {"role": "assistant", "content": "Plant in June."}}]});
        assert_eq!(client.parse_response(&ok).unwrap(), "Plant in June.");

        for bad in [
            json!({}),
            json!({"choices": []}),
            json!({"choices": [{"message": {}}]}),
            json!({"choices": [{"message": {"content": ""}}]}),
            json!({"choices": [{"message": {"content": null}}]}),
        ] {
            assert!(matches!(
                client.parse_response(&bad),
                Err(ChatError::MalformedResponse(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = OpenAIClient::new(None, "m".to_string())
            .with_api_base("http://127.0.0.1:1".to_string());
        let err = client
            .generate(&transcript(), &CompletionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::Configuration("GROQ_API_KEY environment variable is not set.".to_string())
        );
    }

    #[tokio::test]
    async fn test_generate_success_sends_expected_request() {
        let server = MockCompletionServer::start(vec![MockReply::text("Try drip irrigation.")]).await;
        let client = client_for(&server);

        let reply = client
            .generate(&transcript(), &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "Try drip irrigation.");

        let requests = server.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer gsk-test"));
        assert_eq!(requests[0].body["model"], "llama-3.1-8b-instant");
        assert_eq!(requests[0].body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(requests[0].body["max_tokens"], 500);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error_with_body() {
        let server = MockCompletionServer::start(vec![MockReply::Status(
            401,
            r#"{"error":{"message":"Invalid API Key"}}"#.to_string(),
        )])
        .await;
        let client = client_for(&server);

        let err = client
            .generate(&transcript(), &CompletionOptions::default())
            .await
            .unwrap_err();
        match err {
            ChatError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API Key"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_slow_upstream_is_timeout_error() {
        let server = MockCompletionServer::start(vec![MockReply::Delayed(
            Duration::from_millis(500),
            "too late".to_string(),
        )])
        .await;
        let client = client_for(&server);
        let options = CompletionOptions::default().with_timeout(Duration::from_millis(50));

        let err = client.generate(&transcript(), &options).await.unwrap_err();
        assert_eq!(err, ChatError::Timeout);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_success_without_content_is_malformed() {
        let server = MockCompletionServer::start(vec![
            MockReply::Raw(json!({"choices": [{"message": {"role": "assistant", "content": ""}}]})),
            MockReply::RawText("not json".to_string()),
        ])
        .await;
        let client = client_for(&server);

        for _ in 0..2 {
            let err = client
                .generate(&transcript(), &CompletionOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ChatError::MalformedResponse(_)));
        }

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_internal_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenAIClient::new(Some("k".to_string()), "m".to_string())
            .with_api_base(format!("http://{}", addr));
        let err = client
            .generate(&transcript(), &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Internal(_)));
    }

    #[test]
    fn test_create_client_from_config() {
        let config = LlmConfig {
            api_key: Some("gsk".to_string()),
            ..Default::default()
        };
        let client = create_client(&config).unwrap();
        assert!(client.ensure_configured().is_ok());

        let config = LlmConfig::default();
        let client = create_client(&config).unwrap();
        assert!(matches!(
            client.ensure_configured(),
            Err(ChatError::Configuration(_))
        ));
    }
}
