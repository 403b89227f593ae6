// src/openai_client.rs
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stop sequences matching the prompt's own section markers, so the model
/// finishes exactly one exchange and does not keep writing dialogue.
pub const STOP_SEQUENCES: [&str; 2] = ["Description:", "Code:"];

pub const MAX_COMPLETION_TOKENS: u32 = 200;

#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub stop: Vec<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub text: String,
}

impl CompletionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
        }
    }

    /// Deterministic request parameters: temperature 0, top_p 1, a single
    /// choice, hard token cap, prompt-marker stop sequences.
    fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            max_tokens: MAX_COMPLETION_TOKENS,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            temperature: 0.0,
            top_p: 1.0,
            n: 1,
        }
    }

    /// Send the composed prompt and return the first completion choice,
    /// trimmed. Transient failures (connection errors, timeouts, 429/5xx)
    /// are retried with exponential backoff; anything else surfaces to the
    /// caller as an error string for the UI.
    pub async fn complete(&self, prompt: &str) -> Result<String, String> {
        let request = self.build_request(prompt);

        tracing::debug!("completion request: {} prompt chars", prompt.len());

        let backoff_config = ExponentialBackoff {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(15),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let operation = || async {
            let response = self
                .client
                .post(format!("{}/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .timeout(Duration::from_secs(60))
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        tracing::warn!("completion service connection error (retrying): {}", e);
                        backoff::Error::transient(format!("Connection error: {}", e))
                    } else {
                        tracing::error!("completion service request error: {}", e);
                        backoff::Error::permanent(format!("Request error: {}", e))
                    }
                })?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| backoff::Error::permanent(format!("Failed to read response: {}", e)))?;

            if status.as_u16() == 429 || status.is_server_error() {
                tracing::warn!("completion service returned {} (retrying)", status);
                return Err(backoff::Error::transient(format!(
                    "API error ({}): {}",
                    status, response_text
                )));
            }

            if !status.is_success() {
                tracing::error!("completion service error ({}): {}", status, response_text);
                return Err(backoff::Error::permanent(format!(
                    "API error ({}): {}",
                    status, response_text
                )));
            }

            serde_json::from_str::<CompletionResponse>(&response_text).map_err(|e| {
                backoff::Error::permanent(format!("Failed to parse response: {}", e))
            })
        };

        let response = retry(backoff_config, operation).await?;

        let first = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "completion response contained no choices".to_string())?;

        Ok(first.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_deterministic_sampling() {
        let client = CompletionClient::new("sk-test".to_string(), "gpt-3.5-turbo-instruct".to_string());
        let request = client.build_request("Our dataframe ...\n\nCode:");

        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.top_p, 1.0);
        assert_eq!(request.n, 1);
        assert_eq!(request.max_tokens, MAX_COMPLETION_TOKENS);
        assert_eq!(request.stop, vec!["Description:", "Code:"]);
    }

    #[test]
    fn test_request_serialization_shape() {
        let client = CompletionClient::new("sk-test".to_string(), "gpt-3.5-turbo-instruct".to_string());
        let request = client.build_request("prompt");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-3.5-turbo-instruct");
        assert_eq!(json["max_tokens"], 200);
        assert_eq!(json["stop"][0], "Description:");
        assert_eq!(json["stop"][1], "Code:");
    }

    #[test]
    fn test_response_takes_first_choice() {
        let body = r#"{"choices": [{"text": "  px.line(df, x='year', y='pop')\n"}, {"text": "second"}]}"#;
        let response: CompletionResponse = serde_json::from_str(body).unwrap();
        let first = response.choices.into_iter().next().unwrap();
        assert_eq!(first.text.trim(), "px.line(df, x='year', y='pop')");
    }
}
