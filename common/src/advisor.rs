// AI advisor: screens the analyzed stocks through a chat-completions API
//
// The endpoint is OpenAI-compatible (default DeepSeek); the credential comes
// from the environment and is only ever attached as a bearer header.

use crate::config::{AdvisorConfig, SecretString};
use crate::errors::AdvisorError;
use crate::models::StockReport;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument};

const SYSTEM_PROMPT: &str = "\
You are an expert stock analyst with deep knowledge of fundamental and \
technical analysis. Analyze the provided list of stocks and recommend the \
best low market capitalization stocks to buy based on:\n\
1. Technical analysis: use the supplied moving average, MACD, RSI, and \
Bollinger band readings to identify bullish trends; favor stocks near \
support or breaking out of resistance; avoid strong sell signals unless \
there is a clear contrarian opportunity.\n\
2. Market behavior: favor positive net buying pressure and positive news \
sentiment.\n\
For each recommended stock return: \"symbol\", \"signal\", \"buy_reason\". \
Return the results as a JSON array of recommended stocks.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completions client for the recommendation pass
pub struct AdvisorClient {
    client: Client,
    config: AdvisorConfig,
}

impl AdvisorClient {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AdvisorError::RequestFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Ask the model for recommendations over the analyzed stocks
    #[instrument(skip_all, fields(stocks = reports.len()))]
    pub async fn recommend(
        &self,
        reports: &[StockReport],
        api_key: &SecretString,
    ) -> Result<String, AdvisorError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": serde_json::to_string(reports)
                    .map_err(|e| AdvisorError::RequestFailed(e.to_string()))?},
            ],
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisorError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::BadStatus(status.as_u16()));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::RequestFailed(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(AdvisorError::EmptyCompletion)?;

        info!(chars = content.len(), "Advisor recommendations received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server_uri: &str) -> AdvisorConfig {
        AdvisorConfig {
            enabled: true,
            base_url: server_uri.to_string(),
            model: "deepseek-reasoner".to_string(),
            timeout_seconds: 5,
        }
    }

    fn reports() -> Vec<StockReport> {
        use crate::models::{IndicatorSnapshot, Signal};
        vec![StockReport {
            symbol: "NABIL".into(),
            sector: None,
            final_signal: Signal::Buy,
            sentiment_score: 0.2,
            buy_pressure: 100.0,
            sell_pressure: 0.0,
            net_pressure: 100.0,
            technical: IndicatorSnapshot::neutral(),
        }]
    }

    #[tokio::test]
    async fn test_recommend_sends_bearer_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("key-123"))
            .and(body_partial_json(
                serde_json::json!({"model": "deepseek-reasoner"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "[{\"symbol\":\"NABIL\"}]"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AdvisorClient::new(config(&server.uri())).unwrap();
        let content = client
            .recommend(&reports(), &SecretString::new("key-123"))
            .await
            .unwrap();
        assert!(content.contains("NABIL"));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = AdvisorClient::new(config(&server.uri())).unwrap();
        let err = client
            .recommend(&reports(), &SecretString::new("bad-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::BadStatus(401)));
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = AdvisorClient::new(config(&server.uri())).unwrap();
        let err = client
            .recommend(&reports(), &SecretString::new("key"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::EmptyCompletion));
    }

    #[test]
    fn test_default_advisor_points_at_deepseek() {
        let settings = Settings::default();
        assert_eq!(settings.advisor.base_url, "https://api.deepseek.com");
        assert!(!settings.advisor.enabled);
    }
}
