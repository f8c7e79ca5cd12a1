// src/oracle/openai.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Oracle, OracleError, OracleFuture, OracleRequest};
use crate::config::OracleConfig;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI provider (Chat Completions API).
pub struct OpenAiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiOracle {
    pub fn from_config(cfg: &OracleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("ai-intel-dashboard/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.timeout())
            .build()
            .context("building oracle http client")?;
        let api_key = cfg.resolved_api_key();
        if api_key.is_empty() {
            tracing::warn!("oracle enabled without an API key; refreshes will fail");
        }
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

impl Oracle for OpenAiOracle {
    fn complete<'a>(&'a self, req: &'a OracleRequest) -> OracleFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(OracleError::MissingApiKey);
            }

            let body = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: &req.prompt,
                }],
                temperature: self.temperature,
                max_tokens: req.kind.max_tokens(),
            };

            let resp = self
                .http
                .post(CHAT_COMPLETIONS_URL)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| OracleError::Transport(e.to_string()))?;

            let status = resp.status();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(OracleError::Unauthorized(status.as_u16()));
            }
            if !status.is_success() {
                return Err(OracleError::Status(status.as_u16()));
            }

            let parsed: Resp = resp
                .json()
                .await
                .map_err(|e| OracleError::Malformed(e.to_string()))?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            if content.trim().is_empty() {
                return Err(OracleError::Empty);
            }
            Ok(content)
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
