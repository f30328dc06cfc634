//! Local Ollama backend for the care-tip elaboration.
//!
//! `OllamaClient` speaks the non-streaming `/api/generate` endpoint;
//! `OllamaCareTipGenerator` pins a model and temperature so the composer can
//! use it through `LlmGenerate`.

use serde::{Deserialize, Serialize};

use super::composer::LlmGenerate;
use super::RagError;
use crate::config::PipelineConfig;

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, RagError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RagError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> RagError {
        if e.is_connect() {
            RagError::OllamaConnection(self.base_url.clone())
        } else if e.is_timeout() {
            RagError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            RagError::HttpClient(e.to_string())
        }
    }

    pub fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions { temperature },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| RagError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

/// `LlmGenerate` backed by a fixed Ollama model.
pub struct OllamaCareTipGenerator {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaCareTipGenerator {
    pub fn new(client: OllamaClient, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, RagError> {
        let client = OllamaClient::new(&config.ollama_url, config.generation_timeout_secs)?;
        Ok(Self::new(client, &config.ollama_model, config.temperature))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl LlmGenerate for OllamaCareTipGenerator {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError> {
        tracing::debug!(model = %self.model, "Requesting care tip elaboration");
        self.client
            .generate(&self.model, prompt, system, self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_temperature_option() {
        let body = GenerateRequest {
            model: "medgemma:latest",
            prompt: "I have pain severity 3/5.",
            system: "You are...",
            stream: false,
            options: GenerateOptions { temperature: 0.3 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn generator_uses_configured_model() {
        let config = PipelineConfig {
            ollama_url: "http://localhost:11434/".into(),
            ollama_model: "medgemma:4b".into(),
            ..Default::default()
        };
        let generator = OllamaCareTipGenerator::from_config(&config).unwrap();
        assert_eq!(generator.model(), "medgemma:4b");
        assert_eq!(generator.client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn unreachable_ollama_is_an_error() {
        let client = OllamaClient::new("http://127.0.0.1:9", 2).unwrap();
        let generator = OllamaCareTipGenerator::new(client, "medgemma:latest", 0.3);
        assert!(generator.generate("system", "prompt").is_err());
    }
}
