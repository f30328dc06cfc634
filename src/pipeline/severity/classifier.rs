use serde::Deserialize;

use super::features::FeatureRecord;
use super::ClassificationError;

/// Black-box severity model: fixed-schema features in, zero-based label out.
pub trait SeverityClassifier: Send + Sync {
    fn predict(&self, features: &FeatureRecord) -> Result<u32, ClassificationError>;
}

/// Classifier served over HTTP by a model-serving process.
///
/// POSTs the feature record as JSON to `{base_url}/predict` and expects
/// `{"label": <u32>}` back.
pub struct HttpSeverityClassifier {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct PredictResponse {
    label: u32,
}

impl HttpSeverityClassifier {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClassificationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClassificationError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SeverityClassifier for HttpSeverityClassifier {
    fn predict(&self, features: &FeatureRecord) -> Result<u32, ClassificationError> {
        let url = format!("{}/predict", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(features)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClassificationError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ClassificationError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ClassificationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassificationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PredictResponse = response
            .json()
            .map_err(|e| ClassificationError::ResponseParsing(e.to_string()))?;

        Ok(parsed.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let classifier = HttpSeverityClassifier::new("http://localhost:8501/", 5).unwrap();
        assert_eq!(classifier.base_url(), "http://localhost:8501");
    }

    #[test]
    fn unreachable_service_is_connection_error() {
        // Port 9 (discard) is not served locally; the connect fails fast.
        let classifier = HttpSeverityClassifier::new("http://127.0.0.1:9", 2).unwrap();
        let features = FeatureRecord {
            pain_type: "Sharp".into(),
            radiates: "No".into(),
            duration: "Today".into(),
            self_score: 2,
            activity_score: 2,
            mood_score: 2,
            sleep_score: 2,
        };
        let err = classifier.predict(&features).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::Connection(_) | ClassificationError::HttpClient(_)
        ));
    }

    #[test]
    fn predict_response_parses_label() {
        let parsed: PredictResponse = serde_json::from_str(r#"{"label": 3}"#).unwrap();
        assert_eq!(parsed.label, 3);
    }
}
