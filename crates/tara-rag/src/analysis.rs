//! Direct analysis of loaded datasets by a general-purpose model
//!
//! Each call is a single prompt with every dataset serialized in full. No
//! memory is carried between calls, and failures come back inside the
//! outcome instead of as errors.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{GeminiClient, LlmProvider};
use crate::tabular::DatasetRegistry;

/// Why an analysis produced no output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum AnalysisFailure {
    NotConfigured,
    NoData,
    BackendError(String),
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisFailure::NotConfigured => f.write_str("not_configured"),
            AnalysisFailure::NoData => f.write_str("no_data"),
            AnalysisFailure::BackendError(_) => f.write_str("backend_error"),
        }
    }
}

/// Structured analysis result
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    pub output: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AnalysisFailure>,
}

impl AnalysisOutcome {
    fn ok(output: String) -> Self {
        Self {
            success: true,
            output,
            error: String::new(),
            failure: None,
        }
    }

    fn failed(failure: AnalysisFailure, error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error,
            failure: Some(failure),
        }
    }
}

/// Tabular analysis over a separate generation backend
pub struct TabularAnalyzer {
    backend: Option<Arc<dyn LlmProvider>>,
    key_env: String,
}

impl TabularAnalyzer {
    /// Gemini-backed analyzer; unconfigured when no API key is set
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let backend = GeminiClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn LlmProvider>);
        if backend.is_none() {
            tracing::warn!(
                "{} not set, tabular analysis is disabled",
                config.api_key_env
            );
        }
        Ok(Self {
            backend,
            key_env: config.api_key_env.clone(),
        })
    }

    /// Analyzer over an explicit backend
    pub fn with_backend(backend: Arc<dyn LlmProvider>) -> Self {
        Self {
            backend: Some(backend),
            key_env: AnalysisConfig::default().api_key_env,
        }
    }

    /// Analyzer with no backend
    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            key_env: AnalysisConfig::default().api_key_env,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Answer `question` against every loaded dataset
    pub async fn analyze(&self, question: &str, datasets: &DatasetRegistry) -> AnalysisOutcome {
        let Some(backend) = self.backend.as_ref() else {
            return AnalysisOutcome::failed(
                AnalysisFailure::NotConfigured,
                format!(
                    "Gemini API key not configured. Set the {} environment variable.",
                    self.key_env
                ),
            );
        };

        if datasets.is_empty() {
            return AnalysisOutcome::failed(
                AnalysisFailure::NoData,
                "No tabular data has been loaded yet.".to_string(),
            );
        }

        let label = backend.label();
        let result = match PromptBuilder::build_analysis_prompt(question, datasets.iter()) {
            Ok(prompt) => {
                tracing::info!(
                    "Analyzing {} dataset(s) with {} ({} chars)",
                    datasets.len(),
                    backend.model(),
                    prompt.len()
                );
                backend.generate(&prompt).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => AnalysisOutcome::ok(output),
            Err(e) => {
                let message = format!("Error analyzing data with {}: {}", label, e);
                tracing::warn!("{}", message);
                AnalysisOutcome::failed(AnalysisFailure::BackendError(message.clone()), message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ScriptedLlm;
    use crate::tabular::{CellValue, TabularDataset};

    fn registry() -> DatasetRegistry {
        let mut registry = DatasetRegistry::new();
        registry.insert(
            TabularDataset::from_raw(
                "grades.csv",
                vec!["student".to_string(), "score".to_string()],
                vec![
                    vec![CellValue::from_raw("ana"), CellValue::from_raw("91")],
                    vec![CellValue::from_raw("ben"), CellValue::from_raw("78")],
                ],
            )
            .unwrap(),
        );
        registry
    }

    #[tokio::test]
    async fn test_not_configured_checked_first() {
        let analyzer = TabularAnalyzer::unconfigured();
        let outcome = analyzer.analyze("average score", &DatasetRegistry::new()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.failure, Some(AnalysisFailure::NotConfigured));
        assert!(outcome.error.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_no_data() {
        let analyzer = TabularAnalyzer::with_backend(Arc::new(ScriptedLlm::answering("x")));
        let outcome = analyzer.analyze("average score", &DatasetRegistry::new()).await;
        assert_eq!(outcome.failure, Some(AnalysisFailure::NoData));
        assert_eq!(outcome.error, "No tabular data has been loaded yet.");
    }

    #[tokio::test]
    async fn test_success_sends_full_csv() {
        let llm = Arc::new(ScriptedLlm::answering("The average score is 84.5"));
        let analyzer = TabularAnalyzer::with_backend(llm.clone());

        let outcome = analyzer.analyze("average score", &registry()).await;
        assert!(outcome.success);
        assert_eq!(outcome.output, "The average score is 84.5");
        assert!(outcome.error.is_empty());

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("ana,91"));
        assert!(prompt.contains("ben,78"));
    }

    #[tokio::test]
    async fn test_backend_error_is_wrapped() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_failure("quota exceeded");
        let analyzer = TabularAnalyzer::with_backend(llm);

        let outcome = analyzer.analyze("average score", &registry()).await;
        assert!(!outcome.success);
        assert!(outcome.error.starts_with("Error analyzing data with Scripted: "));
        assert!(outcome.error.contains("quota exceeded"));
        assert!(matches!(outcome.failure, Some(AnalysisFailure::BackendError(_))));
    }

    #[test]
    fn test_from_config_without_key() {
        let analyzer = TabularAnalyzer::from_config(&AnalysisConfig::default()).unwrap();
        assert!(!analyzer.is_configured());
    }
}
