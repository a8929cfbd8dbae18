//! Analysis orchestrator.
//!
//! Validates the request, routes it to the configured providers in priority
//! order and falls back to the offline heuristic in `auto` mode.

use crate::config::Config;
use crate::error::AnalysisError;
use crate::llm::{
    Credentials, ProviderClient, RetryPolicy, Sleeper, TokioSleeper, VisionBackendFactory,
};
use crate::simulate::HeuristicSimulator;
use crate::types::{AnalysisRequest, AnalysisResult, ProviderKind, ProviderPreference};
use std::sync::Arc;

/// Provider label used when a request fails before any provider is chosen.
pub const NO_PROVIDER_LABEL: &str = "None";

/// Entry point for judging one image against one challenge.
pub struct Analyzer {
    /// Clients for providers that have a credential, in priority order.
    clients: Vec<ProviderClient>,
    simulator: HeuristicSimulator,
}

impl Analyzer {
    /// Build from configuration, resolving credentials from the environment once.
    pub fn from_config(config: &Config) -> Self {
        Self::with_credentials(config, &Credentials::from_config(config))
    }

    /// Build from configuration with explicit credentials.
    pub fn with_credentials(config: &Config, credentials: &Credentials) -> Self {
        let policy = RetryPolicy::from_config(&config.retry);
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

        let clients = credentials
            .available()
            .into_iter()
            .filter_map(|kind| {
                credentials.get(kind).map(|api_key| {
                    ProviderClient::new(
                        VisionBackendFactory::create(kind, config, api_key),
                        policy.clone(),
                        sleeper.clone(),
                    )
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!("Analyzer initialized with credentials {credentials:?}");
        Self::new(clients, HeuristicSimulator::new(&config.simulation))
    }

    /// Build from ready-made clients (given in priority order).
    pub fn new(clients: Vec<ProviderClient>, simulator: HeuristicSimulator) -> Self {
        Self { clients, simulator }
    }

    /// Providers this analyzer can call, in priority order.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.clients.iter().map(ProviderClient::kind).collect()
    }

    fn client(&self, kind: ProviderKind) -> Option<&ProviderClient> {
        self.clients.iter().find(|c| c.kind() == kind)
    }

    /// Analyze a request. Never fails: every outcome is a well-formed result.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        if let Err(e) = request.validate() {
            tracing::warn!("Rejected request: {e}");
            return AnalysisResult::failure(e.to_string(), NO_PROVIDER_LABEL);
        }

        match request.provider_preference {
            ProviderPreference::Only(kind) => self.analyze_with(kind, request).await,
            ProviderPreference::Auto => self.analyze_auto(request).await,
        }
    }

    /// Skip every provider and return the offline heuristic's verdict.
    pub fn simulate(&self, request: &AnalysisRequest) -> AnalysisResult {
        if let Err(e) = request.validate() {
            return AnalysisResult::failure(e.to_string(), NO_PROVIDER_LABEL);
        }
        self.simulator.simulate(&request.challenge_description)
    }

    /// Explicit provider: no fallback of any kind.
    async fn analyze_with(&self, kind: ProviderKind, request: &AnalysisRequest) -> AnalysisResult {
        let Some(client) = self.client(kind) else {
            let err = AnalysisError::MissingCredential { provider: kind };
            tracing::warn!("{err}");
            return AnalysisResult::failure(err.to_string(), kind.label());
        };

        match client
            .call(&request.image_url, &request.challenge_description)
            .await
        {
            Ok(result) => result,
            Err(failure) => failure.into_result(),
        }
    }

    /// Priority order over providers with credentials, then the heuristic.
    async fn analyze_auto(&self, request: &AnalysisRequest) -> AnalysisResult {
        let mut failures = Vec::new();

        for client in &self.clients {
            match client
                .call(&request.image_url, &request.challenge_description)
                .await
            {
                Ok(result) => {
                    tracing::info!("Analysis completed by {}", client.kind());
                    return result;
                }
                Err(failure) => {
                    tracing::warn!("{} failed, trying next option: {failure}", client.kind());
                    failures.push(format!("{}: {failure}", failure.provider));
                }
            }
        }

        let warning = if failures.is_empty() {
            "No provider credentials configured; result is simulated".to_string()
        } else {
            format!(
                "All providers failed ({}); result is simulated",
                failures.join("; ")
            )
        };
        tracing::warn!("{warning}");

        self.simulator
            .simulate(&request.challenge_description)
            .with_warning(warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockBackend, RecordingSleeper};
    use crate::types::SIMULATION_LABEL;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client(backend: MockBackend) -> (ProviderClient, Arc<AtomicU32>) {
        let calls = backend.call_count.clone();
        let client = ProviderClient::new(
            Box::new(backend),
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
        );
        (client, calls)
    }

    fn request(preference: ProviderPreference) -> AnalysisRequest {
        AnalysisRequest::new(
            "https://cdn.example.com/caps.jpg",
            "coletar 10 tampinhas de garrafa PET",
            preference,
        )
    }

    const GOOD_REPLY: &str = r#"{"confidence": 0.92, "analysis": "Ten PET caps on a table"}"#;

    #[tokio::test]
    async fn test_invalid_scheme_rejected_before_any_call() {
        let (anthropic, calls) = client(MockBackend::replying(GOOD_REPLY));
        let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());

        let req = AnalysisRequest::new("ftp://x/y.png", "collect caps", ProviderPreference::Auto);
        let result = analyzer.analyze(&req).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Validation error"));
        assert!(result.confidence.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_description_rejected() {
        let (anthropic, calls) = client(MockBackend::replying(GOOD_REPLY));
        let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());

        let req = AnalysisRequest::new("https://x/y.png", "hi", ProviderPreference::Auto);
        let result = analyzer.analyze(&req).await;
        assert!(!result.success);
        assert_eq!(result.provider, NO_PROVIDER_LABEL);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clients_built_in_priority_order_for_available_keys() {
        let config = Config::default();

        let both = Credentials::new(Some("sk-ant"), Some("sk-oai"));
        let analyzer = Analyzer::with_credentials(&config, &both);
        assert_eq!(
            analyzer.available_providers(),
            vec![ProviderKind::Anthropic, ProviderKind::OpenAi]
        );

        let openai_only = Credentials::new(None, Some("sk-oai"));
        let analyzer = Analyzer::with_credentials(&config, &openai_only);
        assert_eq!(analyzer.available_providers(), vec![ProviderKind::OpenAi]);
    }

    #[tokio::test]
    async fn test_padded_url_forwarded_trimmed() {
        let backend = MockBackend::replying(GOOD_REPLY);
        let requests = backend.requests.clone();
        let (anthropic, _) = client(backend);
        let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());

        let req = AnalysisRequest::new(
            "  https://cdn.example.com/caps.jpg  ",
            "coletar 10 tampinhas",
            ProviderPreference::Auto,
        );
        let result = analyzer.analyze(&req).await;
        assert!(result.success);

        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].image_url, "https://cdn.example.com/caps.jpg");
    }

    #[tokio::test]
    async fn test_auto_without_credentials_uses_simulation() {
        let config = Config::default();
        let analyzer = Analyzer::with_credentials(&config, &Credentials::default());
        assert!(analyzer.available_providers().is_empty());

        let result = analyzer.analyze(&request(ProviderPreference::Auto)).await;
        assert!(result.success);
        assert_eq!(result.provider, SIMULATION_LABEL);
        assert!(result.warning.unwrap().contains("No provider credentials"));
    }

    #[tokio::test]
    async fn test_auto_uses_primary_first() {
        let (anthropic, anthropic_calls) = client(MockBackend::replying(GOOD_REPLY));
        let (openai, openai_calls) =
            client(MockBackend::replying(GOOD_REPLY).with_kind(ProviderKind::OpenAi));
        let analyzer = Analyzer::new(vec![anthropic, openai], HeuristicSimulator::default());

        let result = analyzer.analyze(&request(ProviderPreference::Auto)).await;
        assert_eq!(result.provider, ProviderKind::Anthropic.label());
        assert_eq!(result.confidence, Some(0.92));
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 1);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auto_falls_back_to_secondary() {
        let (anthropic, anthropic_calls) = client(MockBackend::status(401, "invalid x-api-key"));
        let (openai, openai_calls) =
            client(MockBackend::replying(GOOD_REPLY).with_kind(ProviderKind::OpenAi));
        let analyzer = Analyzer::new(vec![anthropic, openai], HeuristicSimulator::default());

        let result = analyzer.analyze(&request(ProviderPreference::Auto)).await;
        assert!(result.success);
        assert_eq!(result.provider, ProviderKind::OpenAi.label());
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 1);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auto_falls_back_to_simulation_when_all_fail() {
        let (anthropic, anthropic_calls) = client(MockBackend::status(429, "rate limited"));
        let (openai, openai_calls) =
            client(MockBackend::status(500, "server error").with_kind(ProviderKind::OpenAi));
        let analyzer = Analyzer::new(vec![anthropic, openai], HeuristicSimulator::default());

        let result = analyzer.analyze(&request(ProviderPreference::Auto)).await;
        assert!(result.success);
        assert_eq!(result.provider, SIMULATION_LABEL);
        let warning = result.warning.unwrap();
        assert!(warning.contains("Anthropic"));
        assert!(warning.contains("OpenAI"));
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 3);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_provider_failure_does_not_fall_back() {
        let (anthropic, anthropic_calls) = client(MockBackend::replying(GOOD_REPLY));
        let (openai, openai_calls) =
            client(MockBackend::status(400, "bad request").with_kind(ProviderKind::OpenAi));
        let analyzer = Analyzer::new(vec![anthropic, openai], HeuristicSimulator::default());

        let result = analyzer
            .analyze(&request(ProviderPreference::Only(ProviderKind::OpenAi)))
            .await;
        assert!(!result.success);
        assert_eq!(result.provider, ProviderKind::OpenAi.label());
        assert!(result.error.unwrap().contains("HTTP 400"));
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 0);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_provider_without_credential_fails() {
        let (anthropic, _) = client(MockBackend::replying(GOOD_REPLY));
        let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());

        let result = analyzer
            .analyze(&request(ProviderPreference::Only(ProviderKind::OpenAi)))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_explicit_provider_success() {
        let (openai, _) = client(MockBackend::replying(GOOD_REPLY).with_kind(ProviderKind::OpenAi));
        let analyzer = Analyzer::new(vec![openai], HeuristicSimulator::default());

        let result = analyzer
            .analyze(&request(ProviderPreference::Only(ProviderKind::OpenAi)))
            .await;
        assert!(result.success);
        assert_eq!(result.analysis.as_deref(), Some("Ten PET caps on a table"));
    }

    #[tokio::test]
    async fn test_prompt_carries_description() {
        let backend = MockBackend::replying(GOOD_REPLY);
        let requests = backend.requests.clone();
        let (anthropic, _) = client(backend);
        let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());

        analyzer.analyze(&request(ProviderPreference::Auto)).await;
        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].image_url, "https://cdn.example.com/caps.jpg");
        assert!(seen[0].prompt.contains("coletar 10 tampinhas de garrafa PET"));
    }

    #[test]
    fn test_simulate_skips_providers() {
        let (anthropic, calls) = client(MockBackend::replying(GOOD_REPLY));
        let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());

        let result = analyzer.simulate(&request(ProviderPreference::Auto));
        assert_eq!(result.provider, SIMULATION_LABEL);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_credentials_builds_clients_in_priority_order() {
        let config = Config::default();
        let analyzer =
            Analyzer::with_credentials(&config, &Credentials::new(Some("sk-ant"), Some("sk-oai")));
        assert_eq!(
            analyzer.available_providers(),
            vec![ProviderKind::Anthropic, ProviderKind::OpenAi]
        );

        let openai_only = Analyzer::with_credentials(&config, &Credentials::new(None, Some("sk-oai")));
        assert_eq!(openai_only.available_providers(), vec![ProviderKind::OpenAi]);
    }

    #[tokio::test]
    async fn test_every_path_yields_confidence_in_unit_range() {
        for reply in [
            r#"{"confidence": -3, "analysis": "neg"}"#,
            r#"{"confidence": 7.5, "analysis": "big"}"#,
            "no structure at all",
        ] {
            let (anthropic, _) = client(MockBackend::replying(reply));
            let analyzer = Analyzer::new(vec![anthropic], HeuristicSimulator::default());
            let result = analyzer.analyze(&request(ProviderPreference::Auto)).await;
            let confidence = result.confidence.unwrap();
            assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
