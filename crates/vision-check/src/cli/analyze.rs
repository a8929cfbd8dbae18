//! The `vision-check analyze` command.

use clap::{Args, ValueEnum};
use vision_check_core::{
    write_result, AnalysisRequest, AnalysisResult, Analyzer, Config, ProviderKind,
    ProviderPreference,
};

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Publicly reachable http(s) URL of the image to check
    #[arg(long)]
    pub image_url: String,

    /// What the image is supposed to show
    #[arg(long, alias = "challenge-description")]
    pub challenge: String,

    /// Provider to use; `auto` tries every configured provider then falls back offline
    #[arg(short, long, value_enum, default_value = "auto")]
    pub provider: Provider,

    /// Skip providers and return the offline heuristic estimate
    #[arg(long)]
    pub simulate: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Provider choice on the command line.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum Provider {
    /// Anthropic, then OpenAI, then the heuristic simulator
    #[default]
    Auto,
    /// Claude only, no fallback
    #[value(alias = "claude")]
    Anthropic,
    /// GPT-4 Vision only, no fallback
    #[value(alias = "gpt")]
    Openai,
}

impl From<Provider> for ProviderPreference {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Auto => ProviderPreference::Auto,
            Provider::Anthropic => ProviderPreference::Only(ProviderKind::Anthropic),
            Provider::Openai => ProviderPreference::Only(ProviderKind::OpenAi),
        }
    }
}

/// Execute the analyze command.
///
/// Analysis failures are part of the JSON result, so this only errors when
/// stdout itself cannot be written.
pub async fn execute(args: AnalyzeArgs, config: &Config, verbose: bool) -> anyhow::Result<()> {
    let pretty = args.pretty || verbose || config.output.pretty;
    let result = run(&args, config).await;

    if result.success {
        tracing::info!(
            provider = %result.provider,
            confidence = result.confidence.unwrap_or_default(),
            "Analysis complete"
        );
    } else {
        tracing::warn!(
            provider = %result.provider,
            error = result.error.as_deref().unwrap_or_default(),
            "Analysis failed"
        );
    }

    if let Err(e) = write_result(std::io::stdout().lock(), &result, pretty) {
        tracing::error!("Failed to write result: {e}");
    }
    Ok(())
}

async fn run(args: &AnalyzeArgs, config: &Config) -> AnalysisResult {
    let request = AnalysisRequest::new(
        args.image_url.clone(),
        args.challenge.clone(),
        args.provider.into(),
    );
    let analyzer = Analyzer::from_config(config);

    if args.simulate {
        tracing::debug!("Simulation requested, skipping providers");
        return analyzer.simulate(&request);
    }

    tracing::debug!(
        available = ?analyzer.available_providers(),
        preference = ?request.provider_preference,
        "Starting analysis"
    );
    analyzer.analyze(&request).await
}
