use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use model_promoter::config::RegistryConfig;
use model_promoter::models::Stage;
use model_promoter::output::{GithubOutput, StdoutOutput};
use model_promoter::promote::Promoter;
use model_promoter::registry::MlflowClient;

#[derive(Parser)]
#[command(name = "promote")]
#[command(about = "Promote a registered model to its next lifecycle stage")]
struct Cli {
    /// Model to promote: `name/<version>` for an unpromoted version, `name@<stage>` for a staged one
    #[arg(long)]
    identifier: String,

    /// Stage the model should end up in. Only confirms the transition implied by the identifier
    #[arg(long = "stage", value_enum)]
    requested_stage: Stage,

    /// File to append `version=<name>/<version>` to (stdout if unset)
    #[arg(long, env = "GITHUB_OUTPUT")]
    output: Option<PathBuf>,

    /// Registry URL, overrides MLFLOW_TRACKING_URI
    #[arg(long)]
    tracking_uri: Option<String>,
}

/// Initialize tracing to stderr so stdout stays free for the output record.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "model_promoter=info,promote=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = RegistryConfig::from_env()?;
    if let Some(ref uri) = cli.tracking_uri {
        config = config.with_tracking_uri(uri)?;
    }
    tracing::debug!(tracking_uri = %config.tracking_uri, "Using model registry");

    let promoter = Promoter::new(MlflowClient::from_config(&config)?);

    let promotion = match cli.output {
        Some(ref path) => {
            let mut sink = GithubOutput::open(path)?;
            promoter
                .promote(&cli.identifier, cli.requested_stage, &mut sink)
                .await?
        }
        None => {
            let mut sink = StdoutOutput::stdout();
            promoter
                .promote(&cli.identifier, cli.requested_stage, &mut sink)
                .await?
        }
    };

    tracing::info!(
        "Promoted {} version {} from {} to {}",
        promotion.name,
        promotion.version,
        promotion.from,
        promotion.to
    );

    Ok(())
}
