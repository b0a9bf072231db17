use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use fraudscope::report::{render_prediction, render_table};
use fraudscope::{
    write_template, BatchPipeline, ClientConfig, FeatureSchema, Ingestor, InputFormat, PipelineState, RawInput,
    ScoringClient, StructuredParser,
};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Validate and score batches of card transactions
#[derive(Parser, Debug)]
#[command(name = "fraudscope")]
#[command(about = "Validate and score batches of card transactions", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "FRAUDSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the scoring service
    #[arg(long, env = "FRAUDSCOPE_URL")]
    url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "FRAUDSCOPE_TIMEOUT")]
    timeout: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the CSV template (header plus one example row)
    Template {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate a file without scoring it
    Check {
        file: PathBuf,

        /// Input format (csv or json); inferred from the extension by default
        #[arg(long)]
        format: Option<InputFormat>,

        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Score a file and print one line per transaction
    Score {
        file: PathBuf,

        /// Input format (csv or json); inferred from the extension by default
        #[arg(long)]
        format: Option<InputFormat>,

        /// Decision threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the reconciled batch as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a single transaction given as a JSON object
    Predict {
        /// JSON file holding one transaction object
        file: PathBuf,

        /// Decision threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args)?;
    let schema = FeatureSchema::shared();

    match args.command {
        Command::Template { output } => match output {
            Some(path) => {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                write_template(&schema, file)?;
                info!("Template written to {}", path.display());
            }
            None => write_template(&schema, std::io::stdout().lock())?,
        },

        Command::Check { file, format, threshold } => {
            let input = read_input(&file, format)?;
            let vectors = Ingestor::new(schema.clone())
                .with_max_rows(config.max_batch_size)
                .parse(&input)?;
            let request = config.validator(schema).validate(vectors, threshold)?;
            println!(
                "{}: {} valid transactions, threshold {}",
                file.display(),
                request.len(),
                request.threshold()
            );
        }

        Command::Score { file, format, threshold, json } => {
            let input = read_input(&file, format)?;
            let client = ScoringClient::new(&config)?;
            info!("Scoring service: {}", client.endpoint());

            let pipeline = BatchPipeline::from_config(schema, &config, client);
            let state = pipeline.submit(PipelineState::Idle, input, threshold).await?;

            match state {
                PipelineState::Succeeded(batch) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&batch)?);
                    } else {
                        print!("{}", render_table(&batch));
                    }
                }
                PipelineState::Failed(failure) => return Err(anyhow!("{}", failure)),
                other => return Err(anyhow!("submission ended in unexpected state {:?}", other)),
            }
        }

        Command::Predict { file, threshold, json } => {
            let text = std::fs::read_to_string(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let vector = StructuredParser::new(schema.clone()).parse_single_str(&text)?;
            let request = config.validator(schema).validate_single(vector, threshold)?;

            let client = ScoringClient::new(&config)?;
            let result = client.score_one(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_prediction(&result));
            }
        }
    }

    Ok(())
}

/// Configuration precedence: CLI flag / environment, then TOML file, then defaults
fn load_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}

fn read_input(path: &Path, format: Option<InputFormat>) -> anyhow::Result<RawInput> {
    let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let format = format.unwrap_or_else(|| InputFormat::from_path(path));
    Ok(RawInput::from_text(format, text))
}
