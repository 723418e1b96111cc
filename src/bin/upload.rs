use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use giskard_client::codec::load_decompress;
use giskard_client::config::ClientConfig;
use giskard_client::dataframe::from_csv_infer;
use giskard_client::telemetry::init_logging;
use giskard_client::{Client, ColumnType, ColumnTypes, Model, ModelType, PredictionFunction};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "giskard-upload", about = "Upload datasets and models to a Giskard server")]
struct Cli {
    /// Path to config file (url, token, project, timeout_secs)
    #[arg(long)]
    config: Option<String>,

    /// Server url, overrides the config
    #[arg(long)]
    url: Option<String>,

    /// API token, overrides the config
    #[arg(long, env = "GISKARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Project key, overrides the config
    #[arg(long)]
    project: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a CSV file as a dataset
    Dataset {
        /// CSV file with a header row
        file: PathBuf,
        #[arg(long)]
        name: String,
        /// Column type declaration, e.g. `--column age=numeric`
        #[arg(long = "column", value_parser = parse_column_type, required = true)]
        columns: Vec<(String, ColumnType)>,
        #[arg(long)]
        target: Option<String>,
    },
    /// Upload a serialized prediction function as a model
    Model {
        /// File holding a compressed serialized prediction function
        file: PathBuf,
        /// CSV file the model is validated against before upload
        #[arg(long)]
        validate: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long = "feature", required = true)]
        features: Vec<String>,
        /// Classification label, in probability column order. Omit for regression.
        #[arg(long = "label")]
        labels: Vec<String>,
    },
}

fn parse_column_type(s: &str) -> Result<(String, ColumnType), String> {
    let (name, column_type) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <column>=<type>, got '{}'", s))?;
    Ok((name.to_string(), column_type.parse()?))
}

fn read_dataframe(path: &Path) -> Result<arrow::record_batch::RecordBatch> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    from_csv_infer(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let now = Instant::now();
    init_logging().map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.url = url;
    }
    if let Some(token) = cli.token {
        config.token = token;
    }
    if let Some(project) = cli.project {
        config.project = Some(project);
    }
    config.validate()?;

    let project_key = config
        .project
        .clone()
        .context("Project key is required (--project or `project` in config)")?;

    let client = Client::from_config(&config)?;
    let project = client.project(project_key);

    tracing::info!("Uploading to {} (project '{}')", config.url, project.key());

    let id = match cli.command {
        Command::Dataset {
            file,
            name,
            columns,
            target,
        } => {
            let df = read_dataframe(&file)?;
            let column_types: ColumnTypes = columns.into_iter().collect();
            project
                .upload_df(&df, &column_types, target.as_deref(), &name)
                .await?
        }
        Command::Model {
            file,
            validate,
            name,
            features,
            labels,
        } => {
            let blob =
                std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let prediction_function: PredictionFunction = load_decompress(&blob)
                .with_context(|| format!("Failed to load model from {}", file.display()))?;
            let model_type = if labels.is_empty() {
                ModelType::Regression
            } else {
                ModelType::Classification { labels }
            };
            let model = Model::new(prediction_function, model_type, features)?;
            let validate_df = read_dataframe(&validate)?;
            project.upload_model(&model, &name, &validate_df).await?
        }
    };

    tracing::info!("Upload finished in {}ms", now.elapsed().as_millis());
    println!("{}", id);

    Ok(())
}
