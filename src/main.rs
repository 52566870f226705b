use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod conversation;
mod error;
mod features;
mod generation;
mod models;
mod pipeline;
mod prompt;
mod report;
mod risk;
mod roster;

use config::GenerationConfig;
use generation::OpenAiClient;
use models::{MetricsPayload, PlanRequest, StudentMetrics, TurnPayload};
use pipeline::Advisor;
use risk::LogisticRiskModel;

#[derive(Parser)]
#[command(name = "study-plan-advisor")]
#[command(about = "Academic risk scoring and personalized study plans", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MetricsArgs {
    /// Fraction of classes attended (0-1)
    #[arg(long, default_value_t = 0.8)]
    attendance: f64,
    /// Average quiz score (0-10)
    #[arg(long, default_value_t = 7.0)]
    quiz_score: f64,
    /// Average assignment score (0-10)
    #[arg(long, default_value_t = 8.0)]
    assignment_score: f64,
    /// Daily study hours
    #[arg(long, default_value_t = 2.0)]
    study_hours: f64,
    /// Last midterm score (0-100)
    #[arg(long, default_value_t = 65.0)]
    midterm_score: f64,
}

impl MetricsArgs {
    fn metrics(&self) -> StudentMetrics {
        StudentMetrics {
            attendance: self.attendance,
            quiz_score: self.quiz_score,
            assignment_score: self.assignment_score,
            study_hours: self.study_hours,
            midterm_score: self.midterm_score,
        }
    }
}

#[derive(Args)]
struct BackendArgs {
    #[arg(long, env = "AI_INTEGRATIONS_OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "AI_INTEGRATIONS_OPENAI_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, env = "ADVISOR_MODEL", default_value = config::DEFAULT_MODEL)]
    model: String,
    #[arg(long, env = "ADVISOR_TIMEOUT_SECS", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl BackendArgs {
    fn config(&self) -> GenerationConfig {
        GenerationConfig::default()
            .with_api_key(self.api_key.clone())
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score a student without generating a plan
    Score {
        #[command(flatten)]
        metrics: MetricsArgs,
    },
    /// Score a student and generate a personalized study plan
    #[command(group(
        ArgGroup::new("output")
            .args(["json", "out"])
            .multiple(false)
    ))]
    Advise {
        #[command(flatten)]
        metrics: MetricsArgs,
        #[command(flatten)]
        backend: BackendArgs,
        /// JSON file holding earlier turns: [{"role": "...", "content": "..."}]
        #[arg(long)]
        conversation: Option<PathBuf>,
        /// User message appended after the conversation (repeatable)
        #[arg(long = "message")]
        messages: Vec<String>,
        /// Name shown in the report header
        #[arg(long)]
        student: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Write a markdown report to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score every student in a roster CSV
    Roster {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "study_plan_advisor=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn load_conversation(
    path: Option<&PathBuf>,
    messages: Vec<String>,
) -> anyhow::Result<Vec<TurnPayload>> {
    let mut turns: Vec<TurnPayload> = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON list of turns", path.display()))?
        }
        None => Vec::new(),
    };
    turns.extend(messages.into_iter().map(TurnPayload::user));
    Ok(turns)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Score { metrics } => {
            let metrics = metrics.metrics();
            let assessment = risk::assess(&LogisticRiskModel::default(), &metrics)
                .context("failed to score student")?;

            println!(
                "Risk score {:.2} ({})",
                risk::round_score(assessment.score),
                assessment.tier
            );
            println!(
                "Weakest areas: {}",
                prompt::describe_weak_areas(&prompt::weak_areas(&metrics))
            );
        }
        Commands::Advise {
            metrics,
            backend,
            conversation,
            messages,
            student,
            json,
            out,
        } => {
            let config = backend.config();
            if config.api_key.is_none() {
                tracing::warn!("no API key configured; the plan will fall back to a placeholder");
            }

            let client = OpenAiClient::new(&config).context("failed to build generation client")?;
            let advisor = Advisor::new(LogisticRiskModel::default(), client, &config);
            let request = PlanRequest {
                student_data: MetricsPayload::from(metrics.metrics()),
                messages: load_conversation(conversation.as_ref(), messages)?,
            };

            let advice = match advisor.advise(&request).await {
                Ok(advice) => advice,
                Err(err) if err.is_client_error() => bail!("request rejected: {err}"),
                Err(err) => return Err(anyhow::Error::new(err).context("risk scoring failed")),
            };

            if let Some(out) = out {
                let report = report::build_report(student.as_deref(), &advice, chrono::Utc::now());
                std::fs::write(&out, report)?;
                println!("Report written to {}.", out.display());
            } else if json {
                println!("{}", serde_json::to_string_pretty(&advice.result)?);
            } else {
                println!(
                    "Risk score {:.2} ({})",
                    advice.result.risk_score, advice.assessment.tier
                );
                println!();
                println!("{}", advice.result.detailed_plan);
            }
        }
        Commands::Roster { csv, limit } => {
            let scores = roster::score_csv(&LogisticRiskModel::default(), &csv)?;

            if scores.is_empty() {
                println!("No students found in {}.", csv.display());
                return Ok(());
            }

            println!("Top students by risk score:");
            for score in scores.iter().take(limit) {
                println!(
                    "- {} score {:.2} ({})",
                    score.student,
                    risk::round_score(score.assessment.score),
                    score.assessment.tier
                );
            }
        }
    }

    Ok(())
}
