mod config;
mod format;

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{ParameterSet, Projection, run_projection};

pub use config::{
    ConfigError, ConfigOverrides, DEFAULT_CONFIG_FILE, default_config_yaml, resolve_parameters,
    write_default_config,
};
pub use format::{to_currency, to_percent};

#[derive(Parser, Debug)]
#[command(
    name = "retire-calc",
    version,
    about = "Models the value of a retirement portfolio through career and retirement"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(
        long,
        short = 'c',
        global = true,
        alias = "cf",
        help = "Config file to read settings from; defaults to config.yaml when present"
    )]
    config_file: Option<PathBuf>,
    #[arg(
        long,
        alias = "wct",
        help = "Writes a sample config file for the retirement calculator to the specified file"
    )]
    write_default_config_to: Option<PathBuf>,
    #[command(flatten)]
    parameters: ParameterArgs,
    #[arg(
        long,
        global = true,
        default_value = "warn",
        help = "Log filter, overridden by RUST_LOG"
    )]
    log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print the savings projection (default)
    Project,
    /// Serve projections as JSON over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Default, Clone)]
struct ParameterArgs {
    #[arg(long, global = true, alias = "birth_year", help = "Birth year of the individual")]
    birth_year: Option<i32>,
    #[arg(
        long,
        global = true,
        alias = "life_span",
        help = "How long the individual expects to live, e.g. 100"
    )]
    life_span: Option<u32>,
    #[arg(
        long,
        global = true,
        alias = "retirement_age",
        help = "The age at which the individual expects to retire"
    )]
    retirement_age: Option<u32>,
    #[arg(
        long,
        global = true,
        alias = "cur_yearly_salary",
        help = "The current yearly income of the individual"
    )]
    yearly_salary: Option<f64>,
    #[arg(
        long,
        global = true,
        alias = "yearly_salary_increase_pct",
        allow_negative_numbers = true,
        help = "Yearly income growth as a fraction; a 1% raise is 0.01"
    )]
    salary_growth_rate: Option<f64>,
    #[arg(
        long,
        global = true,
        alias = "yearly_investment_return_during_career",
        help = "Yearly investment return during the career as a fraction; 8% is 0.08"
    )]
    career_return_rate: Option<f64>,
    #[arg(
        long,
        global = true,
        alias = "yearly_investment_return_during_retirement",
        allow_negative_numbers = true,
        help = "Yearly investment return during retirement as a fraction; 4% is 0.04"
    )]
    retirement_return_rate: Option<f64>,
    #[arg(
        long,
        global = true,
        alias = "upfront_investment",
        help = "The amount currently held in investments"
    )]
    upfront_investment: Option<f64>,
    #[arg(
        long,
        global = true,
        alias = "yearly_retirement_contribution_ratio",
        help = "Share of income saved for retirement; a third is 0.33"
    )]
    contribution_ratio: Option<f64>,
}

impl From<&ParameterArgs> for ConfigOverrides {
    fn from(value: &ParameterArgs) -> Self {
        ConfigOverrides {
            birth_year: value.birth_year,
            life_span: value.life_span,
            retirement_age: value.retirement_age,
            yearly_salary: value.yearly_salary,
            salary_growth_rate: value.salary_growth_rate,
            career_return_rate: value.career_return_rate,
            retirement_return_rate: value.retirement_return_rate,
            upfront_investment: value.upfront_investment,
            contribution_ratio: value.contribution_ratio,
        }
    }
}

/// Overrides accepted by the HTTP endpoint, on top of the server's base
/// parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    birth_year: Option<i32>,
    life_span: Option<u32>,
    retirement_age: Option<u32>,
    yearly_salary: Option<f64>,
    salary_growth_rate: Option<f64>,
    career_return_rate: Option<f64>,
    retirement_return_rate: Option<f64>,
    upfront_investment: Option<f64>,
    contribution_ratio: Option<f64>,
    current_year: Option<i32>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_cli(cli: Cli) -> Result<(), String> {
    init_logging(&cli.log_level, cli.log_format);

    if let Some(path) = &cli.write_default_config_to {
        return write_default_config(path).map_err(|e| e.to_string());
    }

    let overrides = ConfigOverrides::from(&cli.parameters);
    let params =
        resolve_parameters(cli.config_file.as_deref(), &overrides).map_err(|e| e.to_string())?;

    match cli.command.unwrap_or(Command::Project) {
        Command::Project => {
            let projection = run_projection(&params, current_year()).map_err(|e| e.to_string())?;
            print!("{}", render_report(&params, &projection));
            Ok(())
        }
        Command::Serve { port } => run_http_server(port, params)
            .await
            .map_err(|e| format!("Server error: {e}")),
    }
}

/// Initializes the tracing subscriber; logs go to stderr so the report stays
/// clean on stdout.
fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

pub fn render_report(params: &ParameterSet, projection: &Projection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Config");
    let _ = writeln!(out, "Retiring at : {}", params.retirement_age);
    let _ = writeln!(
        out,
        "yearly salary to be {}",
        to_currency(params.yearly_salary)
    );
    let _ = writeln!(
        out,
        "annual contribution ratio {}",
        params.contribution_ratio
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "TVM of $1 today is {:.4}",
        projection.tvm_factor
    );
    let _ = writeln!(
        out,
        "With {} you could live until age of {:.1}",
        to_currency(projection.savings_at_retirement),
        projection.lasts_until_age
    );
    let _ = writeln!(
        out,
        "Amount of money saved by age {} would be {} with annual contribution ratio of {} for {} years, so total money put in would be {} + init of {}",
        projection.retirement_age,
        to_currency(projection.savings_at_retirement),
        params.contribution_ratio,
        projection.years_until_retirement,
        to_currency(projection.total_contributed),
        to_currency(projection.upfront_investment),
    );
    let _ = writeln!(
        out,
        "If you entered retirement with {}",
        to_currency(projection.savings_at_retirement)
    );
    for year in &projection.retirement_years {
        let _ = writeln!(
            out,
            "At age {} money in bank will be {} which is {} of original",
            year.age,
            to_currency(year.savings),
            to_percent(year.pct_of_original)
        );
    }
    if let Some(age) = projection.depletion_age {
        let _ = writeln!(out, "Savings run out at age {age}");
    }
    out
}

pub async fn run_http_server(port: u16, base: ParameterSet) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(base);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "retire-calc HTTP API listening");
    println!("retire-calc HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(
    State(base): State<ParameterSet>,
    payload: Result<Query<ProjectionPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => projection_handler_impl(&base, payload),
        Err(rejection) => payload_rejected(rejection.status(), &rejection.body_text()),
    }
}

async fn projection_post_handler(
    State(base): State<ParameterSet>,
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(&base, payload),
        Err(rejection) => payload_rejected(rejection.status(), &rejection.body_text()),
    }
}

fn payload_rejected(status: StatusCode, reason: &str) -> Response {
    warn!(%status, reason, "rejected projection payload");
    error_response(status, &format!("Invalid API payload: {reason}"))
}

fn projection_handler_impl(base: &ParameterSet, payload: ProjectionPayload) -> Response {
    match projection_from_payload(base, payload) {
        Ok(projection) => json_response(StatusCode::OK, projection),
        Err(msg) => {
            warn!(error = %msg, "rejected projection request");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn projection_from_payload(
    base: &ParameterSet,
    payload: ProjectionPayload,
) -> Result<Projection, String> {
    let year = payload.current_year.unwrap_or_else(current_year);
    let overrides = ConfigOverrides {
        birth_year: payload.birth_year,
        life_span: payload.life_span,
        retirement_age: payload.retirement_age,
        yearly_salary: payload.yearly_salary,
        salary_growth_rate: payload.salary_growth_rate,
        career_return_rate: payload.career_return_rate,
        retirement_return_rate: payload.retirement_return_rate,
        upfront_investment: payload.upfront_investment,
        contribution_ratio: payload.contribution_ratio,
    };
    let params = overrides.apply(base.clone());
    run_projection(&params, year).map_err(|e| e.to_string())
}

#[cfg(test)]
fn projection_from_json(base: &ParameterSet, json: &str) -> Result<Projection, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    projection_from_payload(base, payload)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_params() -> ParameterSet {
        ParameterSet {
            birth_year: 1990,
            life_span: 70,
            ..ParameterSet::default()
        }
    }

    #[test]
    fn cli_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "retire-calc",
            "--retirement-age",
            "60",
            "--cur_yearly_salary",
            "75000",
            "--salary-growth-rate",
            "-0.01",
        ])
        .expect("flags should parse");
        let overrides = ConfigOverrides::from(&cli.parameters);
        assert_eq!(overrides.retirement_age, Some(60));
        assert_eq!(overrides.yearly_salary, Some(75_000.0));
        assert_eq!(overrides.salary_growth_rate, Some(-0.01));
        assert_eq!(overrides.life_span, None);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn serve_subcommand_accepts_port_and_parameters() {
        let cli = Cli::try_parse_from([
            "retire-calc",
            "serve",
            "--port",
            "9000",
            "--life-span",
            "95",
        ])
        .expect("serve should parse");
        assert_eq!(cli.command, Some(Command::Serve { port: 9000 }));
        assert_eq!(cli.parameters.life_span, Some(95));
    }

    #[test]
    fn config_file_flags_parse() {
        let cli = Cli::try_parse_from(["retire-calc", "-c", "mine.yaml", "--log-format", "json"])
            .expect("config flags should parse");
        assert_eq!(cli.config_file, Some(PathBuf::from("mine.yaml")));
        assert_eq!(cli.log_format, LogFormat::Json);

        let cli = Cli::try_parse_from(["retire-calc", "--write-default-config-to", "out.yaml"])
            .expect("write flag should parse");
        assert_eq!(cli.write_default_config_to, Some(PathBuf::from("out.yaml")));
    }

    #[test]
    fn projection_from_json_applies_camel_case_overrides() {
        let json = r#"{
          "retirementAge": 60,
          "yearlySalary": 80000,
          "contributionRatio": 0.2,
          "currentYear": 2030
        }"#;
        let projection = projection_from_json(&sample_params(), json).expect("valid payload");
        assert_eq!(projection.retirement_age, 60);
        assert_eq!(projection.years_until_retirement, 20);
        assert_approx(projection.yearly_stipend, 56_000.0);
        assert_eq!(projection.retirement_years.len(), 10);
    }

    #[test]
    fn projection_from_json_reports_invalid_parameters() {
        let err = projection_from_json(
            &sample_params(),
            r#"{"lifeSpan": 50, "currentYear": 2030}"#,
        )
        .expect_err("life span before retirement must fail");
        assert!(err.contains("life_span"));

        let err = projection_from_json(&sample_params(), r#"{"careerReturnRate": "high"}"#)
            .expect_err("wrong type must fail");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn report_lists_every_retirement_year() {
        let params = sample_params();
        let projection = run_projection(&params, 2030).expect("valid projection");
        let report = render_report(&params, &projection);

        assert!(report.starts_with("Config\nRetiring at : 65\n"));
        assert!(report.contains("yearly salary to be $50,000.00"));
        assert!(report.contains("for 25 years"));
        assert!(report.contains("which is 100.00% of original"));
        for age in 65..70 {
            assert!(report.contains(&format!("At age {age} money in bank")));
        }
        assert!(!report.contains("At age 70 money in bank"));
    }

    #[test]
    fn report_mentions_depletion() {
        let params = ParameterSet {
            upfront_investment: 1_000.0,
            ..sample_params()
        };
        let projection = run_projection(&params, params.retirement_year().unwrap()).unwrap();
        let report = render_report(&params, &projection);
        assert!(report.contains("Savings run out at age 66"));
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn malformed_post_body_gets_a_json_error() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::Request;

        let request = Request::builder()
            .method("POST")
            .uri("/api/projection")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"lifeSpan\": "))
            .expect("request should build");
        let payload = Json::<ProjectionPayload>::from_request(request, &()).await;
        assert!(payload.is_err());

        let response = projection_post_handler(State(sample_params()), payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        let body = response_json(response).await;
        let error = body["error"].as_str().expect("error should be a string");
        assert!(error.starts_with("Invalid API payload"), "got {error}");
    }

    #[tokio::test]
    async fn oversized_life_span_is_rejected_over_http() {
        let payload = ProjectionPayload {
            life_span: Some(4_000_000_000),
            ..ProjectionPayload::default()
        };
        let response = projection_post_handler(State(sample_params()), Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("life_span"));
    }

    #[test]
    fn error_response_is_json_with_no_store() {
        let response = error_response(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
    }
}
