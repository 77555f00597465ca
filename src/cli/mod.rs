use std::io::Read;

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::{
    core::config::{parse_timeout, GeneratorConfig},
    error::ItineraryError,
    schemas::{document_contract, validate_itinerary_document},
    services::prompt::build_prompt,
    types::TripRequest,
    ItineraryGenerator,
};

fn input_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .index(1)
        .value_name("FILE|-")
}

fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .help("Print single-line JSON")
        .action(ArgAction::SetTrue)
}

fn command() -> Command {
    Command::new("itinerary-gen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate three-tier travel itineraries from a trip request")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("generate")
                .about("Generate itineraries for a trip request (JSON file or - for stdin)")
                .arg(input_arg("request", "Trip request JSON"))
                .arg(
                    Arg::new("offline")
                        .long("offline")
                        .help("Skip the model and use the local synthesizer")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .value_name("MODEL")
                        .help("Model name (or set ITINERARY_MODEL)"),
                )
                .arg(
                    Arg::new("api-key")
                        .short('k')
                        .long("api-key")
                        .value_name("KEY")
                        .help("Model API key (or set OPENAI_API_KEY)"),
                )
                .arg(
                    Arg::new("base-url")
                        .short('u')
                        .long("base-url")
                        .value_name("URL")
                        .help("API base URL (or set OPENAI_BASE_URL / OPENROUTER_BASE_URL)"),
                )
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .value_name("SECONDS")
                        .help("Model call timeout in seconds (or set ITINERARY_TIMEOUT_SECS)"),
                )
                .arg(compact_arg()),
        )
        .subcommand(
            Command::new("prompt")
                .about("Print the model prompt for a trip request")
                .arg(input_arg("request", "Trip request JSON")),
        )
        .subcommand(
            Command::new("validate")
                .about("Check an itinerary document against the structural contract")
                .arg(input_arg("document", "Itinerary document JSON"))
                .arg(compact_arg()),
        )
        .subcommand(
            Command::new("schema")
                .about("Print the JSON Schema of an itinerary document")
                .arg(compact_arg()),
        )
}

/// CLI entry point for the itinerary generator
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let matches = command().get_matches();

    match matches.subcommand() {
        Some(("generate", args)) => generate(args).await,
        Some(("prompt", args)) => {
            let request = read_request(args)?;
            println!("{}", build_prompt(&request));
            Ok(())
        }
        Some(("validate", args)) => validate(args),
        Some(("schema", args)) => print_json(&document_contract()?, compact(args)),
        Some((other, _)) => bail!("unknown subcommand {other}"),
        None => bail!("a subcommand is required"),
    }
}

async fn generate(args: &ArgMatches) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::from_env()?;

    if let Some(api_key) = args.get_one::<String>("api-key") {
        config = config.with_api_key(api_key.as_str());
    }
    if let Some(base_url) = args.get_one::<String>("base-url") {
        config = config.with_base_url(base_url.as_str());
    }
    if let Some(model) = args.get_one::<String>("model") {
        config = config.with_model(model.as_str());
    }
    if let Some(timeout) = args.get_one::<String>("timeout") {
        config = config.with_timeout(parse_timeout(timeout)?);
    }
    if args.get_flag("offline") {
        config = config.offline();
    }

    if config.is_offline() {
        info!("No API key configured, generating offline");
    } else {
        info!("Using model {} at {}", config.model, config.base_url);
    }

    let raw = read_json(args, "request")?;
    let generator = ItineraryGenerator::from_config(&config);

    match generator.plan(&raw).await {
        Ok(result) => {
            info!("Itineraries produced by {}", result.path.describe());
            print_json(&result.into_response(), compact(args))
        }
        Err(err @ ItineraryError::InvalidRequest(_)) => {
            print_json(&err.to_error_payload(), compact(args))?;
            error!("Trip request rejected: {}", err);
            bail!("invalid trip request")
        }
        Err(err) => Err(err.into()),
    }
}

fn validate(args: &ArgMatches) -> anyhow::Result<()> {
    let document = read_json(args, "document")?;
    match validate_itinerary_document(&document) {
        Ok(()) => {
            println!("valid");
            Ok(())
        }
        Err(errors) => {
            print_json(&errors, compact(args))?;
            bail!("document has {} schema violation(s)", errors.len())
        }
    }
}

fn read_request(args: &ArgMatches) -> anyhow::Result<TripRequest> {
    let raw = read_json(args, "request")?;
    TripRequest::from_value(&raw).map_err(|errors| ItineraryError::InvalidRequest(errors).into())
}

fn read_json(args: &ArgMatches, name: &str) -> anyhow::Result<Value> {
    let source = args
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or("-");

    let text = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };

    serde_json::from_str(&text).with_context(|| format!("{source} is not valid JSON"))
}

fn compact(args: &ArgMatches) -> bool {
    args.get_flag("compact")
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_generate_flags() {
        let matches = command()
            .try_get_matches_from([
                "itinerary-gen",
                "generate",
                "trip.json",
                "--offline",
                "--timeout",
                "30",
                "--compact",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "generate");
        assert!(args.get_flag("offline"));
        assert!(compact(args));
        assert_eq!(args.get_one::<String>("timeout").map(String::as_str), Some("30"));
        assert_eq!(args.get_one::<String>("request").map(String::as_str), Some("trip.json"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(command().try_get_matches_from(["itinerary-gen"]).is_err());
    }
}
