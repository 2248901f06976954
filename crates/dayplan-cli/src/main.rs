//! `dayplan` command line

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dayplan_cli::{CliConfig, EditScript, ScriptRunner};
use dayplan_http::HttpDayBackend;
use dayplan_model::{DayId, DayKey, PlaceResult, RemoteDayState, TripId};
use dayplan_session::{DayBackend, InMemoryDayBackend, SessionBuilder};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn script_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("script")
                .long("script")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Edit script (TOML, [[step]] tables)"),
        )
        .arg(
            Arg::new("apply")
                .long("apply")
                .action(ArgAction::SetTrue)
                .help("Submit apply steps and any edits left pending at the end"),
        )
}

fn cli() -> Command {
    Command::new("dayplan")
        .version(dayplan_cli::VERSION)
        .about("Replay day plan edit scripts")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file with [session] and [http] tables"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(script_args(
            Command::new("replay")
                .about("Replay against an in-memory copy of a day")
                .arg(
                    Arg::new("day")
                        .long("day")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Day state as JSON"),
                )
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .value_parser(value_parser!(PathBuf))
                        .help("Searchable places as a JSON array"),
                ),
        ))
        .subcommand(script_args(
            Command::new("remote")
                .about("Replay against the REST API")
                .arg(Arg::new("trip").long("trip").required(true).help("Trip id"))
                .arg(Arg::new("day").long("day").required(true).help("Day id"))
                .arg(
                    Arg::new("day-index")
                        .long("day-index")
                        .default_value("0")
                        .value_parser(value_parser!(u32))
                        .help("Zero-based position of the day in the trip"),
                ),
        ))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{name} is required"))
}

async fn run(
    key: DayKey,
    backend: Arc<dyn DayBackend>,
    config: &CliConfig,
    args: &ArgMatches,
) -> anyhow::Result<()> {
    let script = EditScript::load(path_arg(args, "script")?)?;
    let session = SessionBuilder::new(key, backend)
        .with_config(config.session.clone())
        .open()?;
    let runner = ScriptRunner::new(session, args.get_flag("apply"));
    let report = runner.run(&script).await?;
    runner.session().close();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    match matches.subcommand() {
        Some(("replay", args)) => {
            let day: RemoteDayState = read_json(path_arg(args, "day")?)?;
            let catalog: Vec<PlaceResult> = match args.get_one::<PathBuf>("catalog") {
                Some(path) => read_json(path)?,
                None => Vec::new(),
            };
            let key = DayKey::new(TripId::new("local")?, DayId::new("day")?, 0);
            let backend = InMemoryDayBackend::new().with_catalog(catalog);
            backend.insert_day(&key, day);
            run(key, Arc::new(backend), &config, args).await
        }
        Some(("remote", args)) => {
            let key = DayKey::new(
                TripId::new(string_arg(args, "trip")?)?,
                DayId::new(string_arg(args, "day")?)?,
                args.get_one::<u32>("day-index").copied().unwrap_or(0),
            );
            let backend = HttpDayBackend::connect(&config.http)
                .with_context(|| format!("cannot reach {}", config.http.base_url))?;
            run(key, Arc::new(backend), &config, args).await
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn remote_parses_key_arguments() {
        let matches = cli()
            .try_get_matches_from([
                "dayplan", "remote", "--trip", "t1", "--day", "d3", "--day-index", "2",
                "--script", "edits.toml", "--apply", "--json",
            ])
            .unwrap();
        assert!(matches.get_flag("json"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "remote");
        assert_eq!(string_arg(args, "trip").unwrap(), "t1");
        assert_eq!(args.get_one::<u32>("day-index"), Some(&2));
        assert!(args.get_flag("apply"));
    }

    #[test]
    fn replay_requires_a_day_file() {
        assert!(cli()
            .try_get_matches_from(["dayplan", "replay", "--script", "edits.toml"])
            .is_err());
    }
}
