use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use snipshare_types::SupportedLanguage;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod settings;
mod version;

use commands::{Node, SnippetArgs, SnippetSource};
use settings::AppConfig;
use version::{git_commit_hash, SNIPSHARE_VERSION};

fn cli() -> Command {
    Command::new("snipshare")
        .version(SNIPSHARE_VERSION)
        .about("Share code snippets peer to peer by content id")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["pretty", "json"])
                .help("Log output format")
                .global(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Base URL share links are resolved against")
                .global(true),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .value_name("MULTIADDR")
                .action(ArgAction::Append)
                .help("Address this node is reachable at (repeatable, replaces configured addresses)")
                .global(true),
        )
        .subcommand(
            Command::new("share")
                .about("Share files as one batch and print the share link")
                .arg(
                    Arg::new("paths")
                        .value_name("PATH")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("snippet")
                .about("Share a single snippet and print its share and edit links")
                .arg(
                    Arg::new("filename")
                        .long("filename")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .value_name("LANG")
                        .value_parser(value_parser!(SupportedLanguage)),
                )
                .arg(Arg::new("code").long("code").value_name("TEXT"))
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf)),
                )
                .group(
                    ArgGroup::new("source")
                        .args(["code", "from"])
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("open")
                .about("Classify a link and show the retrieval it would start")
                .arg(Arg::new("link").value_name("LINK").required(true)),
        )
        .subcommand(Command::new("addresses").about("Show node addresses and the ones shared in links"))
}

fn load_config_with_overrides(matches: &ArgMatches) -> Result<AppConfig> {
    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let mut config = AppConfig::load(config_path)?;
    apply_overrides(matches, &mut config);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(matches: &ArgMatches, config: &mut AppConfig) {
    if let Some(log_level) = matches.get_one::<String>("log-level") {
        config.log_level = log_level.clone();
    }

    if let Some(log_format) = matches.get_one::<String>("log-format") {
        config.log_format = log_format.clone();
    }

    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.share_base_url = base_url.clone();
    }

    if let Some(addresses) = matches.get_many::<String>("address") {
        config.node_addresses = addresses.cloned().collect();
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Logs go to stderr so command output stays pipeable.
    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()
            .context("failed to install log subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(io::stderr))
            .try_init()
            .context("failed to install log subscriber")?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = load_config_with_overrides(&matches)?;
    init_logging(&config)?;
    info!(
        version = SNIPSHARE_VERSION,
        commit = git_commit_hash(),
        "snipshare starting"
    );
    debug!(?config, "configuration loaded");

    let node = Node::new(&config)?;
    let mut out = io::stdout().lock();

    match matches.subcommand() {
        Some(("share", sub)) => {
            let paths: Vec<PathBuf> = sub
                .get_many::<PathBuf>("paths")
                .map(|paths| paths.cloned().collect())
                .unwrap_or_default();
            node.share(&paths, &mut out).await
        }
        Some(("snippet", sub)) => {
            let source = match (sub.get_one::<String>("code"), sub.get_one::<PathBuf>("from")) {
                (Some(code), _) => SnippetSource::Inline(code.clone()),
                (None, Some(path)) => SnippetSource::File(path.clone()),
                (None, None) => anyhow::bail!("either --code or --from is required"),
            };
            let args = SnippetArgs {
                filename: sub
                    .get_one::<String>("filename")
                    .cloned()
                    .context("--filename is required")?,
                language: sub.get_one::<SupportedLanguage>("language").copied(),
                source,
            };
            node.snippet(args, &mut out).await
        }
        Some(("open", sub)) => {
            let link = sub
                .get_one::<String>("link")
                .context("a link is required")?;
            node.open(link, &mut out)
        }
        Some(("addresses", _)) => node.addresses(&mut out),
        _ => anyhow::bail!("unknown command; see --help"),
    }
}
