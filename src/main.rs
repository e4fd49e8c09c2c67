use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use breachnet::analysis::{shortest_entry_distances, EntryDistances};
use breachnet::config::{ConfigGroup, DocMetadata};
use breachnet::config_loader::{load_network_config, save_network_config};
use breachnet::network::{place_nodes, BuildOptions, NetworkBuilder, NetworkConfig};
use breachnet::resolver::{FeedSettings, TableFeedResolver, DEFAULT_FEED_TIMEOUT};
use breachnet::utils::{check_reachability, parse_duration, validate_score_range};

/// Build and inspect simulated networks for cyber-defence training
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a network from a CSV table and write its configuration
    Build {
        /// Network table (nodeID,xGraphLocation,yGraphLocation,isEntryNode,isHighValue,cpe,connections)
        #[arg(long)]
        csv: PathBuf,

        /// Exported vulnerability feed table (.json, .yaml or identifier,score text)
        #[arg(long)]
        feed: Option<PathBuf>,

        /// Only use feed identifiers containing this substring
        #[arg(long, requires = "feed")]
        feed_filter: Option<String>,

        /// Time allowed for the feed query (e.g. "500ms", "10s")
        #[arg(long, value_parser = parse_duration, requires = "feed")]
        feed_timeout: Option<Duration>,

        /// Name of the environment variable holding feed credentials
        #[arg(long, requires = "feed")]
        feed_credentials_env: Option<String>,

        /// Placement and vulnerability settings to apply to the built network
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lay nodes out on a circle instead of using declared positions
        #[arg(long)]
        auto_positions: bool,

        /// Lower bound of random vulnerability scores
        #[arg(long)]
        min: Option<f64>,

        /// Upper bound of random vulnerability scores
        #[arg(long)]
        max: Option<f64>,

        /// Where to write the network configuration as JSON
        #[arg(short, long, default_value = "network.json")]
        output: PathBuf,

        /// Seed for reproducible scores and placement
        #[arg(long)]
        seed: Option<u64>,

        /// Name recorded in the document metadata
        #[arg(long)]
        name: Option<String>,
    },

    /// Validate a network configuration file
    Validate {
        /// Configuration file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print hop distances from the entry nodes for a CSV network table
    Distances {
        #[arg(long)]
        csv: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn print_distances(distances: &EntryDistances) {
    for (id, distance) in distances.iter() {
        println!("{:<24} {}", id, distance);
    }
    match distances.eccentricity() {
        Some(max) => println!(
            "{} of {} nodes reachable, furthest at {} hops: {}",
            distances.reachable_count(),
            distances.len(),
            max,
            distances.furthest_nodes().join(", ")
        ),
        None => println!("No node is reachable from an entry node"),
    }
}

fn feed_settings(
    feed: &Path,
    filter: Option<String>,
    timeout: Option<Duration>,
    credentials_env: Option<&str>,
) -> Result<FeedSettings> {
    let endpoint = feed
        .to_str()
        .ok_or_else(|| eyre!("Feed path {:?} is not valid UTF-8", feed))?;
    let mut settings = FeedSettings::new(endpoint);
    settings.filter = filter;
    settings.timeout = timeout.unwrap_or(DEFAULT_FEED_TIMEOUT);
    if let Some(var) = credentials_env {
        match std::env::var(var) {
            Ok(value) => settings.credentials = Some(value),
            Err(_) => warn!("Feed credentials variable {} is not set", var),
        }
    }
    Ok(settings)
}

#[allow(clippy::too_many_arguments)]
fn run_build(
    csv: PathBuf,
    feed: Option<PathBuf>,
    feed_filter: Option<String>,
    feed_timeout: Option<Duration>,
    feed_credentials_env: Option<String>,
    config: Option<PathBuf>,
    auto_positions: bool,
    min: Option<f64>,
    max: Option<f64>,
    output: PathBuf,
    seed: Option<u64>,
    name: Option<String>,
) -> Result<()> {
    let settings_config = match &config {
        Some(path) => {
            let loaded = load_network_config(path)?;
            loaded.validation().clone().into_result()?;
            Some(loaded)
        }
        None => None,
    };

    let (config_min, config_max) = settings_config
        .as_ref()
        .map(|c| c.vulnerability_range().bounds())
        .unwrap_or((0.0, 1.0));
    let random_score_range = validate_score_range(min.unwrap_or(config_min), max.unwrap_or(config_max))
        .map_err(|e| eyre!(e))?;

    let options = BuildOptions {
        generate_positions: auto_positions,
        random_score_range,
        feed_timeout: feed_timeout.unwrap_or(DEFAULT_FEED_TIMEOUT),
        seed,
        ..BuildOptions::default()
    };
    let mut builder = NetworkBuilder::new(options);

    if let Some(feed) = &feed {
        let settings = feed_settings(feed, feed_filter, feed_timeout, feed_credentials_env.as_deref())?;
        info!("Using vulnerability feed: {:?}", settings);
        match TableFeedResolver::open(&settings) {
            Ok(resolver) => builder = builder.with_resolver(Arc::new(resolver)),
            Err(e) => warn!("{}. Falling back to random vulnerability scores.", e),
        }
    }

    let mut built = builder
        .build_from_file(&csv)
        .wrap_err_with(|| format!("Failed to build network from {:?}", csv))?;

    if let Some(settings) = &settings_config {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (entry, high_value) = place_nodes(
            &mut built.graph,
            settings.entry_placement(),
            settings.high_value_placement(),
            &mut rng,
        )?;
        info!("Entry nodes: {:?}", entry);
        info!("High value nodes: {:?}", high_value);
        built.high_value_count = high_value.len();
    }

    let distances = shortest_entry_distances(&built.graph)?;
    check_reachability(distances.reachable_count(), distances.len());
    print_distances(&distances);

    let mut network_config = NetworkConfig::from_built(&built);
    if let Some(settings) = settings_config {
        network_config.set_policies(
            settings.entry_placement().clone(),
            settings.high_value_placement().clone(),
            settings.vulnerability_range().clone(),
        );
    }
    let doc_name = name.unwrap_or_else(|| {
        csv.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("network")
            .to_string()
    });
    network_config.set_doc_metadata(DocMetadata::new(&doc_name))?;
    network_config.validate();
    if !network_config.validation().passed() {
        warn!("Built network configuration has validation failures:\n{}", network_config.validation());
    }

    save_network_config(&network_config, &output)?;
    Ok(())
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting breachnet v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Build {
            csv,
            feed,
            feed_filter,
            feed_timeout,
            feed_credentials_env,
            config,
            auto_positions,
            min,
            max,
            output,
            seed,
            name,
        } => run_build(
            csv,
            feed,
            feed_filter,
            feed_timeout,
            feed_credentials_env,
            config,
            auto_positions,
            min,
            max,
            output,
            seed,
            name,
        ),
        Command::Validate { config } => {
            let loaded = load_network_config(&config)?;
            println!("{}", loaded.validation());
            loaded
                .validation()
                .clone()
                .into_result()
                .wrap_err_with(|| format!("{:?} failed validation", config))?;
            Ok(())
        }
        Command::Distances { csv, json } => {
            let built = NetworkBuilder::default()
                .build_from_file(&csv)
                .wrap_err_with(|| format!("Failed to build network from {:?}", csv))?;
            let distances = shortest_entry_distances(&built.graph)?;
            if json {
                let map = serde_json::Value::Object(distances.to_json());
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                print_distances(&distances);
            }
            Ok(())
        }
    }
}
