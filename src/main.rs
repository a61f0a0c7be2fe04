use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use cemnav_core::{Coordinate, NetworkConfig, RouteOptions};
use log::{LevelFilter, error};

mod commands;

use commands::parse_coordinate;

#[derive(Parser, Debug)]
#[command(author, version, about = "Walking routes across cemetery grounds", long_about = None)]
struct Args {
    /// More log output; repeat for trace level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// GeoJSON file with LineString / MultiLineString road features
    #[arg(short, long)]
    geometry: PathBuf,
    /// Bridge candidates examined per node
    #[arg(long, default_value_t = NetworkConfig::default().k)]
    k: usize,
    /// Largest gap in meters a bridge edge may span
    #[arg(long, default_value_t = NetworkConfig::default().max_dist)]
    max_dist: f64,
}

impl BuildArgs {
    fn config(&self) -> NetworkConfig {
        NetworkConfig::new(self.k, self.max_dist)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route from one point to one or more destinations
    Route {
        #[command(flatten)]
        build: BuildArgs,
        /// Start as LAT,LNG
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        from: Coordinate,
        /// Destination as LAT,LNG; repeat for several
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true, required = true)]
        to: Vec<Coordinate>,
        /// Snap radius around the start, meters
        #[arg(long, default_value_t = RouteOptions::default().start_radius)]
        start_radius: f64,
        /// Snap radius around each destination, meters
        #[arg(long, default_value_t = RouteOptions::default().dest_radius)]
        dest_radius: f64,
        /// Print GeoJSON features instead of the route summary
        #[arg(long)]
        geojson: bool,
    },
    /// Build the network and print its statistics
    Inspect {
        #[command(flatten)]
        build: BuildArgs,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let result = match args.cmd {
        Command::Route {
            build,
            from,
            to,
            start_radius,
            dest_radius,
            geojson,
        } => {
            let options = RouteOptions {
                start_radius,
                dest_radius,
            };
            commands::route(&build.geometry, &build.config(), from, &to, &options, geojson)
        }
        Command::Inspect { build } => commands::inspect(&build.geometry, &build.config()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
