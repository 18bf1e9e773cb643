mod grid;
mod scene;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ember_physics::BodyHandle;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::scene::Scene;

#[derive(Parser, Debug)]
#[command(name = "physim")]
#[command(about = "Run Ember collision scenes headless", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a scene and report contacts and recoveries
    Run {
        /// Scene file (TOML)
        scene: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value_t = 100)]
        ticks: u32,
    },
    /// Parse and validate a scene without running it
    Check {
        /// Scene file (TOML)
        scene: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("physim={log_level},ember_physics={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run { scene, ticks } => run(&scene, ticks),
        Commands::Check { scene } => check(&scene),
    }
}

fn check(path: &Path) -> Result<()> {
    let scene = Scene::load(path)?;
    println!(
        "{}: ok ({} bodies, {}x{} tiles)",
        path.display(),
        scene.bodies.len(),
        scene.grid.width,
        scene.grid.height
    );
    Ok(())
}

fn run(path: &Path, ticks: u32) -> Result<()> {
    let scene = Scene::load(path)?;
    let grid = scene.build_grid();
    let (mut world, names) = scene.build_world();
    let names: HashMap<BodyHandle, String> = names.into_iter().collect();
    let name = |h: &BodyHandle| names.get(h).map(String::as_str).unwrap_or("?");

    tracing::info!(
        "Running {} for {} ticks ({} bodies, {}x{} tiles)",
        path.display(),
        ticks,
        names.len(),
        grid.width(),
        grid.height()
    );

    // bodies are never added or removed mid-run
    let pairs = world.all_pairs();

    let mut contact_count = 0usize;
    let mut recovery_count = 0usize;
    for _ in 0..ticks {
        let report = world.step(&pairs, &grid);

        for contact in &report.contacts {
            if contact.is_resting() {
                tracing::debug!(
                    tick = report.tick,
                    "{} rests on {}",
                    name(&contact.a),
                    name(&contact.b)
                );
            } else {
                tracing::info!(
                    tick = report.tick,
                    tmin = contact.tmin,
                    depth = contact.depth,
                    "{} hit {} (normal {:.2})",
                    name(&contact.a),
                    name(&contact.b),
                    contact.normal
                );
            }
        }
        for recovery in &report.recoveries {
            tracing::info!(
                tick = report.tick,
                "{} stuck at {:.1}, rewound to {:.1}",
                name(&recovery.body),
                recovery.from,
                recovery.to
            );
        }

        contact_count += report.contacts.len();
        recovery_count += report.recoveries.len();
    }

    println!("After {ticks} ticks: {contact_count} contacts, {recovery_count} recoveries");
    for (handle, body) in world.bodies().iter() {
        println!(
            "  {:<16} pos {:>8.1} {:>8.1} {:>8.1}  vel {:>6.1} {:>6.1} {:>6.1}  crumbs {}",
            name(&handle),
            body.position.x,
            body.position.y,
            body.position.z,
            body.velocity.x,
            body.velocity.y,
            body.velocity.z,
            body.breadcrumbs().valid_count()
        );
    }

    Ok(())
}
