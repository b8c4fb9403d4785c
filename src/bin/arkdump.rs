//! Command-line front end: one subcommand per file kind, printing a
//! summary of the decoded object graph.

use ark_save_codec::{load_cloud_file, load_profile_file, load_tribe_file, load_world, DecoderOptions, WorldSave};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arkdump", about = "Decode ARK save files and print a summary")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Offset adjustment applied to Modern v7+ cloud properties offsets.
    #[arg(long, global = true, default_value_t = 1)]
    cloud_v7_offset_adjustment: i32,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a player profile (.arkprofile)
    Profile { path: PathBuf },
    /// Decode a tribe file (.arktribe)
    Tribe { path: PathBuf },
    /// Decode a cloud inventory file
    Cloud { path: PathBuf },
    /// Decode a world save (.ark binary or SQLite)
    World { path: PathBuf },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let opts = DecoderOptions {
        cloud_v7_offset_adjustment: cli.cloud_v7_offset_adjustment,
        ..DecoderOptions::default()
    };

    let result = match cli.command {
        Command::Profile { path } => load_profile_file(&path, &opts).map(|f| {
            println!(
                "profile v{} ({:?}): {} objects",
                f.version,
                f.generation,
                f.container.objects.len()
            );
        }),
        Command::Tribe { path } => load_tribe_file(&path, &opts).map(|f| {
            println!(
                "tribe v{} ({:?}): {} objects",
                f.version,
                f.generation,
                f.container.objects.len()
            );
        }),
        Command::Cloud { path } => load_cloud_file(&path, &opts).map(|f| {
            println!(
                "cloud v{} ({:?}): {} objects",
                f.version,
                f.generation,
                f.container.objects.len()
            );
        }),
        Command::World { path } => load_world(&path, &opts).map(|save| match save {
            WorldSave::Legacy(w) => {
                println!(
                    "world save (ASE v{}): game_time={:.1}s, {} objects, {} parse errors",
                    w.version,
                    w.game_time,
                    w.container.objects.len(),
                    w.parse_errors.len()
                );
            }
            WorldSave::Modern(w) => {
                println!(
                    "world save (ASA v{}): game_time={:.1}s, {} objects, {} parse errors",
                    w.version,
                    w.game_time,
                    w.container.objects.len(),
                    w.parse_errors.len()
                );
            }
        }),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
