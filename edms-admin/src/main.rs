/*!
 * EDMS Administrative CLI
 *
 * Command-line management of an edms-api instance's SQLite database:
 * user accounts, site and device listings, manual device status changes,
 * overdue sweeps and demo data.
 *
 * All database work goes through the ORM functions in edms-api, so the CLI
 * enforces the same rules as the HTTP API. The database is taken from
 * DATABASE_URL (a .env file is honoured) and migrated on connect.
 *
 * For detailed usage information and available commands, run with --help.
 */

use clap::{Parser, Subcommand};

mod admin_cli;

use admin_cli::device_commands::{DeviceAction, handle_device_command_with_conn};
use admin_cli::seed_commands::seed_impl;
use admin_cli::site_commands::{SiteAction, handle_site_command_with_conn};
use admin_cli::user_commands::{UserAction, handle_user_command_with_conn};
use admin_cli::utils::establish_connection;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "edms-admin")]
#[command(about = "Administrative CLI for EDMS database management")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    Site {
        #[command(subcommand)]
        action: SiteAction,
    },
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },
    #[command(about = "Load the demo sites, devices and users into an empty database")]
    Seed,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.version_info {
        println!("edms-admin {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return Ok(());
    }

    let Some(command) = cli.command else {
        return Err("No command given; run with --help for usage".into());
    };

    let mut conn = establish_connection()?;
    match command {
        Commands::User { action } => handle_user_command_with_conn(&mut conn, action)?,
        Commands::Site { action } => handle_site_command_with_conn(&mut conn, action)?,
        Commands::Device { action } => handle_device_command_with_conn(&mut conn, action)?,
        Commands::Seed => {
            seed_impl(&mut conn)?;
        }
    }

    Ok(())
}
