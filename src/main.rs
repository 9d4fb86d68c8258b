use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use sshfs_mount::modules::config::parse_id_pair;
use sshfs_mount::modules::target::resolve_target;
use sshfs_mount::{MountConfig, MountError, MountRequest, MountSession, SlaveSshfs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a host directory on the remote machine until interrupted
    Mount {
        /// Remote machine, as `[user@]host`
        destination: String,
        /// Directory on this machine
        source: PathBuf,
        /// Mount point on the remote machine (`~` and `~user` allowed)
        target: String,
        /// Map a host uid to a remote uid (repeatable)
        #[arg(long = "uid-map", value_name = "HOST:REMOTE", value_parser = parse_id_pair)]
        uid_map: Vec<(u32, u32)>,
        /// Map a host gid to a remote gid (repeatable)
        #[arg(long = "gid-map", value_name = "HOST:REMOTE", value_parser = parse_id_pair)]
        gid_map: Vec<(u32, u32)>,
    },
    /// Show how a mount point resolves without creating anything
    Resolve {
        /// Remote machine, as `[user@]host`
        destination: String,
        /// Mount point on the remote machine
        target: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger based on verbose flag
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new().filter_level(log_level).init();

    let config = match &cli.config {
        Some(path) => MountConfig::load(path)?,
        None => MountConfig::default(),
    };

    match cli.command {
        Commands::Mount {
            destination,
            source,
            target,
            uid_map,
            gid_map,
        } => {
            let mut request = MountRequest::new(source, target)
                .with_uid_map(config.uid_map.clone())
                .with_gid_map(config.gid_map.clone());
            request.uid_map.extend(uid_map);
            request.gid_map.extend(gid_map);

            let session = config.session(&destination);
            let sftp_server = config.sftp_server.clone();
            let started = MountSession::start(session, request, move |session, params| {
                Ok(SlaveSshfs::new(session, params)?.with_sftp_server(sftp_server))
            });

            let mut mount = match started {
                Ok(mount) => mount,
                Err(e @ MountError::MissingCapability { .. }) => {
                    error!("{}", e);
                    error!("install sshfs on the guest, e.g. `sudo apt install sshfs`");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            };

            info!(
                "Mounted on {}:{}; press Ctrl-C to unmount",
                destination,
                mount.resolved().expanded
            );

            let mut signals = Signals::new([SIGINT, SIGTERM])?;
            let interrupted = mount.wait(|| match signals.pending().next() {
                Some(sig) => {
                    info!("Received signal {}, unmounting...", sig);
                    true
                }
                None => false,
            });

            mount.stop();
            if !interrupted {
                bail!(
                    "file server for {}:{} stopped unexpectedly",
                    destination,
                    mount.resolved().expanded
                );
            }
            info!("Unmounted");
        }
        Commands::Resolve {
            destination,
            target,
        } => {
            let mut session = config.session(&destination);
            let resolved = resolve_target(&mut session, &target)?;

            println!("Expanded: {}", resolved.expanded);
            println!("Existing: {}", resolved.existing_root);
            if resolved.needs_creation() {
                println!("Missing:  {}", resolved.missing);
            } else {
                println!("Missing:  (none)");
            }
        }
    }

    Ok(())
}
