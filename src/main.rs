// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use certsync::certificate::{CertificateInfo, Thumbprint};
use certsync::constants::{DEFAULT_BINDING_PORT, INSTALLER_WEB};
use certsync::installer::{auto_confirm, InstallOutcome, InstallerRegistry, WebInstaller};
use certsync::inventory::file::FileAdapter;
use certsync::target::Target;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "certsync", version, about = "Reconcile certificate bindings against a site inventory")]
struct Cli {
    /// Path to the JSON inventory file
    #[arg(long, global = true, default_value = "inventory.json")]
    inventory: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of the site inventory
    Show,
    /// Reconcile bindings for a target against the inventory
    Install {
        /// Installer to run (see --list for registered keys)
        #[arg(long, default_value = INSTALLER_WEB)]
        installer: String,
        /// Installation site id
        #[arg(long)]
        site: u64,
        /// Common name of the certificate
        #[arg(long)]
        common_name: String,
        /// Additional hosts covered by the certificate
        #[arg(long = "host")]
        hosts: Vec<String>,
        /// Thumbprint of the new certificate (hex)
        #[arg(long)]
        thumbprint: String,
        /// Thumbprint of the superseded certificate (hex)
        #[arg(long)]
        old_thumbprint: Option<String>,
        /// Certificate store holding the new private key
        #[arg(long, default_value = "WebHosting")]
        store: String,
        /// Port for newly created https bindings
        #[arg(long, default_value_t = DEFAULT_BINDING_PORT)]
        port: u16,
        /// Resolve certificates from the central store
        #[arg(long)]
        central_ssl: bool,
        /// Allow IP-specific https creations without prompting
        #[arg(long)]
        accept_ip: bool,
    },
    /// List the registered installer keys
    List,
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("certsync")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Respects RUST_LOG if set, otherwise defaults to INFO level.
    // RUST_LOG_FORMAT=json switches to structured output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let cli = Cli::parse();
    let adapter = Arc::new(FileAdapter::new(&cli.inventory));

    match cli.command {
        Command::Show => show(adapter.as_ref()).await,
        Command::List => {
            for key in InstallerRegistry::builtin().keys() {
                println!("{key}");
            }
            Ok(())
        }
        Command::Install {
            installer,
            site,
            common_name,
            hosts,
            thumbprint,
            old_thumbprint,
            store,
            port,
            central_ssl,
            accept_ip,
        } => {
            let new_cert = CertificateInfo::new(
                thumbprint
                    .parse::<Thumbprint>()
                    .context("invalid --thumbprint")?,
                &store,
            );
            let old_cert = old_thumbprint
                .map(|t| {
                    t.parse::<Thumbprint>()
                        .map(|tp| CertificateInfo::new(tp, &store))
                })
                .transpose()
                .context("invalid --old-thumbprint")?;

            let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
            let target = Target::new(&common_name, &host_refs, Some(site));
            let confirm = auto_confirm(accept_ip);

            // The web installer takes its extra knobs from the command
            // line; everything else comes straight from the registry.
            let registry = InstallerRegistry::builtin();
            let installer: Box<dyn certsync::installer::Install> =
                if installer == INSTALLER_WEB {
                    Box::new(
                        WebInstaller::new(adapter.clone(), confirm.clone())
                            .with_port(port)
                            .with_central_ssl(central_ssl),
                    )
                } else {
                    registry
                        .create(&installer, adapter.clone(), confirm)
                        .with_context(|| format!("unknown installer '{installer}'"))?
                };

            debug!(target = %common_name, site, "Starting installation");
            match installer.install(&target, &new_cert, old_cert.as_ref()).await? {
                InstallOutcome::Changed { changed, blocked } => {
                    info!(changed, "Installation committed");
                    for host in blocked {
                        warn!(%host, "Host left blocked pending operator confirmation (rerun with --accept-ip)");
                    }
                }
                InstallOutcome::NoChangeNeeded => {
                    info!("Nothing needed doing");
                }
            }
            Ok(())
        }
    }
}

async fn show(adapter: &FileAdapter) -> Result<()> {
    use certsync::inventory::InventoryAdapter;

    let inventory = adapter.load().await?;
    println!(
        "platform {}, {} site(s)",
        inventory.platform,
        inventory.sites.len()
    );
    for site in &inventory.sites {
        println!("#{} {} ({})", site.id, site.name, site.path);
        for binding in &site.bindings {
            let cert = binding
                .certificate_hash
                .as_ref()
                .map(|t| format!(" cert={t}"))
                .unwrap_or_default();
            println!(
                "  {} {}{}",
                binding.protocol,
                binding.binding_information(),
                cert
            );
        }
        if let Some(ssl) = &site.ftp_ssl {
            if let Some(hash) = &ssl.server_cert_hash {
                println!("  ftps cert={hash}");
            }
        }
    }
    Ok(())
}
