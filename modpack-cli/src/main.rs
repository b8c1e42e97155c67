//! Modpack CLI - pack package directories into one importable file

use clap::Parser;
use modpack_config::{HookPolicy, IgnoredEntries, PackConfig};
use modpack_core::{Bundle, Carrier, Packer, RegistryEntry};
use modpack_vfs::{NativeFileSystem, VirtualFileSystem};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

mod config;
mod logging;
mod platform;

use crate::config::{parse_log_level, LogConfig, ProjectFile};
use crate::logging::LogFormat;
use crate::platform::{print_error, CliError};

#[derive(Parser, Debug)]
#[command(
    name = "modpack",
    about = "Pack package directories into a single importable file",
    version
)]
struct Cli {
    /// Package directories to pack
    #[arg(value_name = "PACKAGE", required = true)]
    packages: Vec<PathBuf>,

    /// Write the artifact here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Always install the error hook when the artifact loads
    #[arg(long, conflicts_with = "no_except")]
    set_except: bool,

    /// Never install the error hook
    #[arg(long)]
    no_except: bool,

    /// Emit a `<tag:path>` comment before every embedded file
    #[arg(long)]
    tag: bool,

    /// Default package, given as one of the roots or its directory name
    #[arg(short = 'd', long = "default-pkg", value_name = "NAME")]
    default_pkg: Option<String>,

    /// Custom carrier template
    #[arg(long, value_name = "FILE")]
    carrier: Option<PathBuf>,

    /// Project file (JSON) with layout, dialect and logging settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Warn about directory entries that are skipped
    #[arg(long)]
    warn_ignored: bool,

    /// Also write a JSON manifest of the packed modules
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Hook policy from the command line, if either flag was given
    fn hook_override(&self) -> Option<HookPolicy> {
        match (self.set_except, self.no_except) {
            (true, _) => Some(HookPolicy::Force),
            (_, true) => Some(HookPolicy::Disable),
            _ => None,
        }
    }
}

/// JSON manifest written next to the artifact
#[derive(Serialize)]
struct Manifest<'a> {
    default_package: Option<String>,
    hook: HookPolicy,
    modules: Vec<&'a RegistryEntry>,
}

impl<'a> Manifest<'a> {
    fn new(bundle: &'a Bundle) -> Self {
        Self {
            default_package: bundle.default_package.as_ref().map(ToString::to_string),
            hook: bundle.hook,
            modules: bundle.registry.iter().collect(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let project = match &cli.config {
        Some(path) => match ProjectFile::read(path) {
            Ok(project) => project,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
        None => ProjectFile::default(),
    };

    if let Err(e) = init_logging(&cli, &project) {
        print_error(&e);
        process::exit(e.exit_code());
    }

    if let Err(e) = run(&cli, project) {
        print_error(&e);
        process::exit(e.exit_code());
    }
}

fn init_logging(cli: &Cli, project: &ProjectFile) -> Result<(), CliError> {
    let mut log_config = LogConfig::default();
    log_config.apply(&project.log);
    if let Some(level) = cli.log_level.as_deref().and_then(parse_log_level) {
        log_config.global = level;
    }

    let file = match &cli.log_file {
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| CliError::LogFile {
                    path: path.clone(),
                    source,
                })?,
        ),
        None => None,
    };

    logging::init(&log_config, cli.log_format, file);
    Ok(())
}

fn run(cli: &Cli, project: ProjectFile) -> Result<(), CliError> {
    let vfs = NativeFileSystem::new();

    let pack_config = PackConfig {
        layout: project.layout,
        dialect: project.dialect,
        tagging: cli.tag || project.tag,
        ignored: if cli.warn_ignored || project.warn_ignored {
            IgnoredEntries::Warn
        } else {
            IgnoredEntries::Silent
        },
    };
    let hook = cli.hook_override().unwrap_or(project.hook);

    let roots: Vec<PathBuf> = cli.packages.iter().map(|root| normalize_root(root)).collect();

    let mut packer = Packer::new(&vfs)
        .with_config(pack_config)
        .with_hook(hook)
        .with_default_package(cli.default_pkg.clone());

    if let Some(path) = cli.carrier.as_ref().or(project.carrier.as_ref()) {
        packer = packer.with_carrier(load_carrier(&vfs, path)?);
    }

    let invalid = packer.invalid_roots(&roots);
    if let Some(first) = invalid.first() {
        for path in invalid.iter().skip(1) {
            print_error(&CliError::NotAPackage(path.clone()));
        }
        return Err(CliError::NotAPackage(first.clone()));
    }

    let packed = packer.pack(&roots)?;

    match &cli.outfile {
        Some(path) => {
            vfs.write_file(path, packed.text.as_bytes())
                .map_err(|source| CliError::Write {
                    path: path.clone(),
                    source,
                })?;
            info!(target: "modpack::cli", path = %path.display(), "Wrote artifact");
        }
        None => print!("{}", packed.text),
    }

    if let Some(path) = &cli.manifest {
        let json = serde_json::to_string_pretty(&Manifest::new(&packed.bundle))
            .map_err(CliError::Manifest)?;
        vfs.write_file(path, json.as_bytes())
            .map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(target: "modpack::cli", path = %path.display(), "Wrote manifest");
    }

    Ok(())
}

/// Roots like `.` or `..` have no name of their own; resolve them first
fn normalize_root(root: &Path) -> PathBuf {
    if root.file_name().is_some() {
        return root.to_path_buf();
    }
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

fn load_carrier(vfs: &dyn VirtualFileSystem, path: &Path) -> Result<Carrier, CliError> {
    let template = vfs
        .read_to_string(path)
        .map_err(|source| CliError::CarrierRead {
            path: path.to_path_buf(),
            source,
        })?;
    Carrier::parse(&template).map_err(|source| CliError::CarrierParse {
        path: path.to_path_buf(),
        source,
    })
}
