use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ar_rs::{Archive, ArchiveReader, ArchiveWriter, LocalFile, MemberOptions};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ar-rs", about = "Create, list and extract Unix ar archives.", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(visible_alias = "c", about = "Create a new archive from local files")]
    Create(CreateArgs),

    #[command(visible_aliases = ["t", "ls"], about = "List members of an archive")]
    List(ListArgs),

    #[command(visible_alias = "x", about = "Extract members from an archive")]
    Extract(ExtractArgs),

    #[command(visible_alias = "p", about = "Write a member's contents to stdout")]
    Print(PrintArgs),
}

#[derive(Debug, clap::Args)]
struct CreateArgs {
    /// Output archive path
    archive: PathBuf,

    /// Files to add, stored under their base names
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Overwrite the archive if it already exists
    #[arg(short, long)]
    force: bool,

    /// Store zero timestamps and owners, and the default mode
    #[arg(short = 'D', long)]
    deterministic: bool,

    /// Override the mode of every member (decimal)
    #[arg(long)]
    mode: Option<u32>,

    /// Override the owner uid of every member
    #[arg(long)]
    uid: Option<u32>,

    /// Override the owner gid of every member
    #[arg(long)]
    gid: Option<u32>,

    /// Override the modification time of every member (seconds since epoch)
    #[arg(long)]
    mtime: Option<u64>,
}

#[derive(Debug, clap::Args)]
struct ListArgs {
    /// Archive to list
    archive: PathBuf,

    /// Show mode, owner, size and modification time
    #[arg(short, long)]
    verbose: bool,

    /// Print the directory as JSON
    #[arg(long, conflicts_with = "verbose")]
    json: bool,
}

#[derive(Debug, clap::Args)]
struct ExtractArgs {
    /// Archive to extract from
    archive: PathBuf,

    /// Members to extract (default: all)
    members: Vec<String>,

    /// Directory to extract into
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,
}

#[derive(Debug, clap::Args)]
struct PrintArgs {
    /// Archive to read
    archive: PathBuf,

    /// Member to print
    member: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create(args) => create(args),
        Commands::List(args) => list(args),
        Commands::Extract(args) => extract(args),
        Commands::Print(args) => print(args),
    }
}

fn create(args: CreateArgs) -> Result<()> {
    let mut writer = ArchiveWriter::create(&args.archive, args.force)
        .with_context(|| format!("Failed to create {}", args.archive.display()))?;

    for path in &args.files {
        let mut local = LocalFile::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        local.options = override_options(&args, local.options);

        writer
            .add_with(&local.name, &local.data, &local.options)
            .with_context(|| format!("Failed to add {}", path.display()))?;
    }

    writer.finish()?;
    Ok(())
}

fn override_options(args: &CreateArgs, options: MemberOptions) -> MemberOptions {
    let mut options = if args.deterministic {
        MemberOptions::deterministic()
    } else {
        options
    };
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if let Some(uid) = args.uid {
        options.uid = uid;
    }
    if let Some(gid) = args.gid {
        options.gid = gid;
    }
    if args.mtime.is_some() {
        options.mtime = args.mtime;
    }
    options
}

fn list(args: ListArgs) -> Result<()> {
    let mut archive = open(&args.archive)?;
    let directory = archive
        .list()
        .with_context(|| format!("Failed to read {}", args.archive.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.json {
        let entries: Vec<_> = directory.iter().collect();
        serde_json::to_writer_pretty(&mut out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for entry in directory {
        if args.verbose {
            let meta = &entry.meta;
            writeln!(
                out,
                "{:>8} {:>6}/{:<6} {:>10} {:>12} {}",
                meta.mode, meta.uid, meta.gid, meta.size, meta.mtime, meta.name
            )?;
        } else {
            writeln!(out, "{}", entry.name())?;
        }
    }
    Ok(())
}

fn extract(args: ExtractArgs) -> Result<()> {
    let mut reader = ArchiveReader::open(&args.archive)
        .with_context(|| format!("Failed to open {}", args.archive.display()))?;

    if args.members.is_empty() {
        let written = reader
            .extract_all(&args.directory)
            .with_context(|| format!("Failed to extract {}", args.archive.display()))?;
        tracing::info!("extracted {} members", written.len());
        return Ok(());
    }

    std::fs::create_dir_all(&args.directory)?;
    for member in &args.members {
        reader
            .extract(member, &args.directory)
            .with_context(|| format!("Failed to extract {}", member))?;
    }
    Ok(())
}

fn print(args: PrintArgs) -> Result<()> {
    let mut reader = ArchiveReader::open(&args.archive)
        .with_context(|| format!("Failed to open {}", args.archive.display()))?;

    if !reader.contains(&args.member)? {
        bail!("{}: no member named {:?}", args.archive.display(), args.member);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    reader.copy_to(&args.member, &mut out)?;
    out.flush()?;
    Ok(())
}

fn open(path: &Path) -> Result<Archive> {
    Archive::open(path).with_context(|| format!("Failed to open {}", path.display()))
}
