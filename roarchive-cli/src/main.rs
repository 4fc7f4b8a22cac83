use std::path::PathBuf;

use roarchive::OpenOptions;
use structopt::clap::AppSettings::*;
use structopt::StructOpt;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "list", visible_alias = "l", about = "List files of an archive")]
    List {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Directory, tarball, zip archive or HTTP URL"
        )]
        path: PathBuf,
    },

    #[structopt(name = "cat", about = "Write a file of an archive to standard output")]
    Cat {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Directory, tarball, zip archive or HTTP URL"
        )]
        path: PathBuf,

        #[structopt(name = "file", help = "Path of the file, relative to the archive root")]
        file: String,

        #[structopt(long, help = "Decompress the file with gunzip")]
        gunzip: bool,
    },

    #[structopt(name = "find", about = "Find the first file with a given name")]
    Find {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Directory, tarball, zip archive or HTTP URL"
        )]
        path: PathBuf,

        #[structopt(name = "name", help = "File name to look for")]
        name: String,
    },

    #[structopt(name = "info", about = "Show how an archive was opened")]
    Info {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Directory, tarball, zip archive or HTTP URL"
        )]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "roarchive",
    about = "Read files from directories, tarballs, zip archives and HTTP trees.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(
        long,
        number_of_values = 1,
        global = true,
        help = "File marking the archive root; repeat to give fallbacks in priority order"
    )]
    hint: Vec<String>,

    #[structopt(long, global = true, help = "Content type to use instead of sniffing")]
    mime: Option<String>,

    #[structopt(
        long,
        global = true,
        help = "Examine at most this many files while looking for the hint"
    )]
    limit: Option<usize>,

    #[structopt(subcommand)]
    cmd: Commands,
}

impl CliOpts {
    fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new().hint(self.hint.clone());
        if let Some(limit) = self.limit {
            options = options.scan_limit(limit);
        }
        if let Some(mime) = &self.mime {
            options = options.mime(mime.as_str());
        }
        options
    }
}

fn main() -> anyhow::Result<()> {
    let opts = CliOpts::from_args();

    let level = if opts.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let options = opts.open_options();
    tracing::debug!(?options, "parsed options");

    match opts.cmd {
        Commands::List { path } => commands::list(path, options)?,
        Commands::Cat { path, file, gunzip } => commands::cat(path, file, gunzip, options)?,
        Commands::Find { path, name } => commands::find(path, name, options)?,
        Commands::Info { path } => commands::info(path, options)?,
    }

    Ok(())
}
