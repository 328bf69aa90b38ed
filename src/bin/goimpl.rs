//! `goimpl` binary.
//!
//! Run with: `goimpl [OPTIONS] <RECV> <IFACE>`

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use goimpl::{Config, GoEnv, StubBody};

const AFTER_HELP: &str = "\
Examples:
  goimpl 'f *File' io.ReadWriteCloser
  goimpl 'Murmur' hash.Hash
  goimpl -d ./internal/store 's *Store' Getter
  goimpl 's *Set[T]' 'example.com/coll.Container[T]'

Packages are found the way the go tool finds them: the destination
directory and its vendor directories, the main module (go.mod replace and
require directives), GOROOT and GOPATH. A handful of standard interfaces
resolve without any Go installation.";

#[derive(Parser)]
#[command(name = "goimpl")]
#[command(about = "Generate method stubs that implement a Go interface")]
#[command(version, after_help = AFTER_HELP)]
struct Cli {
    /// Receiver of the generated methods, e.g. 'f *File'
    #[arg(value_name = "RECV")]
    recv: String,

    /// Interface to implement, e.g. io.Reader or example.com/pkg.Store[int]
    #[arg(value_name = "IFACE")]
    iface: String,

    /// Directory of the package the stubs are written into
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Use panic("not implemented") bodies instead of zero-value returns
    #[arg(long)]
    panic: bool,

    /// Print the stubs without an import block
    #[arg(long)]
    no_imports: bool,

    /// Log package resolution to stderr
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, env = "GOROOT", value_name = "DIR", hide_env_values = true)]
    goroot: Option<PathBuf>,

    #[arg(long, env = "GOPATH", value_name = "PATHS", hide_env_values = true)]
    gopath: Option<String>,

    #[arg(long, env = "GOMODCACHE", value_name = "DIR", hide_env_values = true)]
    gomodcache: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut env = GoEnv::from_env();
        if let Some(root) = &self.goroot {
            env.goroot = Some(root.clone());
        }
        if let Some(paths) = &self.gopath {
            env.gopath = std::env::split_paths(paths).collect();
        }
        if let Some(cache) = &self.gomodcache {
            env.gomodcache = Some(cache.clone());
        }
        Config {
            src_dir: self.dir.clone(),
            body: if self.panic {
                StubBody::Panic
            } else {
                StubBody::ZeroReturn
            },
            env,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "goimpl=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GOIMPL_LOG").unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();

    if goimpl_parser::parse_receiver(&cli.recv).is_err() {
        eprintln!("invalid receiver: {:?}", cli.recv);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config();
    let generated = goimpl::generate(&cli.recv, &cli.iface, &config)
        .with_context(|| format!("implementing {} on {:?}", cli.iface, cli.recv))?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(generated.to_source(!cli.no_imports).as_bytes())
        .context("writing stubs")?;
    Ok(())
}
