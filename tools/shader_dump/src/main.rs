use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};

use bsshader_dump::{dump_shader, validate, Catalogue, DumpConfig, ReportError, ShaderInstance};

#[derive(Debug, Parser)]
#[command(name = "shader_dump")]
#[command(about = "Reconstruct BSShader constant buffers and dump shader bytecode")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a report and the raw bytecode for each shader descriptor.
    Dump {
        /// Catalogue JSON mapping constant slots to groups and types.
        #[arg(long)]
        catalogue: PathBuf,

        /// Output root (default: $SHADER_DUMP_DIR or `ShaderDump`).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Placeholder marker closing every name table.
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        sentinel: Option<String>,

        /// Shader instance descriptors (JSON).
        #[arg(required = true)]
        descriptors: Vec<PathBuf>,
    },
    /// Check the catalogue for duplicate or invalid rows.
    Validate {
        #[arg(long)]
        catalogue: PathBuf,

        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        sentinel: Option<String>,
    },
}

fn load_catalogue(path: &Path, sentinel: Option<&str>) -> Result<Catalogue> {
    let mut catalogue = Catalogue::load(path)
        .with_context(|| format!("load catalogue {}", path.display()))?;
    if let Some(sentinel) = sentinel {
        catalogue.set_sentinel(sentinel);
    }
    Ok(catalogue)
}

fn run_dump(
    mut config: DumpConfig,
    catalogue: &Path,
    out: Option<PathBuf>,
    sentinel: Option<String>,
    descriptors: &[PathBuf],
) -> Result<()> {
    if let Some(out) = out {
        config.output_root = out;
    }
    if sentinel.is_some() {
        config.sentinel = sentinel;
    }
    let catalogue = load_catalogue(catalogue, None)?;

    let mut dumped = 0usize;
    let mut skipped = 0usize;
    for path in descriptors {
        let shader = ShaderInstance::load_descriptor(path)
            .with_context(|| format!("load shader descriptor {}", path.display()))?;

        match dump_shader(&catalogue, &shader, &config) {
            Ok(paths) => {
                println!("dumped: {}", paths.report.display());
                dumped += 1;
            }
            Err(ReportError::Format(err)) => {
                tracing::warn!(descriptor = %path.display(), "skipping shader: {err}");
                skipped += 1;
            }
            Err(err) => {
                let collision = err.is_collision();
                let err = anyhow::Error::new(err)
                    .context(format!("dump shader {}", path.display()));
                if collision {
                    return Err(err.context("technique collision, aborting run"));
                }
                return Err(err);
            }
        }
    }

    println!("summary: dumped {dumped} shader(s), skipped {skipped}");
    Ok(())
}

fn run_validate(config: DumpConfig, catalogue: &Path, sentinel: Option<String>) -> Result<()> {
    let sentinel = sentinel.or(config.sentinel);
    let catalogue = load_catalogue(catalogue, sentinel.as_deref())?;

    let defects = validate(&catalogue);
    for defect in &defects {
        println!("{defect}");
    }
    println!(
        "summary: {} defect(s) in {} row(s)",
        defects.len(),
        catalogue.entries().len()
    );

    if !defects.is_empty() {
        bail!("catalogue validation failed");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = DumpConfig::from_env().context("invalid environment configuration")?;

    match cli.command {
        Commands::Dump {
            catalogue,
            out,
            sentinel,
            descriptors,
        } => run_dump(config, &catalogue, out, sentinel, &descriptors),
        Commands::Validate {
            catalogue,
            sentinel,
        } => run_validate(config, &catalogue, sentinel),
    }
}
