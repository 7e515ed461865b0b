/// promptc CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promptc_compiler::{generate, synthesize, write_files, Compiler, ScriptFormatter, SourceFormatter, VariantRegistry};
use promptc_ir::{load_prompts, load_schema_file, DEFAULT_PATTERN};

#[derive(Parser, Debug)]
#[command(name = "promptc")]
#[command(about = "Prompt compiler - turns prompt documents into TypeScript and JavaScript modules")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile every matching prompt document into OUT
    Compile {
        /// Output directory for generated files
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// Output dialect (see `promptc languages`)
        #[arg(short, long, default_value = "typescript")]
        language: String,

        /// Glob matching prompt documents, relative to --dir
        #[arg(short = 'm', long = "match", value_name = "GLOB", default_value = DEFAULT_PATTERN)]
        pattern: String,

        /// Directory searched for prompt documents
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Directory holding `templates/typescript`
        #[arg(long, value_name = "DIR")]
        package_root: Option<PathBuf>,
    },

    /// List the available output dialects
    Languages,

    /// Print the validator generated for a standalone schema file
    SchemaCheck {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, default_value = "typescript")]
        language: String,

        /// Binding name, defaults to `{fileStem}Schema`
        #[arg(long)]
        name: Option<String>,
    },
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let registry = VariantRegistry::builtin();

    match command {
        Command::Compile {
            out,
            language,
            pattern,
            dir,
            package_root,
        } => {
            let profile = registry.get(&language).ok_or_else(|| {
                anyhow!(
                    "language '{}' is not supported (expected one of: {})",
                    language,
                    registry.names().collect::<Vec<_>>().join(", ")
                )
            })?;
            let package_root = package_root.unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));

            let prompts = load_prompts(&dir, &pattern)
                .with_context(|| format!("loading prompts from {}", dir.display()))?
                .into_iter()
                .map(|p| p.prompt)
                .collect::<Vec<_>>();

            let files = Compiler::new()
                .compile(&prompts, profile, &package_root)
                .with_context(|| format!("compiling for '{}'", language))?;
            let written = write_files(&out, &files)?;

            tracing::info!(dir = %out.display(), language = %language, files = written.len(), "compiled prompts");
        }
        Command::Languages => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Command::SchemaCheck { file, language, name } => {
            let profile = registry
                .get(&language)
                .ok_or_else(|| anyhow!("language '{}' is not supported", language))?;
            let schema = load_schema_file(&file)?;
            let binding = name.unwrap_or_else(|| default_binding(&file));

            let fragment = generate(&schema, &binding, profile)?;
            let formatted = ScriptFormatter::default()
                .format(&fragment.source)
                .with_context(|| format!("formatting validator for {}", file.display()))?;
            print!("{}", formatted);
        }
    }
    Ok(())
}

fn default_binding(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().replace(['-', '_', '.'], " "))
        .unwrap_or_default();
    format!("{}Schema", synthesize(&stem).camel)
}
