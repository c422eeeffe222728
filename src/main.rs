use cachebust::{config, feed, fingerprint, output, pipeline};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cachebust")]
#[command(about = "Fingerprint static site assets and rewrite their references")]
#[command(long_about = "\
Fingerprint static site assets and rewrite their references

The source tree is copied to the output directory, then every asset in the
configured category directories is renamed to include a hash of its content
and every HTML and CSS reference to it is updated.

Default layout:

  src_site/
  ├── index.html                   # Reference file: attributes and inline styles
  ├── blog/post/index.html         # Reference files are found at any depth
  └── assets/
      ├── images/logo.png          # → logo.9f8e7d6c.png (hashed first)
      ├── css/style.css            # → style.a1b2c3d4.css (url() rewritten, then hashed)
      └── js/slideshow.js          # → slideshow.0badc0de.js

Only direct children of a category directory are fingerprinted. A missing
category directory is skipped.

Run 'cachebust gen-config' to generate a documented cachebust.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults apply when it does not exist)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Rendered site to fingerprint (overrides config)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory, cleared on every build (overrides config)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Clear the output, copy the source into it, and fingerprint (default)
    Build,
    /// Survey the source tree without writing anything
    Check,
    /// Print a stock cachebust.toml with all options documented
    GenConfig,
    /// Prepare an HTML fragment for inclusion in a feed
    Feed {
        /// HTML fragment to prepare
        input: PathBuf,

        /// Absolute site URL that site-relative links are resolved against
        #[arg(long)]
        base_url: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let config = resolve_config(&cli.config, cli.source, cli.output)?;

            println!(
                "==> Building {} \u{2192} {} ({}, {} chars)",
                config.source.display(),
                config.output.display(),
                config.fingerprint.algorithm,
                config.fingerprint.length
            );
            let summary = pipeline::build(&config)?;
            output::print_build_output(&summary);

            if config.print_tree {
                println!("==> Output");
                output::print_tree(&config.output)?;
            }
            println!("==> Build complete: {}", config.output.display());
        }
        Command::Check => {
            let config = resolve_config(&cli.config, cli.source, cli.output)?;
            if !config.source.is_dir() {
                return Err(pipeline::BuildError::SourceMissing(config.source).into());
            }
            println!("==> Checking {}", config.source.display());
            let surveys = fingerprint::survey_tree(&config.source, &config)?;
            output::print_survey(&surveys);
            println!("==> Nothing was modified");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Feed { input, base_url } => {
            let content = std::fs::read_to_string(&input)?;
            let prepared = feed::prepare_feed_content(&content, &base_url);
            if let feed::Tier::Fallback { reason } = &prepared.tier {
                eprintln!(
                    "note: {} is not well-formed ({reason}); used regex fallback",
                    input.display()
                );
            }
            print!("{}", prepared.html);
        }
    }

    Ok(())
}

/// Load the config file and apply command-line directory overrides.
///
/// Validation runs again after overrides so `--output` cannot equal the
/// configured source.
fn resolve_config(
    path: &std::path::Path,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<config::BuildConfig, config::ConfigError> {
    let mut config = config::load_config(path)?;
    if let Some(source) = source {
        config.source = source;
    }
    if let Some(output) = output {
        config.output = output;
    }
    config.validate()?;
    Ok(config)
}
