use blog_trickle::config::{self, Credentials, SiteConfig};
use blog_trickle::output;
use blog_trickle::publish::{self, Paths};
use blog_trickle::rewrite::{GeminiGenerator, TextGenerator};
use blog_trickle::select::SelectMode;
use blog_trickle::source::BloggerSource;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blog-trickle")]
#[command(about = "Incremental static publisher for Blogger posts")]
#[command(long_about = "\
Incremental static publisher for Blogger posts

Each run fetches the blog, picks the newest post that has not been published
yet, censors it, paraphrases its opening passage, and regenerates a static
site from every post published so far.

State between runs lives in the state directory:

  .state/
  ├── posts_cache.json             # Every post seen so far (+ derived text)
  └── published_posts.json         # Ids already on the site

Credentials are read from the environment:
  BLOGGER_API_KEY, BLOGGER_BLOG_ID, GEMINI_API_KEY

Run 'blog-trickle gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults when absent)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory (overrides paths.output_dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// State directory (overrides paths.state_dir)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, publish the next post and regenerate the site (default)
    Publish {
        /// Publish every unpublished post instead of only the newest
        #[arg(long)]
        all: bool,
    },
    /// Regenerate the site from saved state, without fetching
    Render,
    /// Show published count and the queue of unpublished posts
    Status,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!(error = %err, "run failed");
        return Err(err);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.unwrap_or(Command::Publish { all: false });
    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.config)?;
    let paths = resolve_paths(&site_config, cli.output, cli.state_dir);

    match command {
        Command::Publish { all } => {
            let credentials = Credentials::from_env()?;
            let source = BloggerSource::new(&credentials, &site_config.source)?;
            let generator = build_generator(&credentials, &site_config);
            let mode = if all { SelectMode::All } else { SelectMode::One };

            info!(blog = %credentials.blog_id, ?mode, "starting publish run");
            let report = publish::publish(
                Some(&source),
                generator.as_ref().map(|g| g as &dyn TextGenerator),
                &site_config,
                &paths,
                mode,
            )?;
            output::print_publish_report(&report);
        }
        Command::Render => {
            let summary = publish::render(&site_config, &paths)?;
            println!("{}", output::format_render_summary(&summary));
        }
        Command::Status => {
            output::print_status(&publish::status(&paths));
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// A client construction failure only disables rewriting for this run.
fn build_generator(credentials: &Credentials, config: &SiteConfig) -> Option<GeminiGenerator> {
    if !config.rewrite.enabled {
        return None;
    }
    match GeminiGenerator::new(&credentials.gemini_api_key, &config.rewrite) {
        Ok(generator) => Some(generator),
        Err(err) => {
            warn!(error = %err, "cannot build rewrite client, publishing without rewrite");
            None
        }
    }
}

fn resolve_paths(
    config: &SiteConfig,
    output: Option<PathBuf>,
    state_dir: Option<PathBuf>,
) -> Paths {
    let mut paths = Paths::from_config(config);
    if let Some(output) = output {
        paths.output_dir = output;
    }
    if let Some(state_dir) = state_dir {
        paths.state_dir = state_dir;
    }
    paths
}
