use clap::Parser;
use colored::Colorize;
use oembed_resolver::{
    log_resolution_card, setup_logging, LogConfig, OembedResolver, Resolution, StaticRegistry,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve URLs to oEmbed or bookmark previews.
#[derive(Parser, Debug)]
#[command(name = "resolve_cli")]
struct Args {
    /// URLs to resolve
    #[arg(required = true)]
    urls: Vec<String>,

    /// Request a specific type ("bookmark" for metadata only)
    #[arg(short = 't', long = "type")]
    kind: Option<String>,

    /// Provider registry in providers.json format
    #[arg(short, long, default_value = "demos/providers.json")]
    providers: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log level for the tracing subscriber
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(LogConfig {
        log_level: args.log_level.clone(),
        ..Default::default()
    })?;

    let registry = StaticRegistry::from_json(&std::fs::read_to_string(&args.providers)?)?;
    println!(
        "{} {} providers from {}",
        "Loaded".green(),
        registry.len(),
        args.providers.display()
    );

    let resolver = OembedResolver::new(Arc::new(registry))?;

    for url in &args.urls {
        match resolver.resolve_str(url, args.kind.as_deref()).await {
            Ok(resolution) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&resolution)?);
                    continue;
                }

                log_resolution_card(&resolution, url);
                println!("\n{} {}", resolution.type_name().bold().blue(), url);
                match resolution {
                    Resolution::Embed(data) => {
                        if let Some(title) = data.title {
                            println!("{}: {}", "Title".bold(), title);
                        }
                        if let Some(provider) = data.provider_name {
                            println!("{}: {}", "Provider".bold(), provider);
                        }
                        if let Some(html) = data.html {
                            println!("{}: {}", "HTML".bold(), html);
                        }
                    }
                    Resolution::Bookmark(bookmark) => {
                        let metadata = bookmark.metadata;
                        if let Some(title) = metadata.title {
                            println!("{}: {}", "Title".bold(), title);
                        }
                        if let Some(description) = metadata.description {
                            println!("{}: {}", "Description".bold(), description);
                        }
                        if let Some(thumbnail) = metadata.thumbnail {
                            println!("{}: {}", "Thumbnail".bold(), thumbnail);
                        }
                    }
                }
            }
            Err(e) => eprintln!("{}: {} - {}", "Error".bold().red(), url, e),
        }
    }

    Ok(())
}
