use clap::{Arg, Command};
use listing_i18n::{
    CompletionService, Config, LanguageCode, ListingPipeline, MockCompletion, MockMode,
    OpenAiProvider, TranslateListingRequest, build_prompt, normalize_language_str,
};
use std::path::Path;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("listing-i18n")
        .version("0.1.0")
        .about("Detect and translate a marketplace listing into all supported languages")
        .arg(
            Arg::new("request")
                .help("Path to a translate-listing request JSON file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a JSON configuration file"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .value_name("SOURCE_LANGUAGE")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("en")
                .help("Use the mock completion service: --mock[=SOURCE_LANGUAGE] (default: en)"),
        )
        .arg(
            Arg::new("prompt-only")
                .long("prompt-only")
                .short('p')
                .help("Print the completion payload without calling any service")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show detailed translation process")
                .action(clap::ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let verbose = matches.get_flag("verbose");
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.parse()?),
        )
        .init();

    let request_path = matches
        .get_one::<String>("request")
        .ok_or("missing request path")?;
    let config = Config::load(
        matches.get_one::<String>("config").map(Path::new),
        |name| std::env::var(name).ok(),
    )?;

    let body = std::fs::read(request_path)?;
    let request = TranslateListingRequest::from_slice(&body)?;

    // 1. Select translatable fields
    let original = ListingPipeline::original_fields(&request)?;
    if verbose {
        eprintln!("📝 Title: \"{}\"", original.title);
        eprintln!("📦 {} structured field(s)", original.structured_text.len());
        for (key, text) in &original.structured_text {
            eprintln!("   {} = \"{}\"", key, text);
        }
    }

    // 2. Prompt only
    if matches.get_flag("prompt-only") {
        println!("{}", serde_json::to_string_pretty(&build_prompt(&original))?);
        return Ok(());
    }

    // 3. Translate and build the record
    let completion: Arc<dyn CompletionService> = match matches.get_one::<String>("mock") {
        Some(lang) => {
            let detected: LanguageCode = normalize_language_str(lang)
                .ok_or_else(|| format!("Unsupported mock language: {}", lang))?;
            Arc::new(MockCompletion::new(MockMode::Suffix(detected)))
        }
        None => {
            if !config.has_api_key() {
                eprintln!("❌ OPENAI_API_KEY environment variable not set");
                eprintln!("   Set it with: export OPENAI_API_KEY=your_api_key");
                eprintln!("   Or use --mock to use the mock completion service");
                return Err("Missing API key".into());
            }
            Arc::new(OpenAiProvider::new(&config.completion())?)
        }
    };

    if verbose {
        eprintln!("🌍 Provider: {}", completion.provider_name());
    }

    let pipeline = ListingPipeline::new(completion).with_timeout(config.completion_timeout());
    let record = pipeline.preview(&request).await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
