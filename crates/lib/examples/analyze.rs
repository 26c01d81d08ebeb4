use moodmap::{
    providers::factory::{create_provider, ProviderSettings},
    Analyzer, Article, ArticleAnalyzer,
};
use dotenvy::dotenv;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging and load .env file
    tracing_subscriber::fmt::init();
    dotenv().ok();

    // --- Command-line argument parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} '<title>' ['<content>']", args[0]);
        eprintln!();
        eprintln!(
            "Example: {} 'Changi Airport welcomes record visitors' 'Passenger numbers hit a new high.'",
            args[0]
        );
        return Ok(());
    }

    // --- Configuration from environment variables ---
    let settings = ProviderSettings {
        provider: env::var("AI_PROVIDER")
            .unwrap_or_else(|_| "gemini".to_string())
            .parse()?,
        api_url: env::var("AI_API_URL").ok(),
        api_key: env::var("AI_API_KEY").ok(),
        model: env::var("AI_MODEL").ok(),
    };

    // --- Analyze ---
    let analyzer = Analyzer::new(create_provider(&settings)?);
    let article = Article::new(args[1].clone(), "example")
        .with_content(args.get(2).cloned().unwrap_or_default());

    let analysis = analyzer.analyze(&article).await?;
    println!("{}", serde_json::to_string_pretty(&analysis.record)?);
    println!(
        "Tokens: {} in, {} out",
        analysis.usage.prompt_tokens, analysis.usage.output_tokens
    );

    Ok(())
}
