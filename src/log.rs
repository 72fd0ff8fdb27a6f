use std::time::Duration;

use clap::Parser;

/// Send one activity log to the James OS dashboard.
///
/// Best-effort by design: when the dashboard is not running the send is
/// dropped silently, so callers are never blocked on its availability.
#[derive(Debug, Parser)]
#[command(name = "jamesos-log")]
struct Cli {
    /// info, working, success, warn, error, llm-request, llm-response,
    /// tool-call, file-op
    level: String,

    /// system, task, file, command, api, build, llm, user-request, tool,
    /// response
    category: String,

    /// Human-readable message.
    message: String,

    /// Optional elaboration, joined with spaces.
    details: Vec<String>,

    /// Dashboard host.
    #[arg(long, env = "HOST", default_value = "localhost")]
    host: String,

    /// Dashboard port.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let details = (!cli.details.is_empty()).then(|| cli.details.join(" "));
    let body = serde_json::json!({
        "level": cli.level,
        "category": cli.category,
        "message": cli.message,
        "details": details,
    });

    let url = format!("http://{}:{}/api/logs", cli.host, cli.port);
    let client = reqwest::Client::new();

    match client
        .post(&url)
        .timeout(Duration::from_secs(5))
        .json(&body)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => println!("log sent: {}", cli.message),
        Ok(resp) => eprintln!("failed to send log: {}", resp.status()),
        // Dashboard not running; drop the log.
        Err(_) => {}
    }
}
