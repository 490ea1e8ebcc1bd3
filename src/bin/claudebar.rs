use claudebar::storage::SystemKeychain;
use claudebar::{
    AuxiliaryQuota, CredentialResolver, RateWindow, UsageClient, UsageService, UsageSnapshot,
    UsageState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("claudebar=warn".parse().unwrap()),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("claudebar {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    let format = if args.iter().any(|a| a == "--json") {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    init_logging();

    let resolver = CredentialResolver::new(Box::new(SystemKeychain::new()));
    let service = UsageService::new(resolver, Box::new(UsageClient::new()));
    service.refresh().await;

    match service.current() {
        UsageState::Ready(snapshot) => render(&snapshot, format),
        UsageState::Failed(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
        UsageState::Idle => {
            eprintln!("no usage data");
            std::process::exit(1);
        }
    }
}

fn render(snapshot: &UsageSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(snapshot) {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("failed to serialize snapshot: {error}");
                std::process::exit(1);
            }
        },
        OutputFormat::Text => {
            let windows = [&snapshot.primary, &snapshot.secondary, &snapshot.tertiary];
            let mut printed = false;
            for window in windows.into_iter().flatten() {
                print_window(window);
                printed = true;
            }
            match &snapshot.auxiliary {
                Some(AuxiliaryQuota::Credits(credits)) => {
                    match credits.monthly_limit {
                        Some(limit) => {
                            println!("{:<16}{:.2} of {:.0} credits", "Extra", credits.used, limit)
                        }
                        None => println!("{:<16}{:.2} credits", "Extra", credits.used),
                    }
                    printed = true;
                }
                Some(AuxiliaryQuota::Daily(daily)) => {
                    println!(
                        "{:<16}{:.0} of {:.0} tokens",
                        "Daily tokens", daily.used_tokens, daily.token_limit
                    );
                    printed = true;
                }
                None => {}
            }
            if !printed {
                println!("no usage windows reported");
            }
        }
    }
}

fn print_window(window: &RateWindow) {
    let label = window.label.as_deref().unwrap_or("Window");
    match window.reset_description(chrono::Utc::now()) {
        Some(reset) if reset == "now" => {
            println!("{:<16}{:>6.1}%  resets now", label, window.used_percent)
        }
        Some(reset) => println!(
            "{:<16}{:>6.1}%  resets in {}",
            label, window.used_percent, reset
        ),
        None => println!("{:<16}{:>6.1}%", label, window.used_percent),
    }
}

fn print_help() {
    println!("claudebar - Claude usage quota tracker");
    println!();
    println!("Usage: claudebar [--json]");
    println!();
    println!("Options:");
    println!("  --json         Print the usage snapshot as JSON");
    println!("  -h, --help     Show this help");
    println!("  -V, --version  Show the version");
}
