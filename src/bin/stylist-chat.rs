use anyhow::Context;
use clap::Parser;
use stylist_stream::types::{Message, ProfileUpdate, UserProfile};
use stylist_stream::{Client, Config, TurnOutcome, TurnRejected};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Chat with the stylist agent from a terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Agent base URL, overrides STYLIST_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// User the conversation belongs to, overrides STYLIST_USER_ID
    #[arg(long)]
    user_id: Option<String>,

    /// Use the non-streaming endpoint for every turn
    #[arg(long)]
    unstreamed: bool,
}

const HELP: &str = "commands: /pick N, /profile, /name NAME, /analyze TEXT, /upload PATH, /help, /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut builder = Config::from_env()?.into_builder();
    if let Some(base_url) = &args.base_url {
        builder = builder.with_base_url(base_url);
    }
    if let Some(user_id) = &args.user_id {
        builder = builder.with_user_id(user_id);
    }
    let client = stylist_stream::connect_with_config(builder.build())
        .context("building the agent client")?;

    println!(
        "stylist-chat, thread {} ({})",
        client.thread().thread_id(),
        HELP
    );

    let mut status = client.status();
    tokio::spawn(async move {
        let mut last = None;
        while status.changed().await.is_ok() {
            let thinking = status.borrow_and_update().thinking().map(str::to_string);
            if thinking != last {
                if let Some(line) = &thinking {
                    println!("  ... {}", line);
                }
                last = thinking;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{}", HELP);
                continue;
            }
            "/profile" => {
                match client.refresh_profile().await {
                    Ok(profile) => print_profile(&profile),
                    Err(e) => println!("could not load profile: {}", e),
                }
                continue;
            }
            "/name" => {
                let update = ProfileUpdate::new().with_name(rest);
                if update.is_empty() {
                    println!("usage: /name NAME");
                    continue;
                }
                match client.update_profile(update).await {
                    Ok(profile) => print_profile(&profile),
                    Err(e) => println!("could not update profile: {}", e),
                }
                continue;
            }
            "/upload" => {
                let image = match tokio::fs::read(rest).await {
                    Ok(image) => image,
                    Err(e) => {
                        println!("could not read {}: {}", rest, e);
                        continue;
                    }
                };
                let file_name = std::path::Path::new(rest)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("portrait.jpg");
                match client.upload_portrait(image, file_name).await {
                    Ok(profile) => print_profile(&profile),
                    Err(e) => println!("could not analyze portrait: {}", e),
                }
                continue;
            }
            "/analyze" => client.submit_turn_unstreamed(rest, vec![]).await,
            "/pick" => {
                let picked = rest.parse::<usize>().ok().and_then(|n| {
                    client
                        .latest_clarification()
                        .and_then(|c| c.options().get(n.checked_sub(1)?).cloned())
                });
                match picked {
                    Some(option) => client.select_clarification(&option).await,
                    None => {
                        println!("no such option");
                        continue;
                    }
                }
            }
            _ if args.unstreamed => client.submit_turn_unstreamed(line, vec![]).await,
            _ => client.submit_turn(line, vec![]).await,
        };

        report(&client, outcome);
    }

    Ok(())
}

fn report(client: &Client, outcome: TurnOutcome) {
    match outcome {
        TurnOutcome::Completed(id) | TurnOutcome::Failed(id) => {
            let transcript = client.transcript();
            if let Some(message) = transcript.iter().find(|message| message.id() == id) {
                print_message(message);
            }
        }
        TurnOutcome::Ended => println!("(the stylist went quiet, try again)"),
        TurnOutcome::Rejected(TurnRejected::Busy) => println!("(still working on the last one)"),
        TurnOutcome::Rejected(TurnRejected::Empty) => {}
    }
}

fn print_message(message: &Message) {
    println!("stylist> {}", message.text());

    if let Some(payload) = message.payload() {
        for product in payload.products() {
            let price = product
                .price()
                .and_then(|price| price.display())
                .unwrap_or_default();
            let title = product.title().unwrap_or("(untitled)");
            match product.brand() {
                Some(brand) => println!("  - {} by {} {}", title, brand, price),
                None => println!("  - {} {}", title, price),
            }
        }
        for outfit in payload.outfits() {
            if let Some(label) = outfit.label() {
                println!("  * {}: {}", label, outfit.items().join(", "));
            }
        }
    }

    if let Some(summary) = message.summary().filter(|summary| !summary.is_empty()) {
        if !summary.colors().is_empty() {
            println!("  colors: {}", summary.colors().join(", "));
        }
        if !summary.occasions().is_empty() {
            println!("  occasions: {}", summary.occasions().join(", "));
        }
    }

    if let Some(clarification) = message.clarification() {
        if let Some(question) = clarification.question() {
            println!("  {}", question);
        }
        for (n, option) in clarification.options().iter().enumerate() {
            let label = option.label().or(option.id()).unwrap_or("?");
            match option.short_description() {
                Some(description) => println!("  {}. {} ({})", n + 1, label, description),
                None => println!("  {}. {}", n + 1, label),
            }
        }
        println!("  reply with /pick N");
    }
}

fn print_profile(profile: &UserProfile) {
    if profile.is_empty() {
        println!("profile: (empty)");
        return;
    }
    let fields = [
        ("name", &profile.name),
        ("gender", &profile.gender),
        ("age group", &profile.age_group),
        ("skin tone", &profile.skin_tone),
        ("undertone", &profile.undertone),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    if !profile.palettes.is_empty() {
        println!("  palettes: {}", profile.palettes.join(", "));
    }
    if !profile.vibes.is_empty() {
        println!("  vibes: {}", profile.vibes.join(", "));
    }
}
