//! Interactive chat loop

use std::io::{self, Write};

use colored::Colorize;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use treehole_chat::{Applied, CardsClient, ChatSession, MoodTag, StreamEvent};

pub async fn run(session: &mut ChatSession, cards: Option<&CardsClient>) -> anyhow::Result<()> {
    println!(
        "{}",
        "Treehole — type your thoughts, /help for commands.".bold()
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut pending_mood: Option<MoodTag> = None;

    loop {
        print!("{} ", ">".cyan());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/help" => print_help(),
            "/new" => {
                session.reset();
                pending_mood = None;
                println!("{}", "Started a new conversation.".green());
            }
            cmd if cmd.starts_with("/mood") => {
                pending_mood = parse_mood(cmd.trim_start_matches("/mood").trim());
                match pending_mood {
                    Some(mood) => {
                        println!("Next message tagged {}", mood.to_string().yellow())
                    }
                    None => println!(
                        "{}",
                        "Usage: /mood happy|sad|angry|confused|excited|calm".red()
                    ),
                }
            }
            cmd if cmd.starts_with("/cards") => {
                show_cards(cards, cmd.trim_start_matches("/cards").trim()).await;
            }
            cmd if cmd.starts_with('/') => {
                println!("{} {}", "Unknown command:".red(), cmd);
            }
            _ => {
                stream_reply(session, input, pending_mood.take()).await;
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!("  /new          Start a new conversation");
    println!("  /mood <tag>   Tag the next message with an emotion");
    println!("  /cards [n|q]  Show the card feed (page number or search query)");
    println!("  /quit         Exit");
}

async fn stream_reply(session: &mut ChatSession, text: &str, mood: Option<MoodTag>) {
    let Some((ticket, mut stream)) = session.send_message(text, mood) else {
        return;
    };

    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                if let StreamEvent::Delta(delta) = &event {
                    print!("{delta}");
                    let _ = io::stdout().flush();
                }
                if session.apply(&ticket, &event) == Applied::Stale {
                    break;
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Reply stream failed");
                println!();
                eprintln!("{} {}", "Error:".red(), err);
                break;
            }
        }
    }
    session.finish_reply(&ticket);
    println!();
}

async fn show_cards(cards: Option<&CardsClient>, arg: &str) {
    let Some(client) = cards else {
        println!(
            "{}",
            "No card feed configured (set default.cards_url in the config file).".red()
        );
        return;
    };

    let result = if arg.is_empty() {
        client.fetch_cards(1).await
    } else if let Ok(page) = arg.parse::<u32>() {
        client.fetch_cards(page).await
    } else {
        client.search_cards(arg).await
    };

    match result {
        Ok(page) => {
            if page.cards.is_empty() {
                println!("No cards.");
                return;
            }
            for card in &page.cards {
                println!("{} {}", format!("#{}", card.card_id).cyan(), card.content);
                if !card.tags.is_empty() {
                    println!("   {}", card.tags.join(", ").dimmed());
                }
            }
            println!(
                "{}",
                format!(
                    "page {}/{} ({} cards)",
                    page.current_page, page.pages, page.total
                )
                .dimmed()
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "Card feed request failed");
            eprintln!("{} {}", "Error:".red(), err);
        }
    }
}

fn parse_mood(value: &str) -> Option<MoodTag> {
    match value {
        "happy" => Some(MoodTag::Happy),
        "sad" => Some(MoodTag::Sad),
        "angry" => Some(MoodTag::Angry),
        "confused" => Some(MoodTag::Confused),
        "excited" => Some(MoodTag::Excited),
        "calm" => Some(MoodTag::Calm),
        _ => None,
    }
}
