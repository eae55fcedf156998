//! Interactive terminal surface.
//!
//! The presentation layer holds a `SessionManager` and re-renders from
//! its in-memory state after every operation; it never reaches into
//! internals.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::adapters::config::Settings;
use crate::adapters::extract::FileExtractors;
use crate::adapters::llm::providers::google::GoogleBackend;
use crate::adapters::storage::KvStore;
use crate::core::session::SessionManager;
use crate::core::types::{Message, Sender, UserProfile};

const HELP: &str = "\
Commands:
  /new                      start a new conversation
  /list                     list saved conversations
  /open <id>                load a saved conversation
  /delete                   delete the current conversation
  /attach <path> [prompt]   send a file (image or PDF) with an optional instruction
  /profile                  show the stored profile
  /delete-profile           remove the stored profile
  /wipe                     delete all conversations and the profile
  /help                     show this help
  /quit                     exit
Anything else is sent to the assistant.";

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load_global();
    let api_key = settings
        .resolved_api_key()
        .ok_or("no API key configured; set GEMINI_API_KEY or add google_api_key to ~/.vita/config.toml")?;

    let data_dir = settings.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let store = KvStore::open(&data_dir.join("vita.db"))?;

    let extractors = FileExtractors::new();
    for tool in extractors.missing_tools().await {
        log::warn!("{tool} not found on PATH; file extraction using it will fail");
    }

    let backend = Arc::new(GoogleBackend::new(api_key, settings.chat_model()));
    let mut session = SessionManager::new(Box::new(store), backend, Some(Box::new(extractors)));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if session.profile().is_none() {
        println!("Welcome to Vita. A few quick questions to personalize your assistant");
        println!("(press Enter to skip any of them).\n");
        let profile = onboard(&mut lines).await?;
        session.set_profile(profile);
        println!();
    }

    println!("Vita health assistant. Type /help for commands.\n");

    loop {
        prompt("you> ")?;
        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().next() {
            Some("/quit") | Some("/exit") => break,
            Some("/help") => println!("{HELP}"),
            Some("/new") => {
                session.start_new_conversation();
                println!("started a new conversation");
            }
            Some("/list") => render_list(&session),
            Some("/open") => {
                let id = line.strip_prefix("/open").map(str::trim).unwrap_or("");
                if id.is_empty() {
                    println!("usage: /open <id>");
                } else if session.load_conversation(id) {
                    render_history(&session);
                } else {
                    println!("no conversation with id {id}");
                }
            }
            Some("/delete") => {
                session.delete_current_conversation();
                println!("conversation deleted");
            }
            Some("/attach") => {
                let rest = line.strip_prefix("/attach").map(str::trim).unwrap_or("");
                let mut parts = rest.splitn(2, ' ');
                match parts.next().filter(|p| !p.is_empty()) {
                    Some(path) => {
                        let instruction = parts.next().map(str::trim).filter(|i| !i.is_empty());
                        session.send_file(&PathBuf::from(path), instruction).await;
                        render_reply(&session);
                    }
                    None => println!("usage: /attach <path> [prompt]"),
                }
            }
            Some("/profile") => match session.profile() {
                Some(profile) => render_profile(profile),
                None => println!("no profile stored"),
            },
            Some("/delete-profile") => {
                session.delete_profile();
                println!("profile deleted");
            }
            Some("/wipe") => {
                session.wipe_all_data();
                println!("all stored data deleted");
            }
            Some(cmd) if cmd.starts_with('/') => {
                println!("unknown command {cmd}; try /help");
            }
            _ => {
                session.send_message(line, None).await;
                render_reply(&session);
            }
        }
    }

    Ok(())
}

fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}

/// Prints whatever the session appended after the user's own input —
/// the assistant reply or an error placeholder.
fn render_reply(session: &SessionManager) {
    if let Some(message) = session.messages().last() {
        if message.sender == Sender::Bot {
            render_message(message);
        }
    }
}

fn render_message(message: &Message) {
    let tag = match (message.sender, message.is_error()) {
        (_, true) => "vita (error)",
        (Sender::Bot, _) => "vita",
        (Sender::User, _) => "you",
    };
    println!("{tag}> {}\n", message.text);
}

fn render_history(session: &SessionManager) {
    if let Some(title) = session.title() {
        println!("— {title} —");
    }
    for message in session.messages() {
        render_message(message);
    }
}

fn render_list(session: &SessionManager) {
    let conversations = session.list_conversations();
    if conversations.is_empty() {
        println!("no saved conversations");
        return;
    }
    for record in conversations {
        println!(
            "{}  {}  ({} messages, {})",
            record.id,
            record.name,
            record.messages.len(),
            record.last_updated
        );
    }
}

fn render_profile(profile: &UserProfile) {
    let fields = [
        ("name", &profile.name),
        ("age", &profile.age),
        ("gender", &profile.gender),
        ("medical history", &profile.medical_history),
        ("current medications", &profile.current_medications),
        ("concerns", &profile.concerns),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref() {
            println!("{label}: {value}");
        }
    }
}

async fn ask(
    lines: &mut Lines<BufReader<Stdin>>,
    question: &str,
) -> Result<Option<String>, std::io::Error> {
    prompt(&format!("{question} "))?;
    let answer = lines
        .next_line()
        .await?
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty());
    Ok(answer)
}

async fn onboard(
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<UserProfile, Box<dyn std::error::Error>> {
    Ok(UserProfile {
        name: ask(lines, "What is your name?").await?,
        age: ask(lines, "What is your age?").await?,
        gender: ask(lines, "What is your gender?").await?,
        medical_history: ask(lines, "Any relevant medical history?").await?,
        current_medications: ask(lines, "Any current medications?").await?,
        concerns: ask(lines, "What are your main health concerns or goals?").await?,
        ..Default::default()
    })
}
