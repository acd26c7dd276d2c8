use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

use crate::client::{
    options::SelectorKind, transport::HttpTransport, transcript::Directive, ChatClient, ClientError, Turn,
};
use crate::config::{AppConfig, PersistenceOwner};
use crate::db::open_store;

async fn print_turn(turn: &Turn) {
    for reveal in &turn.reveals {
        if !reveal.delay.is_zero() {
            tokio::time::sleep(reveal.delay).await;
        }
        println!("\nBot> {}", reveal.message.text);
        if let Some(Directive::ShowButton { url }) = &reveal.message.directive {
            println!("\n[ Share your application: {} ]", url);
        }
    }
}

fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// Terminal rendition of the chat widget.
pub async fn run_chat(config: &AppConfig, url: String) -> Result<(), String> {
    let flow = Arc::new(config.resolve_flow().map_err(|e| e.to_string())?);
    let mut client = ChatClient::new(flow.clone(), HttpTransport::new(url.clone()));

    if flow.persistence.owner == PersistenceOwner::Client {
        match open_store(&config.store) {
            Ok(store) => client = client.with_store(store),
            Err(e) => warn!("Answers will not be stored: {}", e),
        }
    }

    println!("--- Application chat ({}) ---", flow.name);
    println!("Relay: {}", url);
    println!("Type /exit to quit.");

    let turn = client.start().await;
    print_turn(&turn).await;

    loop {
        if client.state().finished {
            break;
        }

        let turn = if let Some(selector) = client.state().selector.clone() {
            let labels = selector.labels();
            let heading = match selector.kind() {
                SelectorKind::Days => "Pick days",
                SelectorKind::Times => "Pick times",
            };
            println!("\n{} (numbers to toggle, 'c' to continue):", heading);
            for (i, label) in labels.iter().enumerate() {
                let mark = if selector.is_checked(label) { "x" } else { " " };
                println!("  {}. [{}] {}", i + 1, mark, label);
            }

            let Some(line) = read_line("You> ") else { break };
            let line = line.trim();
            if line == "/exit" || line == "/quit" {
                break;
            }
            if line == "c" || line == "continue" {
                match client.continue_selection().await {
                    Ok(turn) => turn,
                    Err(ClientError::NoSelection) => {
                        println!("Pick at least one option first.");
                        continue;
                    }
                    Err(e) => return Err(e.to_string()),
                }
            } else {
                for token in line.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
                    match token.parse::<usize>().ok().and_then(|n| labels.get(n.wrapping_sub(1))) {
                        Some(label) => {
                            if let Err(e) = client.toggle_option(label) {
                                println!("{}", e);
                            }
                        }
                        None => println!("No option '{}'.", token),
                    }
                }
                continue;
            }
        } else {
            // The buffer may hold a pre-filled prefix; typing continues after it
            let prefill = client.state().input.clone();
            let prompt = if prefill.is_empty() {
                "You> ".to_string()
            } else {
                format!("You> {}", prefill)
            };
            let Some(line) = read_line(&prompt) else { break };
            let text = line.trim();
            if text == "/exit" || text == "/quit" {
                break;
            }
            if text.is_empty() {
                continue;
            }

            let answer = if prefill.is_empty() || text.starts_with("http") {
                text.to_string()
            } else {
                format!("{}{}", prefill, text)
            };
            client.set_input(answer);
            match client.submit_input().await {
                Ok(turn) => turn,
                Err(ClientError::EmptyAnswer) => continue,
                Err(e) => return Err(e.to_string()),
            }
        };

        print_turn(&turn).await;
    }

    if let Some(id) = client.record_id() {
        println!("\nApplication saved as {}", id);
    }
    Ok(())
}
