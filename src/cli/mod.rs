pub mod chat;
pub mod commands;

use crate::cli::commands::{ApplicationAction, Commands};
use crate::config::AppConfig;
use crate::db::open_store;

/// Runs every command except `serve`, which `main` hands to actix-web.
pub async fn run_cli(command: Commands, config_path: String) -> Result<(), String> {
    let config = AppConfig::load(&config_path).map_err(|e| format!("Failed to load config: {}", e))?;

    match command {
        Commands::Serve => Err("serve is handled by the server entry point".to_string()),
        Commands::Chat { url } => {
            let url = url.unwrap_or_else(|| config.client.relay_url.clone());
            chat::run_chat(&config, url).await
        }
        Commands::Applications { action } => {
            let store = open_store(&config.store).map_err(|e| e.to_string())?;

            match action {
                ApplicationAction::List { limit } => {
                    let applications = store.list(limit).await.map_err(|e| e.to_string())?;
                    if applications.is_empty() {
                        println!("No applications found.");
                        return Ok(());
                    }
                    println!("{:<38} | {:<20} | {:<24} | {}", "ID", "Created At", "Name", "Contact");
                    println!("{:-<38}-+-{:-<20}-+-{:-<24}-+-{:-<24}", "", "", "", "");
                    for a in applications {
                        let created = a
                            .created_at
                            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_default();
                        let contact = a
                            .get(crate::db::Field::Email)
                            .or_else(|| a.get(crate::db::Field::Phone))
                            .unwrap_or("");
                        println!(
                            "{:<38} | {:<20} | {:<24} | {}",
                            a.id,
                            created,
                            a.get(crate::db::Field::Name).unwrap_or(""),
                            contact
                        );
                    }
                    Ok(())
                }
                ApplicationAction::Show { id } => match store.get(&id).await.map_err(|e| e.to_string())? {
                    Some(application) => {
                        let json = serde_json::to_string_pretty(&application).map_err(|e| e.to_string())?;
                        println!("{}", json);
                        Ok(())
                    }
                    None => Err(format!("Application {} not found.", id)),
                },
            }
        }
    }
}
