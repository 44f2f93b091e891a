//! Rendering of command results.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use mpconsole_core::api::articles::Article;
use mpconsole_core::api::configs::ConfigEntry;
use mpconsole_core::api::message_tasks::MessageTask;
use mpconsole_core::api::subscriptions::Subscription;
use mpconsole_core::api::user::UserInfo;
use mpconsole_core::api::Listing;
use mpconsole_core::Navigation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON, or with `text` otherwise.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

pub fn user(user: &UserInfo) {
    println!("Username: {}", user.username);
    if let Some(nickname) = &user.nickname {
        println!("  Nickname: {}", nickname);
    }
    if let Some(email) = &user.email {
        println!("  Email: {}", email);
    }
    if let Some(role) = &user.role {
        println!("  Role: {}", role);
    }
    if !user.permissions.is_empty() {
        println!("  Permissions: {}", user.permissions.join(", "));
    }
}

pub fn articles(listing: &Listing<Article>) {
    if listing.is_empty() {
        println!("No articles");
        return;
    }
    for article in &listing.items {
        println!(
            "{:>6}  {}  [{}]",
            article.id,
            article.title,
            article.account_name.as_deref().unwrap_or("-")
        );
    }
    footer(listing);
}

pub fn subscriptions(subscriptions: &Vec<Subscription>) {
    if subscriptions.is_empty() {
        println!("No subscriptions");
        return;
    }
    for sub in subscriptions {
        println!(
            "{:>6}  {}  {}",
            sub.id,
            sub.name,
            sub.status.as_deref().unwrap_or("")
        );
    }
}

pub fn configs(listing: &Listing<ConfigEntry>) {
    if listing.is_empty() {
        println!("No config entries");
        return;
    }
    for entry in &listing.items {
        println!("{} = {}", entry.config_key, entry.config_value);
        if let Some(description) = &entry.description {
            println!("    {}", description);
        }
    }
    footer(listing);
}

pub fn tasks(listing: &Listing<MessageTask>) {
    if listing.is_empty() {
        println!("No message tasks");
        return;
    }
    for task in &listing.items {
        let state = if task.is_enabled() { "enabled" } else { "disabled" };
        println!("{}  {}  {}", task.id, state, task.web_hook_url);
    }
    footer(listing);
}

pub fn navigation(navigation: &Navigation) {
    match navigation {
        Navigation::Entered { route, location } => {
            println!("Entered {} ({})", location, route.name)
        }
        Navigation::Redirected(intent) => println!("Redirected to {}", intent.location()),
        Navigation::Forbidden { route } => {
            println!("Forbidden: {} needs one of [{}]", route.name, route.permissions.join(", "))
        }
        Navigation::Ignored => println!("Navigation superseded"),
    }
}

fn footer<T>(listing: &Listing<T>) {
    if let Some(total) = listing.total {
        println!("({} of {})", listing.len(), total);
    }
}
