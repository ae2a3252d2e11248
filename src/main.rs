//! Armrest command line: manage the dashboard's bookmarks, theme and daily feed.
//!
//! Every subcommand goes through the same dispatcher as the JSON-RPC server and
//! prints the result as pretty JSON.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::error;
use serde_json::{json, Value};

use armrest::app::App;
use armrest::platform;
use armrest::rpc_handler::handle_method;

#[derive(Parser, Debug)]
#[command(name = "armrest", version, about = "New-tab dashboard data manager", long_about = None)]
struct Cli {
    /// Directory holding the storage database (defaults to ARMREST_DATA_DIR or the platform data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path of the settings file.
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole bookmark document.
    List,
    /// Search bookmark names, URLs and descriptions.
    Search { query: String },
    /// Add a folder.
    AddFolder {
        name: String,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a folder and its bookmarks.
    DeleteFolder { id: String },
    /// Add a bookmark to a folder.
    Add {
        folder_id: String,
        name: String,
        url: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a bookmark.
    Delete { folder_id: String, id: String },
    /// Move a bookmark to another folder.
    Move { from: String, to: String, id: String },
    /// Reorder a folder; every bookmark id must be listed exactly once.
    Reorder { folder_id: String, ids: Vec<String> },
    /// Write the bookmark document to a file.
    Export {
        /// Output path (defaults to armrest-bookmarks-YYYY-MM-DD.json).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load bookmarks from an exported file.
    Import {
        file: PathBuf,
        /// Merge into the current bookmarks instead of replacing them.
        #[arg(long)]
        merge: bool,
    },
    /// Reset bookmarks to the default folders.
    Clear,
    /// Show or change the theme mode (light, dark, system).
    Theme { mode: Option<String> },
    /// Set the background color of the effective theme variant.
    Background { color: String },
    /// Current weather.
    Weather {
        #[arg(long)]
        city: Option<String>,
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
    },
    /// Quote of the day.
    Quote,
    /// Drop cached weather and quote data.
    ClearCache,
    /// City name for a coordinate pair.
    Geocode {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },
    /// Title, favicon and logo of a website.
    SiteInfo { url: String },
}

/// Maps a subcommand onto an RPC method and its params.
fn to_request(command: &Command) -> Result<(&'static str, Value), String> {
    let request = match command {
        Command::List => ("bookmarks.get", json!({})),
        Command::Search { query } => ("bookmarks.search", json!({"query": query})),
        Command::AddFolder { name, icon, color } => {
            ("folder.add", json!({"name": name, "icon": icon, "color": color}))
        }
        Command::DeleteFolder { id } => ("folder.delete", json!({"id": id})),
        Command::Add { folder_id, name, url, description } => (
            "bookmark.add",
            json!({"folderId": folder_id, "name": name, "url": url, "description": description}),
        ),
        Command::Delete { folder_id, id } => ("bookmark.delete", json!({"folderId": folder_id, "id": id})),
        Command::Move { from, to, id } => (
            "bookmark.move",
            json!({"fromFolderId": from, "toFolderId": to, "id": id}),
        ),
        Command::Reorder { folder_id, ids } => ("bookmark.reorder", json!({"folderId": folder_id, "ids": ids})),
        Command::Export { .. } => ("bookmarks.export", json!({})),
        Command::Import { file, merge } => {
            let data = fs::read_to_string(file)
                .map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
            ("bookmarks.import", json!({"json": data, "merge": merge}))
        }
        Command::Clear => ("bookmarks.clear", json!({})),
        Command::Theme { mode: Some(mode) } => ("theme.set", json!({"mode": mode.to_ascii_lowercase()})),
        Command::Theme { mode: None } => ("theme.get", json!({})),
        Command::Background { color } => ("theme.setColor", json!({"color": color})),
        Command::Weather { city, latitude, longitude } => (
            "daily.weather",
            json!({"city": city, "latitude": latitude, "longitude": longitude}),
        ),
        Command::Quote => ("daily.quote", json!({})),
        Command::ClearCache => ("daily.clear", json!({})),
        Command::Geocode { latitude, longitude } => {
            ("geo.city", json!({"latitude": latitude, "longitude": longitude}))
        }
        Command::SiteInfo { url } => ("website.info", json!({"url": url})),
    };
    Ok(request)
}

async fn run(cli: Cli) -> Result<(), String> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(platform::get_data_dir);
    let app = App::new(&data_dir, cli.settings.clone()).map_err(|e| e.to_string())?;
    app.startup();

    let (method, params) = to_request(&cli.command)?;
    let result = handle_method(&app, method, &params).await?;

    if let Command::Export { out } = &cli.command {
        let json = result.get("json").and_then(Value::as_str).unwrap_or("{}");
        let path = match out {
            Some(p) => p.clone(),
            None => PathBuf::from(result.get("fileName").and_then(Value::as_str).unwrap_or("armrest-bookmarks.json")),
        };
        fs::write(&path, json).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
        println!("exported to {}", path.display());
        return Ok(());
    }

    let pretty = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
    println!("{}", pretty);
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("armrest: {}", e);
        std::process::exit(1);
    }
}
