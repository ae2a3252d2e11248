//! Armrest RPC Server: JSON-RPC over stdin/stdout for the dashboard front end.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"folderId":"...","name":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ready",...} at start, {"event":"theme.changed","config":{...}} on theme writes.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{error, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use armrest::app::App;
use armrest::platform;
use armrest::rpc_handler::handle_method;
use armrest::services::theme_engine::ThemeEngineTrait;
use armrest::types::theme::ThemeConfig;

#[derive(Parser, Debug)]
#[command(name = "armrest-rpc", version, about = "Armrest dashboard JSON-RPC server")]
struct Args {
    /// Directory holding the storage database (defaults to ARMREST_DATA_DIR or the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path of the settings file.
    #[arg(long)]
    settings: Option<String>,

    /// Maximum requests accepted per second.
    #[arg(long, default_value_t = 200)]
    max_rps: u32,
}

/// Fixed one-second window request cap.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// Writes one line to stdout. Responses and pushed events share this path.
fn emit(message: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if writeln!(out, "{}", message).and_then(|_| out.flush()).is_err() {
        error!("stdout closed, dropping message");
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(platform::get_data_dir);

    let app = match App::new(&data_dir, args.settings) {
        Ok(app) => app,
        Err(e) => {
            error!("failed to initialize Armrest: {}", e);
            std::process::exit(1);
        }
    };
    app.startup();

    let subscription = app.theme_engine.subscribe_to_theme_changes(Box::new(|config: ThemeConfig| {
        emit(&json!({"event": "theme.changed", "config": config}));
    }));

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    info!("armrest-rpc ready, data dir {}", data_dir.display());

    let mut rate_limiter = RateLimiter::new(args.max_rps);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            emit(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);
    }

    subscription.unsubscribe();
    info!("stdin closed, shutting down");
}
