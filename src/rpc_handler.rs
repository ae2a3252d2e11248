//! RPC method handler for the Armrest JSON-RPC protocol.
//!
//! Kept separate from `rpc_server.rs` so every method can be unit-tested
//! without the stdin/stdout loop.

use chrono::Local;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_manager::{export_file_name, BookmarkManagerTrait};
use crate::services::daily_cache::DailyCacheTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::theme_engine::ThemeEngineTrait;
use crate::services::website_info::WebsiteInfoTrait;
use crate::types::bookmark::{BookmarkPatch, FolderPatch, NewBookmark, ICON_OPTIONS};
use crate::types::theme::{ThemeConfigPatch, ThemeMode};

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn f64_param(params: &Value, key: &str) -> Result<f64, String> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| format!("missing {}", key))
}

fn from_params<T: DeserializeOwned>(params: &Value) -> Result<T, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {}", e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// City for weather requests: explicit `city`, else geocoded `latitude`/`longitude`,
/// else the configured default city.
async fn weather_city(app: &App, params: &Value) -> String {
    let explicit = opt_str(params, "city");
    let coordinates = match (params.get("latitude"), params.get("longitude")) {
        (Some(lat), Some(lon)) => lat.as_f64().zip(lon.as_f64()),
        _ => None,
    };
    if explicit.is_none() && coordinates.is_none() {
        return app.settings().weather.default_city;
    }
    app.geo_service.resolve_city(explicit, coordinates).await
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Bookmarks ───
        "bookmarks.get" => to_json(&app.bookmarks.get_bookmarks().map_err(|e| e.to_string())?),
        "bookmarks.search" => {
            let query = opt_str(params, "query").unwrap_or("");
            let hits = app.bookmarks.search_bookmarks(query).map_err(|e| e.to_string())?;
            to_json(&hits)
        }
        "bookmarks.export" => {
            let json = app.bookmarks.export_bookmarks().map_err(|e| e.to_string())?;
            Ok(json!({"fileName": export_file_name(Local::now().date_naive()), "json": json}))
        }
        "bookmarks.import" => {
            let data = str_param(params, "json")?;
            let merge = params.get("merge").and_then(|v| v.as_bool()).unwrap_or(false);
            to_json(&app.bookmarks.import_bookmarks(data, merge).map_err(|e| e.to_string())?)
        }
        "bookmarks.clear" => to_json(&app.bookmarks.clear_all_bookmarks().map_err(|e| e.to_string())?),

        // ─── Folders ───
        "folder.add" => {
            let name = str_param(params, "name")?;
            let state = app
                .bookmarks
                .add_folder(name, opt_str(params, "icon"), opt_str(params, "color"))
                .map_err(|e| e.to_string())?;
            to_json(&state)
        }
        "folder.update" => {
            let id = str_param(params, "id")?;
            let patch: FolderPatch = from_params(params)?;
            to_json(&app.bookmarks.update_folder(id, patch).map_err(|e| e.to_string())?)
        }
        "folder.delete" => {
            let id = str_param(params, "id")?;
            to_json(&app.bookmarks.delete_folder(id).map_err(|e| e.to_string())?)
        }
        "folder.icons" => to_json(&ICON_OPTIONS),

        // ─── Bookmark ───
        "bookmark.add" => {
            let folder_id = str_param(params, "folderId")?;
            let data: NewBookmark = from_params(params)?;
            if data.name.trim().is_empty() || data.url.trim().is_empty() {
                return Err("bookmark name and url are required".to_string());
            }
            to_json(&app.bookmarks.add_bookmark(folder_id, data).map_err(|e| e.to_string())?)
        }
        "bookmark.update" => {
            let folder_id = str_param(params, "folderId")?;
            let id = str_param(params, "id")?;
            let patch: BookmarkPatch = from_params(params)?;
            to_json(&app.bookmarks.update_bookmark(folder_id, id, patch).map_err(|e| e.to_string())?)
        }
        "bookmark.delete" => {
            let folder_id = str_param(params, "folderId")?;
            let id = str_param(params, "id")?;
            to_json(&app.bookmarks.delete_bookmark(folder_id, id).map_err(|e| e.to_string())?)
        }
        "bookmark.move" => {
            let from = str_param(params, "fromFolderId")?;
            let to = str_param(params, "toFolderId")?;
            let id = str_param(params, "id")?;
            to_json(&app.bookmarks.move_bookmark(from, to, id).map_err(|e| e.to_string())?)
        }
        "bookmark.reorder" => {
            let folder_id = str_param(params, "folderId")?;
            let ids: Vec<String> = params
                .get("ids")
                .cloned()
                .ok_or("missing ids")
                .and_then(|v| serde_json::from_value(v).map_err(|_| "ids must be a list of strings"))?;
            to_json(&app.bookmarks.reorder_bookmarks(folder_id, &ids).map_err(|e| e.to_string())?)
        }

        // ─── Theme ───
        "theme.get" => to_json(&app.theme_engine.get_theme_config()),
        "theme.set" => {
            let patch: ThemeConfigPatch = from_params(params)?;
            let config = app.theme_engine.set_theme_config(patch).map_err(|e| e.to_string())?;
            app.theme_engine.apply_theme(config.mode);
            to_json(&config)
        }
        "theme.background" => to_json(&app.theme_engine.get_current_background()),
        "theme.setColor" => {
            let color = str_param(params, "color")?;
            to_json(&app.theme_engine.set_background_color(color).map_err(|e| e.to_string())?)
        }
        "theme.setImage" => {
            let image = opt_str(params, "image").unwrap_or("");
            to_json(&app.theme_engine.set_background_image(image).map_err(|e| e.to_string())?)
        }
        "theme.apply" => {
            let mode = match opt_str(params, "mode") {
                Some(m) => m.parse::<ThemeMode>()?,
                None => app.theme_engine.get_theme_config().mode,
            };
            let dark = app.theme_engine.apply_theme(mode);
            Ok(json!({"dark": dark}))
        }
        "theme.css" => to_json(&app.theme_engine.css_variables()),

        // ─── Daily ───
        "daily.weather" => {
            let city = weather_city(app, params).await;
            to_json(&app.daily_cache.get_weather(&city).await)
        }
        "daily.quote" => to_json(&app.daily_cache.get_daily_quote().await),
        "daily.all" => {
            let city = weather_city(app, params).await;
            to_json(&app.daily_cache.get_all_daily_data(&city).await)
        }
        "daily.refresh" => {
            let city = weather_city(app, params).await;
            to_json(&app.daily_cache.refresh_daily_data(&city).await)
        }
        "daily.clear" => {
            app.daily_cache.clear_daily_cache().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "daily.status" => to_json(&app.daily_cache.get_daily_data_status()),

        // ─── Geo ───
        "geo.city" => {
            let lat = f64_param(params, "latitude")?;
            let lon = f64_param(params, "longitude")?;
            let city = app
                .geo_service
                .city_name_by_coordinates(lat, lon)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"city": city}))
        }

        // ─── Website ───
        "website.info" => {
            let url = str_param(params, "url")?;
            to_json(&app.website_info.fetch_website_info(url).await)
        }
        "website.infoSimple" => {
            let url = str_param(params, "url")?;
            to_json(&app.website_info.fetch_website_info_simple(url).await)
        }

        // ─── Settings ───
        "settings.get" => to_json(&app.settings()),
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut engine = app.settings_engine()?;
            engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            let mut engine = app.settings_engine()?;
            engine.reset().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
