use mandi_core::config::{AppConfig, LoadOptions};
use serde_json::json;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return json!({
                "command": "config",
                "status": "error",
                "error_class": "config_validation",
                "message": format!("configuration issue: {error}"),
            })
            .to_string();
        }
    };

    let payload = json!({
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "recommender": {
            "base_url": config.recommender.base_url,
            "api_key": config.recommender.api_key.as_ref().map(|_| "[redacted]"),
            "timeout_secs": config.recommender.timeout_secs,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
            "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
        },
        "discovery": {
            "similar_in_stock_only": config.discovery.similar_in_stock_only,
        },
        "logging": {
            "level": config.logging.level,
            "format": format!("{:?}", config.logging.format).to_lowercase(),
        },
    });

    serde_json::to_string_pretty(&payload)
        .unwrap_or_else(|error| format!("failed to render config: {error}"))
}
