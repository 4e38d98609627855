use mandi_core::config::{AppConfig, LoadOptions};
use mandi_db::connect_with_settings;
use mandi_recs::HttpRecommendationClient;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

impl DoctorCheck {
    fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, status: "ok", detail: detail.into() }
    }

    fn failed(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, status: "failed", detail: detail.into() }
    }
}

pub fn run(json: bool) -> String {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::ok("config", "configuration loaded and validated"));
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck::failed("config", format!("configuration issue: {error}")));
            None
        }
    };

    if let Some(config) = config {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(async {
                match connect_with_settings(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.timeout_secs,
                )
                .await
                {
                    Ok(pool) => {
                        match sqlx_ping(&pool).await {
                            Ok(()) => checks.push(DoctorCheck::ok(
                                "database",
                                format!("connected to {}", config.database.url),
                            )),
                            Err(error) => checks.push(DoctorCheck::failed(
                                "database",
                                format!("database query failed: {error}"),
                            )),
                        }
                        pool.close().await;
                    }
                    Err(error) => checks.push(DoctorCheck::failed(
                        "database",
                        format!("database connection failed: {error}"),
                    )),
                }

                match HttpRecommendationClient::from_config(&config.recommender) {
                    Ok(client) => match client.probe_health().await {
                        Ok(()) => checks.push(DoctorCheck::ok(
                            "recommendation_delegate",
                            format!("delegate healthy at {}", config.recommender.base_url),
                        )),
                        Err(error) => checks.push(DoctorCheck::failed(
                            "recommendation_delegate",
                            error.to_string(),
                        )),
                    },
                    Err(error) => checks
                        .push(DoctorCheck::failed("recommendation_delegate", error.to_string())),
                }
            }),
            Err(error) => {
                checks.push(DoctorCheck::failed(
                    "runtime",
                    format!("failed to initialize async runtime: {error}"),
                ));
            }
        }
    }

    render(&checks, json)
}

async fn sqlx_ping(pool: &mandi_db::DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await.map(|_| ())
}

fn render(checks: &[DoctorCheck], json: bool) -> String {
    if json {
        let healthy = checks.iter().all(|check| check.status == "ok");
        return serde_json::json!({
            "command": "doctor",
            "status": if healthy { "ok" } else { "degraded" },
            "checks": checks,
        })
        .to_string();
    }

    let mut lines = Vec::with_capacity(checks.len() + 1);
    for check in checks {
        let marker = if check.status == "ok" { "✓" } else { "✗" };
        lines.push(format!("{marker} {}: {}", check.name, check.detail));
    }
    let healthy = checks.iter().all(|check| check.status == "ok");
    lines.push(if healthy {
        "all checks passed".to_string()
    } else {
        "one or more checks failed".to_string()
    });
    lines.join("\n")
}
