//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::auth::Verification;
use crate::config::LogConfig;
use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Audit record for one authentication verdict
#[derive(Serialize)]
pub struct AuthLogEvent<'a> {
    pub ts: String,
    pub level: &'a str,
    pub target: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> AuthLogEvent<'a> {
    pub fn verdict(v: &'a Verification) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            level: if v.authenticated { "INFO" } else { "WARN" },
            target: "cbhs::auth",
            message: "verification",
            uid: Some(&v.user),
            anomaly_score: Some(v.anomaly_score),
            authenticated: Some(v.authenticated),
            threshold: Some(v.threshold),
            risk_level: Some(v.risk_level.as_str()),
            error: None,
        }
    }

    pub fn failure(uid: Option<&'a str>, error: &'a str) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            level: "ERROR",
            target: "cbhs::auth",
            message: "verification failed",
            uid,
            anomaly_score: None,
            authenticated: None,
            threshold: None,
            risk_level: None,
            error: Some(error),
        }
    }
}

/// Process-wide tracing setup plus the audit-line writer
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber on stdout. `RUST_LOG` overrides `config.level`.
    /// Returns `false` when a subscriber was already installed.
    pub fn init(config: &LogConfig) -> bool {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
        let registry = tracing_subscriber::registry().with(filter);
        let installed = if config.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::NONE)
                        .with_writer(std::io::stdout),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init()
        };
        installed.is_ok()
    }

    /// Write `event` as one ndjson line, bypassing the tracing filter so audit
    /// records survive any log level.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> Result<()> {
        serde_json::to_writer(&mut *w, event)?;
        writeln!(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{RiskLevel, ScoreSource};
    use uuid::Uuid;

    #[test]
    fn verdict_line_is_one_json_object() {
        let v = Verification {
            id: Uuid::new_v4(),
            authenticated: false,
            anomaly_score: 0.9,
            threshold: 0.5,
            user: "zoe".into(),
            attempt: 3,
            risk_level: RiskLevel::High,
            source: ScoreSource::Global,
        };
        let mut buf = Vec::new();
        StructuredLogger::emit_json(&AuthLogEvent::verdict(&v), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        let line: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(line["level"], "WARN");
        assert_eq!(line["uid"], "zoe");
        assert_eq!(line["risk_level"], "high");
        assert!(line.get("error").is_none());
    }

    #[test]
    fn failure_line_omits_score_fields() {
        let mut buf = Vec::new();
        StructuredLogger::emit_json(&AuthLogEvent::failure(None, "boom"), &mut buf).unwrap();
        let line: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(line["error"], "boom");
        assert!(line.get("anomaly_score").is_none());
        assert!(line.get("uid").is_none());
    }
}
