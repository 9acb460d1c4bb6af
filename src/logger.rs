//! One-line summaries of remote calls with configurable verbosity.
//!
//! Supports three verbosity levels:
//! - Minimal: nginx-style single line
//! - Compact: request and response arrows
//! - Verbose: framed block with service and timing

use crate::config::LogVerbosity;
use regex::Regex;
use std::sync::OnceLock;

/// Summary of one completed (or failed) remote call.
#[derive(Debug, Clone)]
pub struct CallRecord<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub url: &'a str,
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    pub elapsed_ms: u64,
}

fn api_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(apiKey=)[^&]*").expect("valid regex"))
}

/// Replace the `apiKey` query value so keys never reach the log.
pub fn redact_url(url: &str) -> String {
    api_key_pattern().replace_all(url, "${1}***").into_owned()
}

/// Format duration in human-readable form.
fn format_duration(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

/// Extract path and query from URL.
fn extract_path(url: &str) -> &str {
    url.find("://")
        .and_then(|i| url[i + 3..].find('/').map(|j| &url[i + 3 + j..]))
        .unwrap_or(url)
}

/// Format a call record for log output.
pub fn format_call(call: &CallRecord<'_>, verbosity: LogVerbosity) -> String {
    let url = redact_url(call.url);
    let path = extract_path(&url);
    let duration = format_duration(call.elapsed_ms);
    let status = call
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "---".to_string());

    match verbosity {
        LogVerbosity::Minimal => format!("{} {} {} {}", call.method, path, status, duration),
        LogVerbosity::Compact => {
            let outcome = match call.status {
                Some(s) if (200..300).contains(&s) => "OK",
                Some(_) => "ERROR",
                None => "FAILED",
            };
            format!(
                "→ {} {} [{}]\n← {} {} ({})",
                call.method, path, call.service, status, outcome, duration
            )
        }
        LogVerbosity::Verbose => {
            let separator = "────────────────────────────────────────";
            format!(
                "{separator}\n\
                 {method} {url}\n\
                 Service: {service}\n\
                 Status: {status}\n\
                 Timing: {duration} total\n\
                 {separator}",
                separator = separator,
                method = call.method,
                url = url,
                service = call.service,
                status = status,
                duration = duration
            )
        }
    }
}

/// Emit a call record through `tracing`.
pub fn log_call(call: &CallRecord<'_>, verbosity: LogVerbosity) {
    let line = format_call(call, verbosity);
    match call.status {
        Some(s) if (200..300).contains(&s) => tracing::info!("{}", line),
        _ => tracing::warn!("{}", line),
    }
}
