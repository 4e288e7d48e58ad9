//! Logging Infrastructure
//!
//! Structured logging for the ledger:
//! - console output on stderr (stdout is reserved for reports)
//! - daily rotating application logs, deleted after 14 days
//! - permanent audit logs for ledger mutations (target `audit`)

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Days an application log file is kept
const APP_LOG_RETENTION_DAYS: i64 = 14;

type BaseSubscriber = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<BaseSubscriber> + Send + Sync>;

/// Delete application log files older than the retention window
///
/// Audit logs are never touched.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // app.YYYY-MM-DD (tracing-appender daily naming)
        if let Some(date_part) = name.strip_prefix("app.")
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(removed)
}

fn file_layers(dir: &Path, json_format: bool) -> anyhow::Result<Vec<BoxedLayer>> {
    let app_log_dir = dir.join("app");
    let audit_log_dir = dir.join("audit");
    fs::create_dir_all(&app_log_dir)?;
    fs::create_dir_all(&audit_log_dir)?;

    let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
    let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "audit");

    let not_audit = tracing_subscriber::filter::filter_fn(|meta| meta.target() != "audit");
    let only_audit = tracing_subscriber::filter::filter_fn(|meta| meta.target() == "audit");

    let layers: Vec<BoxedLayer> = if json_format {
        vec![
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(not_audit)
                .boxed(),
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(audit_log))
                .with_filter(only_audit)
                .boxed(),
        ]
    } else {
        vec![
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(not_audit)
                .boxed(),
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(audit_log))
                .with_filter(only_audit)
                .boxed(),
        ]
    };

    Ok(layers)
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug"); `RUST_LOG` wins when set
/// * `json_format` - JSON output (production) instead of plain text
/// * `log_dir` - Optional directory for rotating file logs
///
/// # Examples
/// ```no_run
/// // Development setup (console only)
/// ledger_core::logger::init_logger("debug", false, None)?;
///
/// // Production setup (console + files)
/// ledger_core::logger::init_logger("info", true, Some("./data/logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console: BoxedLayer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed()
    };
    layers.push(console);

    if let Some(dir) = log_dir {
        let dir = Path::new(dir);
        layers.extend(file_layers(dir, json_format)?);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()?;
        cleanup_old_logs(dir)?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()?;
    }

    Ok(())
}

/// Audit log helper - records ledger mutations
///
/// Audit entries go to `audit/audit.YYYY-MM-DD` and are never deleted.
///
/// # Examples
/// ```no_run
/// ledger_core::audit_log!("delete", "sale:42");
/// ledger_core::audit_log!("record", "payment:7", "1190.00 on sale:42");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($action:expr, $resource:expr) => {
        tracing::info!(
            target: "audit",
            action = $action,
            resource = %$resource,
            "AUDIT"
        );
    };
    ($action:expr, $resource:expr, $details:expr) => {
        tracing::info!(
            target: "audit",
            action = $action,
            resource = %$resource,
            details = %$details,
            "AUDIT"
        );
    };
}
