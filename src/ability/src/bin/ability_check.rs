//! # Ability Check
//!
//! Evaluates requested permissions against a granted set read from a
//! JSON policy file and prints one `ALLOW`/`DENY` line per request.
//!
//! ```text
//! ability-check policy.json
//! ```
//!
//! ```json
//! {
//!   "granted": ["org:123:user:read", { "permissions": ["post:update"], "scope": "org:123" }],
//!   "requests": ["org:123:app:1:user:read", "user:delete"],
//!   "context": { "authorId": "u1" }
//! }
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG` - Log level (default: info)

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use cretoai_ability::{flatten_permissions, Ability, FlattenOptions, PermissionItem};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Policy file contents
#[derive(Debug, Deserialize)]
struct PolicyFile {
    granted: Vec<PermissionItem>,
    #[serde(default)]
    requests: Vec<PermissionItem>,
    #[serde(default)]
    context: Option<Value>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: ability-check <policy.json>");
    };

    check(&path, &mut std::io::stdout().lock())
}

/// Evaluate the policy file at `path`, writing one verdict line per request
fn check(path: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let policy: PolicyFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(
        "ability-check v{}: {} granted, {} requested",
        cretoai_ability::VERSION,
        policy.granted.len(),
        policy.requests.len()
    );

    let ability = Ability::new(policy.granted).context("invalid granted permissions")?;
    let requests = flatten_permissions(&policy.requests, &FlattenOptions::default())
        .context("invalid requested permissions")?;

    for request in &requests {
        let verdict = if ability.test(request, policy.context.as_ref()) {
            "ALLOW"
        } else {
            "DENY"
        };
        writeln!(out, "{verdict} {request}")?;
    }

    Ok(())
}
