//! CLI arguments, TOML overrides loading, and the frozen settings the
//! server runs with.

use std::path::PathBuf;

use auris_core::config::{RecommendationConfig, RecommendationConfigOverrides};
use auris_core::session::SessionConfig;
use clap::Parser;

/// Command-line surface for the server binary.
#[derive(Parser, Debug)]
#[command(name = "auris-server")]
#[command(author = "Auris Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP server for the personalized 'For You' recommendation engine")]
pub struct ServerArgs {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// JSON array of `Episode` records to load as the in-memory catalog.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// `{ episode_id: [f64; N] }` JSON map of precomputed embeddings.
    #[arg(long)]
    pub embeddings: Option<PathBuf>,

    /// Optional TOML file deserializing to `RecommendationConfigOverrides`,
    /// merged onto the documented defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ranking-algorithm strategy version, folded into the embedding
    /// namespace.
    #[arg(long, default_value = "1")]
    pub strategy_version: String,

    /// Dataset version, folded into the embedding namespace.
    #[arg(long, default_value = "default")]
    pub dataset_version: String,

    /// `RUST_LOG`-style filter directive; falls back to `info` when unset.
    #[arg(long)]
    pub log_level: Option<String>,

    /// `json` (the default, suited to log aggregation) or `pretty` for
    /// local dev.
    #[arg(long, default_value = "json")]
    pub log_format: String,
}

/// Everything the server needs once CLI parsing and config loading are
/// done: the frozen ranking config, the session-orchestrator knobs, and
/// where to load the reference dataset/embeddings from.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub dataset: Option<PathBuf>,
    pub embeddings: Option<PathBuf>,
    pub recommendation_config: RecommendationConfig,
    pub session_config: SessionConfig,
    pub log_level: Option<String>,
    pub log_format: String,
}

/// Parse CLI args, optionally load a TOML overrides file, and produce a
/// validated, frozen [`ServerSettings`].
pub fn load(args: ServerArgs) -> anyhow::Result<ServerSettings> {
    let overrides = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
            toml::from_str::<RecommendationConfigOverrides>(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config file {}: {e}", path.display()))?
        }
        None => RecommendationConfigOverrides::default(),
    };

    let recommendation_config = RecommendationConfig::with_overrides(&overrides)
        .map_err(|e| anyhow::anyhow!("invalid recommendation config: {e}"))?;

    let mut session_config = SessionConfig::default();
    session_config.strategy_version = args.strategy_version;
    session_config.dataset_version = args.dataset_version;

    Ok(ServerSettings {
        bind: args.bind,
        dataset: args.dataset,
        embeddings: args.embeddings,
        recommendation_config,
        session_config,
        log_level: args.log_level,
        log_format: args.log_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_with_no_overrides_file() {
        let args = ServerArgs {
            bind: "127.0.0.1:8080".to_string(),
            dataset: None,
            embeddings: None,
            config: None,
            strategy_version: "1".to_string(),
            dataset_version: "default".to_string(),
            log_level: None,
            log_format: "json".to_string(),
        };
        let settings = load(args).unwrap();
        assert_eq!(settings.session_config.strategy_version, "1");
    }

    #[test]
    fn malformed_toml_overrides_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.toml");
        std::fs::write(&path, "not valid toml = [[[").unwrap();

        let args = ServerArgs {
            bind: "127.0.0.1:8080".to_string(),
            dataset: None,
            embeddings: None,
            config: Some(path),
            strategy_version: "1".to_string(),
            dataset_version: "default".to_string(),
            log_level: None,
            log_format: "json".to_string(),
        };
        assert!(load(args).is_err());
    }
}
