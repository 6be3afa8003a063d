use crate::engine::EngineConfig;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tracksift")]
#[command(about = "Alignment track windowing and downsampling server")]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "TRACKSIFT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "TRACKSIFT_PORT", default_value = "8080")]
    pub port: u16,

    /// Directory containing track files (BAM, BED, FASTA)
    #[arg(long, env = "TRACKSIFT_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Enable CORS for all origins
    #[arg(long, env = "TRACKSIFT_CORS", default_value = "true", action = ArgAction::Set)]
    pub cors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Scale factors below this return histograms instead of reads
    #[arg(long, env = "TRACKSIFT_ITEM_SCALE", default_value = "0.01")]
    pub item_scale_threshold: f64,

    /// Windows wider than this many bases always return histograms
    #[arg(long, env = "TRACKSIFT_MAX_ITEM_SPAN", default_value = "100000")]
    pub max_item_span: u64,

    /// Most histogram bins returned for one window
    #[arg(long, env = "TRACKSIFT_MAX_BINS", default_value = "10000")]
    pub max_bins: u64,

    /// Detailed reads kept per bucket when a request does not say
    #[arg(long, env = "TRACKSIFT_DEFAULT_BUDGET", default_value = "30")]
    pub default_budget: usize,

    /// Start positions per bucket when a request does not say
    #[arg(long, env = "TRACKSIFT_DEFAULT_FRAME", default_value = "1")]
    pub default_frame: u64,

    /// Reference bases fetched per buffer extension
    #[arg(long, env = "TRACKSIFT_REFERENCE_STEP", default_value = "1000")]
    pub reference_step: u64,

    /// Seconds before a window query is abandoned
    #[arg(long, env = "TRACKSIFT_QUERY_TIMEOUT", default_value = "30")]
    pub query_timeout_secs: u64,
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            item_scale_threshold: self.item_scale_threshold,
            max_item_span: self.max_item_span,
            max_bins: self.max_bins,
            reference_step: self.reference_step,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["tracksift"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_budget, 30);
        assert_eq!(config.default_frame, 1);
        assert_eq!(config.query_timeout_secs, 30);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_engine_knobs_from_args() {
        let config = Config::parse_from([
            "tracksift",
            "--item-scale-threshold",
            "0.5",
            "--max-item-span",
            "2000",
            "--reference-step",
            "250",
            "--max-bins",
            "64",
        ]);
        let engine = config.engine_config();
        assert_eq!(engine.item_scale_threshold, 0.5);
        assert_eq!(engine.max_item_span, 2000);
        assert_eq!(engine.reference_step, 250);
        assert_eq!(engine.max_bins, 64);
    }

    #[test]
    fn test_cors_can_be_disabled() {
        let config = Config::parse_from(["tracksift", "--cors", "false"]);
        assert!(!config.cors);
    }

    #[test]
    fn test_bind_address() {
        let config = Config::parse_from(["tracksift", "--host", "localhost", "--port", "3000"]);
        assert_eq!(config.bind_address(), "localhost:3000");
    }
}
