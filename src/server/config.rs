//! Server configuration

use clap::Parser;

use crate::config::AnalysisConfig;

const MIB: usize = 1024 * 1024;

/// Command line / environment configuration for `bpm-server`
#[derive(Parser, Debug, Clone)]
#[clap(name = "bpm-server", about = "HTTP tempo detection service")]
pub struct ServerConfig {
    /// Address to bind.
    #[clap(long, env = "BPM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, env = "BPM_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Allowed CORS origins, comma separated. Empty allows any origin.
    #[clap(long, env = "BPM_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Maximum upload size in MiB.
    #[clap(long, env = "BPM_MAX_UPLOAD_MB", default_value_t = 100)]
    pub max_upload_mb: usize,

    /// Seconds of audio analysed per upload.
    #[clap(long, env = "BPM_MAX_SECONDS", default_value_t = 15.0)]
    pub max_analysis_seconds: f32,

    /// Sample rate audio is downsampled to before analysis.
    #[clap(long, env = "BPM_ANALYSIS_SAMPLE_RATE", default_value_t = 22050)]
    pub analysis_sample_rate: u32,
}

impl ServerConfig {
    /// Analysis parameters applied to every upload
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            max_analysis_seconds: Some(self.max_analysis_seconds),
            analysis_sample_rate: Some(self.analysis_sample_rate),
            ..AnalysisConfig::default()
        }
    }

    /// Upload body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(MIB)
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let config = ServerConfig::parse_from([
            "bpm-server",
            "--port",
            "9000",
            "--cors-origins",
            "http://localhost:3000,https://example.com",
        ]);

        assert_eq!(config.port, 9000);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://example.com"]
        );
        assert_eq!(config.bind_address(), format!("{}:9000", config.host));
    }

    #[test]
    fn test_analysis_config_follows_server_settings() {
        let config = ServerConfig::parse_from(["bpm-server", "--max-analysis-seconds", "10"]);
        let analysis = config.analysis_config();
        assert_eq!(analysis.max_analysis_seconds, Some(10.0));
        assert_eq!(analysis.analysis_sample_rate, Some(config.analysis_sample_rate));
        assert!(analysis.validate().is_ok());
        assert_eq!(config.body_limit_bytes(), config.max_upload_mb * MIB);
    }
}
