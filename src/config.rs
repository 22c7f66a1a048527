use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server settings, read from the command line or the environment
#[derive(Clone, Debug, Parser)]
#[command(name = "boxplot-web", version, about = "Box-plot generator for uploaded spreadsheets")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "BOXPLOT_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory uploaded spreadsheets are stored in
    #[arg(long, env = "BOXPLOT_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Directory generated images and archives are written to
    #[arg(long, env = "BOXPLOT_OUTPUT_DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Largest accepted upload, in megabytes
    #[arg(long, env = "BOXPLOT_MAX_UPLOAD_MB", default_value_t = 32)]
    pub max_upload_mb: usize,
}

impl Config {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
