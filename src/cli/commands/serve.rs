//! `apival serve` command - Run the upload form

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::Config;
use crate::schema::ReportMode;
use crate::web::{FormServer, ServerConfig};

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (default: 127.0.0.1, or APIVAL_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default: 5000, or APIVAL_PORT)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Directory to stage uploads in while they are checked
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Report every violation instead of only the first
    #[arg(long)]
    pub all: bool,
}

impl ServeArgs {
    /// Command-line flags take precedence over every config layer
    fn apply(self, config: &mut Config) {
        if self.host.is_some() {
            config.host = self.host;
        }
        if self.port.is_some() {
            config.port = self.port;
        }
        if self.upload_dir.is_some() {
            config.upload_dir = self.upload_dir;
        }
        if self.all {
            config.report = Some(ReportMode::All);
        }
    }
}

pub fn run(args: ServeArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = Config::load();
    args.apply(&mut config);

    let server_config = ServerConfig::from_config(&config);
    let server = FormServer::with_config(server_config).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Serving the upload form on http://{}",
            console::style("→").blue(),
            server.socket_addr()
        );
    }

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    runtime.block_on(server.start()).into_diagnostic()
}
