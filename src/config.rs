use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context as _, bail};
use argh::FromArgs;

/// bosun - HTTP status server with an embedded JavaScript console
#[derive(FromArgs)]
struct Args {
    /// address to bind the HTTP server to
    #[argh(option, short = 'b', default = "String::from(\"127.0.0.1:3000\")")]
    bind: String,

    /// run without the interactive console
    #[argh(switch, short = 's')]
    server: bool,

    /// require pressing ctrl-d twice to leave the console
    #[argh(switch)]
    ctrl_d_twice: bool,

    /// append logs to this file instead of stderr
    #[argh(option, short = 'l')]
    log_file: Option<String>,

    /// skip the privileged server.* console bindings
    #[argh(switch)]
    no_admin: bool,

    /// disable colored output
    #[argh(switch)]
    no_color: bool,

    /// only log errors, no banner
    #[argh(switch, short = 'q')]
    quiet: bool,

    /// more log output
    #[argh(switch, short = 'V')]
    verbose: bool,

    /// debug log output and console diagnostics
    #[argh(switch)]
    debug: bool,

    /// directory to serve from
    #[argh(positional, default = "String::from(\".\")")]
    dir: String,
}

/// Resolved startup configuration.
pub struct Config {
    pub bind: SocketAddr,
    pub server_dir: PathBuf,
    pub server_mode: bool,
    pub ctrl_d_twice: bool,
    pub log_file: Option<PathBuf>,
    pub admin: bool,
    pub no_color: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl Config {
    /// Parse and validate the command line.
    pub fn load() -> anyhow::Result<Self> {
        let args: Args = argh::from_env();

        let bind: SocketAddr = args
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", args.bind))?;

        let server_dir = PathBuf::from(&args.dir);
        if !server_dir.is_dir() {
            bail!("server directory does not exist: {}", server_dir.display());
        }

        Ok(Self {
            bind,
            server_dir,
            server_mode: args.server,
            ctrl_d_twice: args.ctrl_d_twice,
            log_file: args.log_file.map(PathBuf::from),
            admin: !args.no_admin,
            no_color: args.no_color,
            quiet: args.quiet,
            verbose: args.verbose,
            debug: args.debug,
        })
    }

    /// Default log filter when RUST_LOG does not override it.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}
