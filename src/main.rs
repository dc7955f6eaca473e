use std::process;
use std::sync::Arc;
use std::thread;

use anyhow::{Context as _, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, warn};

use bosun::config::Config;
use bosun::console::Console;
use bosun::engine::EngineFactory;
use bosun::engine::pool::StatePool;
use bosun::lifecycle::{self, DoneHandle};
use bosun::repl::{self, ExitReason, ReplOptions};
use bosun::server;
use bosun::shutdown::ShutdownRegistry;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bosun: {err:#}");
            process::exit(1);
        }
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("bosun: could not set up logging: {err:#}");
        process::exit(1);
    }
    match run(config) {
        Ok(code) => process::exit(code),
        Err(err) => fatal_exit(err),
    }
}

/// Startup and configuration failures land here: best-effort log, non-zero
/// exit, no retry.
fn fatal_exit(err: anyhow::Error) -> ! {
    error!("fatal: {err:#}");
    process::exit(1);
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            builder.with_writer(Arc::new(file)).with_ansi(false).init();
        }
        None => builder.init(),
    }
    Ok(())
}

/// Watch Unix signals on a background thread and turn the first one into a
/// Done trigger.
fn watch_signals(which: &[i32], done: DoneHandle) -> Result<()> {
    let mut signals = Signals::new(which)?;
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            warn!("received signal {signal}, shutting down");
            done.signal();
        }
    });
    Ok(())
}

#[tokio::main]
async fn run(config: Config) -> Result<i32> {
    let console = Console::new(!config.no_color);
    if !config.quiet {
        println!("bosun {VERSION} - HTTP server with an embedded JavaScript console");
    }

    let registry = Arc::new(ShutdownRegistry::new());

    let factory = EngineFactory::new(VERSION, config.server_dir.clone(), config.admin);
    let pool = Arc::new(StatePool::new(factory));
    {
        let pool = pool.clone();
        registry.register("interpreter-pool", move || {
            pool.shutdown();
            Ok(())
        });
    }

    let (ready, ready_gate) = lifecycle::ready_channel();
    let (done, done_gate) = lifecycle::done_channel();

    let mut console_session = None;
    if config.server_mode {
        watch_signals(&[SIGINT, SIGTERM], done.clone())?;
    } else {
        // SIGINT belongs to the line editor while the console is up.
        watch_signals(&[SIGTERM], done.clone())?;
        let pool = pool.clone();
        let registry = registry.clone();
        let opts = ReplOptions {
            double_eof: config.ctrl_d_twice,
            debug: config.debug,
            verbose: config.verbose,
        };
        let done = done.clone();
        console_session = Some(thread::spawn(move || {
            let result = repl::interactive(&pool, console, &registry, ready_gate, done.clone(), opts);
            if result.is_err() {
                // A console that failed to start must still release the server.
                done.signal();
            }
            result
        }));
    }

    server::serve(config.bind, pool, ready, done_gate).await?;

    registry.run_all();

    let mut code = 0;
    if let Some(session) = console_session {
        match session.join() {
            Ok(Ok(ExitReason::EasterEgg)) => code = 1,
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                error!("console session failed: {err:#}");
                code = 1;
            }
            Err(_) => {
                error!("console thread panicked");
                code = 1;
            }
        }
    }
    Ok(code)
}
