use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::engine::pool::StatePool;
use crate::lifecycle::{DoneGate, ReadySignal};

/// Accept connections until the Done signal arrives.
///
/// Readiness is signaled only after the listener is bound, so the console
/// never evaluates a line against a server that cannot take requests yet.
pub async fn serve(
    addr: SocketAddr,
    pool: Arc<StatePool>,
    ready: ReadySignal,
    mut done: DoneGate,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind to {addr}"))?;
    info!("listening on {}", listener.local_addr()?);
    ready.fire();

    loop {
        tokio::select! {
            _ = done.wait() => break,
            accepted = listener.accept() => {
                let (stream, _) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        error!("failed to accept connection: {err}");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let pool = pool.clone();
                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        let pool = pool.clone();
                        async move { handle_request(pool, req).await }
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("error serving connection: {err}");
                    }
                });
            }
        }
    }
    info!("serve loop stopped");
    Ok(())
}

async fn handle_request(
    pool: Arc<StatePool>,
    _req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = match render_status(&pool) {
        Ok(text) => text,
        Err(err) => {
            error!("could not render the status page: {err:#}");
            "bosun: status unavailable\n".to_string()
        }
    };
    Ok(Response::new(Full::new(Bytes::from(body))))
}

/// Render the status page on an interpreter state held for exactly this
/// request. On an evaluation error the state is dropped instead of
/// released, which closes it.
fn render_status(pool: &StatePool) -> anyhow::Result<String> {
    let mut state = pool.acquire()?;
    let version = state.eval_to_string("version()")?;
    pool.release(state);
    Ok(format!("bosun {version}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineFactory;
    use std::path::PathBuf;

    #[test]
    fn the_status_page_releases_its_state() {
        let pool = StatePool::new(EngineFactory::new("0.0.0", PathBuf::from("."), false));
        let page = render_status(&pool).unwrap();
        assert_eq!(page, "bosun 0.0.0\n");
        assert_eq!(pool.idle_count(), 1);
        // The second request reuses the released state.
        render_status(&pool).unwrap();
        assert_eq!(pool.idle_count(), 1);
    }
}
