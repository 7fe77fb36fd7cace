use std::convert::Infallible;
use std::net::SocketAddr;
use std::thread::JoinHandle;

use futures::stream;
use log::{error, info};
use tokio::net::TcpListener;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reply::{with_status, WithStatus};
use warp::Filter;

/// `GET /health` answers `200 OK`; every other request gets `404 Not Found`.
pub fn routes() -> impl Filter<Extract = (WithStatus<&'static str>,), Error = Infallible> + Clone {
    warp::method()
        .and(warp::path::full())
        .map(|method: Method, path: FullPath| health_reply(&method, path.as_str()))
}

fn health_reply(method: &Method, path: &str) -> WithStatus<&'static str> {
    if *method == Method::GET && path == "/health" {
        with_status("OK", StatusCode::OK)
    } else {
        with_status("Not Found", StatusCode::NOT_FOUND)
    }
}

/// Serves the health endpoint on its own OS thread with a dedicated
/// single-threaded runtime, independent of the bot's runtime.
///
/// The port is bound before the thread starts, so a taken port is reported
/// to the caller.
pub fn spawn_health_server(port: u16) -> std::io::Result<JoinHandle<()>> {
    let listener = std::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
    listener.set_nonblocking(true)?;
    let bound = listener.local_addr()?;

    std::thread::Builder::new()
        .name("health-server".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start health check runtime: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                let listener = match TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!("Failed to register health check listener: {}", e);
                        return;
                    }
                };

                info!("Health check server listening on {}", bound);
                let incoming = stream::unfold(listener, |listener| async move {
                    let conn = listener.accept().await.map(|(socket, _)| socket);
                    Some((conn, listener))
                });
                warp::serve(routes()).run_incoming(incoming).await;
            });
        })
}
