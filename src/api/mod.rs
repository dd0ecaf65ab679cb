use std::sync::Arc;

use hyper::server::conn::Http;
use hyper::Body;
use routerify::{RequestServiceBuilder, Router};
use tokio::net::TcpSocket;
use tokio::select;

use self::error::RouteError;
use crate::global::GlobalState;

pub mod auth;
pub mod error;
pub mod ext;
pub mod jwt;
pub mod macros;
pub mod middleware;
pub mod v1;

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError> {
    let weak = Arc::downgrade(global);
    Router::builder()
        .data(weak)
        .err_handler_with_info(error::error_handler)
        // The auth middleware checks the Authorization header, and if it's
        // valid, it puts the identity in the request context. This way we can
        // access the identity in the handlers. It does not fail the request
        // if the header is absent.
        .middleware(middleware::auth::auth_middleware(global))
        .scope("/v1", v1::routes(global))
        .build()
        .expect("failed to build router")
}

pub async fn run(global: Arc<GlobalState>) -> anyhow::Result<()> {
    let config = &global.config.api;
    tracing::info!("listening on {}", config.bind_address);

    let socket = if config.bind_address.is_ipv6() {
        TcpSocket::new_v6()?
    } else {
        TcpSocket::new_v4()?
    };

    socket.set_reuseaddr(true)?;
    socket.set_reuseport(true)?;
    socket.bind(config.bind_address)?;
    let listener = socket.listen(1024)?;

    // The reason we use a Weak reference to the global state is because we
    // don't want to block the shutdown. When a keep-alive connection is open,
    // the request service will still be alive and holding a reference to the
    // global state. With a Weak reference the global state can be dropped,
    // and we stop accepting new connections.
    let request_service =
        RequestServiceBuilder::new(routes(&global)).expect("failed to build request service");

    loop {
        select! {
            _ = global.ctx.done() => {
                return Ok(());
            },
            r = listener.accept() => {
                let (socket, addr) = r?;

                let service = request_service.build(addr);

                tracing::debug!("accepted connection from {}", addr);

                tokio::spawn(async move {
                    Http::new().serve_connection(socket, service).await.ok();
                });
            },
        }
    }
}
