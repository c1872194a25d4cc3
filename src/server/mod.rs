// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use crate::handler::BaseHandler;
use crate::web::WebHandler;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub type ServeError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait ConnectionManager: Send + Sync + 'static {
    /// Serve until `shutdown` fires (or its sender is dropped), then drain
    /// in-flight requests and return.
    async fn serve(&self, addr: SocketAddr, shutdown: oneshot::Receiver<()>)
        -> Result<(), ServeError>;
}

/// HTTP connection manager using Axum.
#[derive(Clone)]
pub struct HttpConnectionManager {
    handler: WebHandler,
}

impl HttpConnectionManager {
    pub fn new(handler: BaseHandler) -> Self {
        Self {
            handler: WebHandler::new(handler),
        }
    }

    /// Serve on an already bound listener.
    pub async fn serve_listener(
        &self,
        listener: TcpListener,
        shutdown: oneshot::Receiver<()>,
    ) -> Result<(), ServeError> {
        let app = self.handler.clone().router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // Err means the sender was dropped; stop either way
                let _ = shutdown.await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[async_trait]
impl ConnectionManager for HttpConnectionManager {
    async fn serve(
        &self,
        addr: SocketAddr,
        shutdown: oneshot::Receiver<()>,
    ) -> Result<(), ServeError> {
        tracing::info!("Starting HTTP server on {}", addr);
        let listener = bind_listener(addr)?;
        self.serve_listener(listener, shutdown).await
    }
}

/// Bind a TCP listener with TCP_NODELAY and SO_REUSEADDR set.
pub fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    use socket2::{Domain, Protocol, Socket, Type};

    let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Pages are small; don't wait to coalesce segments
    socket.set_nodelay(true)?;
    socket.set_reuse_address(true)?;
    // tokio requires a non-blocking socket
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    TcpListener::from_std(socket.into())
}
