//! Socket front end: one listener shared by `/mocks` administration and the
//! mock dispatcher.

use crate::api::router::route_request;
use crate::store::InMemoryStore;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct MockServer {
    addr: SocketAddr,
    store: Arc<InMemoryStore>,
}

impl MockServer {
    pub fn new(addr: SocketAddr, store: Arc<InMemoryStore>) -> Self {
        Self { addr, store }
    }

    /// Bind the configured address and serve until accepting fails.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("apimock listening on http://{}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serve on a listener the caller bound, e.g. on port 0 in tests.
    ///
    /// Each connection runs on its own task against the shared store.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let store = Arc::clone(&self.store);

            tokio::spawn(async move {
                let service = service_fn(move |req| route_request(req, Arc::clone(&store)));
                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                if let Err(e) = conn.await {
                    warn!(peer = %peer, "Connection error: {}", e);
                }
            });
        }
    }
}
