//! Native HTTP server implementation
//!
//! Transport around the [`Engine`]:
//! - Multi-threaded tokio runtime
//! - HTTP/1.1 via hyper
//! - SO_REUSEPORT / TCP_NODELAY listener
//! - Handlers run on the blocking pool, so a slow handler only holds up its
//!   own request

use crate::request::decode_path;
use crate::{Engine, Error, Request, Response, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hostname: "0.0.0.0".to_string(),
            workers: num_cpus::get(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.hostname, self.port);
        addr.parse().map_err(|_| Error::InvalidAddress(addr))
    }
}

impl Engine {
    /// Bind `config`'s address and serve until the process exits.
    ///
    /// Builds its own runtime, so call it from `main`, not from async code.
    pub fn run(self, config: ServerConfig) -> Result<()> {
        let addr = config.addr()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.workers.max(1))
            .enable_all()
            .build()?;

        runtime.block_on(async move {
            let socket = create_optimized_socket(&addr)?;
            socket.set_nonblocking(true)?;
            let listener = TcpListener::from_std(socket.into())?;

            tracing::info!(%addr, workers = config.workers, "server listening");
            serve(Arc::new(self), listener).await
        })
    }
}

/// Accept connections on `listener` and dispatch them to `engine`
pub async fn serve(engine: Arc<Engine>, listener: TcpListener) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::error!(error = %err, "accept failed");
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let engine = Arc::clone(&engine);

        tokio::spawn(async move {
            let service = service_fn(move |req| dispatch(Arc::clone(&engine), req));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %err, "connection error");
            }
        });
    }
}

async fn dispatch(
    engine: Arc<Engine>,
    req: hyper::Request<Incoming>,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
    let request = match from_hyper_request(req).await {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read request body");
            return Ok(bare_response(400));
        }
    };

    let response = match tokio::task::spawn_blocking(move || engine.handle(request)).await {
        Ok(response) => to_hyper_response(response).unwrap_or_else(|err| {
            tracing::error!(error = %err, "invalid response");
            bare_response(500)
        }),
        // a panic no recovery middleware caught
        Err(err) => {
            tracing::error!(error = %err, "request handler failed");
            bare_response(500)
        }
    };
    Ok(response)
}

/// Create a TCP socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - enable kernel load balancing across threads
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;

    Ok(socket)
}

/// Read a hyper request, including its whole body, into our Request type
pub async fn from_hyper_request(req: hyper::Request<Incoming>) -> Result<Request> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| Error::Hyper(e.to_string()))?
        .to_bytes();
    Ok(request_from_parts(parts, body))
}

/// Build our Request from http request parts and a collected body.
///
/// The path is percent-decoded; the query string is kept raw.
pub fn request_from_parts(parts: http::request::Parts, body: Bytes) -> Request {
    let mut request = Request::new(parts.method.as_str(), decode_path(parts.uri.path()));
    request.query = parts.uri.query().map(|s| s.to_string());
    request.body = body;

    // Copy headers
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request
}

/// Convert our Response to hyper Response
pub fn to_hyper_response(res: Response) -> Result<hyper::Response<Full<Bytes>>> {
    let mut builder = hyper::Response::builder().status(res.status.as_u16());

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(Full::new(res.body.freeze()))
        .map_err(|e| Error::InvalidHeader(e.to_string()))
}

fn bare_response(status: u16) -> hyper::Response<Full<Bytes>> {
    let mut res = hyper::Response::new(Full::new(Bytes::new()));
    *res.status_mut() = http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    res
}
