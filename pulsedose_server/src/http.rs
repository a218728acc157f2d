//! Request intake: one HTTP endpoint that validates and parses a dose value
//! and writes it into the shared dose cell. Responsibility ends there; the
//! actuation thread picks the value up on its next pass.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use pulsedose_core::DoseCell;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// How often the liveness status line is emitted.
const STATUS_PERIOD: Duration = Duration::from_secs(30);

/// State shared by every connection task.
pub struct AppState {
    pub dose: Arc<DoseCell>,
    served: AtomicU64,
    rejected: AtomicU64,
}

impl AppState {
    pub fn new(dose: Arc<DoseCell>) -> Self {
        Self {
            dose,
            served: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Route a request on method + path only and produce the full response.
///
/// Pure over (method, path, query) + state so the contract is testable
/// without sockets. Every response carries the CORS trio so the browser
/// client can talk to the device from any origin.
pub fn route(method: &Method, path: &str, query: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    if path != "/dose" {
        return with_cors(text_response(StatusCode::NOT_FOUND, "Not found"));
    }

    match *method {
        // CORS preflight: headers only, empty body, no dose mutation.
        Method::OPTIONS => with_cors(text_response(StatusCode::OK, "")),
        Method::GET => {
            let Some(raw) = query.and_then(|q| query_param(q, "value")) else {
                tracing::warn!("dose request missing 'value' parameter");
                state.rejected.fetch_add(1, Ordering::Relaxed);
                return with_cors(text_response(
                    StatusCode::BAD_REQUEST,
                    "Missing 'value' parameter",
                ));
            };
            match raw.parse::<f64>() {
                Ok(value) => {
                    state.dose.set(value);
                    state.served.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(value, "dose received");
                    // Echo the literal value string back to the caller.
                    with_cors(text_response(
                        StatusCode::OK,
                        &format!("Dose received: {raw}"),
                    ))
                }
                Err(_) => {
                    tracing::warn!(raw, "dose request with unparsable 'value'");
                    state.rejected.fetch_add(1, Ordering::Relaxed);
                    with_cors(text_response(
                        StatusCode::BAD_REQUEST,
                        "Invalid 'value' parameter: expected a number",
                    ))
                }
            }
        }
        _ => with_cors(text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        )),
    }
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body.to_owned())));
    *resp.status_mut() = status;
    if !body.is_empty() {
        resp.headers_mut()
            .insert("Content-Type", hyper::header::HeaderValue::from_static("text/plain"));
    }
    resp
}

fn with_cors(mut resp: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        hyper::header::HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        hyper::header::HeaderValue::from_static("Content-Type"),
    );
    resp
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

async fn handle(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    tracing::debug!(%peer, method = %req.method(), uri = %req.uri(), "request");
    Ok(route(req.method(), req.uri().path(), req.uri().query(), &state))
}

/// Accept loop for the dose endpoint. Returns when `shutdown` is set.
pub async fn serve(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dose endpoint listening");

    tokio::spawn(status_loop(state.clone()));

    loop {
        tokio::select! {
            conn = listener.accept() => {
                let (stream, peer) = conn?;
                let io = TokioIo::new(stream);
                let state = state.clone();
                tokio::spawn(async move {
                    let svc = service_fn(move |req| handle(req, state.clone(), peer));
                    if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                        tracing::debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
            () = tokio::time::sleep(Duration::from_millis(250)) => {
                if shutdown.load(Ordering::Relaxed) {
                    tracing::info!("intake loop stopping");
                    return Ok(());
                }
            }
        }
    }
}

// Periodic liveness line, as the original device printed every 30 seconds.
async fn status_loop(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(STATUS_PERIOD);
    interval.tick().await; // first tick fires immediately; skip it
    loop {
        interval.tick().await;
        tracing::info!(
            served = state.served(),
            rejected = state.rejected(),
            dose = state.dose.get(),
            "server running"
        );
    }
}
