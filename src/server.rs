//! HTTP echo server: every request gets back its own method, URL, headers
//! and body, followed by each backend's report for its `User-Agent`.

use crate::aggregate::{pretty, Aggregator};
use crate::error::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Accept connections on `addr` until the process is stopped.
pub async fn serve(addr: SocketAddr, aggregator: Arc<Aggregator>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("server running at http://{addr}/");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let aggregator = Arc::clone(&aggregator);

        tokio::spawn(async move {
            let service = service_fn(move |req| handle(req, Arc::clone(&aggregator)));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %err, "connection error");
            }
        });
    }
}

async fn handle(
    req: Request<Incoming>,
    aggregator: Arc<Aggregator>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::debug!(error = %err, "failed to read request body");
            Bytes::new()
        }
    };

    // Backends are synchronous and may be slow; keep them off the reactor.
    let report = tokio::task::spawn_blocking(move || {
        render_report(&parts.method, &parts.uri, &parts.headers, &body, &aggregator)
    })
    .await
    .unwrap_or_else(|err| format!("report failed: {err}\n"));

    let mut response = Response::new(Full::new(Bytes::from(report)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    Ok(response)
}

/// The response body for one request.
pub fn render_report(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
    aggregator: &Aggregator,
) -> String {
    let ua = headers
        .get(USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();

    let mut out = format!(
        "Method: {method}\nURL: {uri}\nHeaders: {}\n\nBody:\n{}\n\n",
        pretty(&headers_json(headers)),
        String::from_utf8_lossy(body),
    );
    out.push_str(&aggregator.render_blocks(&ua));
    out
}

/// Headers as a JSON object with lowercase names; repeated headers are
/// joined with `", "`.
fn headers_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::BackendKind;
    use crate::builtin;
    use hyper::header::ACCEPT;

    #[test]
    fn echoes_request_then_reports() {
        let aggregator = Aggregator::with_backends(
            &builtin::registry(),
            &[BackendKind::Bowser, BackendKind::Woothee],
        );
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5.0"));
        headers.append(ACCEPT, HeaderValue::from_static("text/plain"));
        headers.append(ACCEPT, HeaderValue::from_static("*/*"));

        let report = render_report(
            &Method::POST,
            &"/echo?x=1".parse().unwrap(),
            &headers,
            b"hello",
            &aggregator,
        );

        assert!(report.starts_with("Method: POST\nURL: /echo?x=1\nHeaders: {\n"));
        assert!(report.contains("  \"user-agent\": \"curl/8.5.0\""));
        assert!(report.contains("  \"accept\": \"text/plain, */*\""));
        assert!(report.contains("\n\nBody:\nhello\n\n"));

        let bowser = report.find("bowser Parsed Info:\n").unwrap();
        let woothee = report.find("woothee Parsed Info:\n").unwrap();
        assert!(bowser < woothee);
        assert!(report.contains("\"error\": \"bowser is not installed\""));
    }

    #[test]
    fn missing_user_agent_is_empty() {
        let aggregator = Aggregator::with_backends(&builtin::registry(), &[BackendKind::Woothee]);
        let report = render_report(&Method::GET, &Uri::from_static("/"), &HeaderMap::new(), b"", &aggregator);
        assert!(report.contains("Headers: {}\n\nBody:\n\n\n"));
        assert!(report.contains("\"ua\": \"\""));
    }

    #[test]
    fn non_ascii_user_agent_is_decoded_lossily() {
        let aggregator = Aggregator::with_backends(&builtin::registry(), &[BackendKind::Woothee]);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_bytes(b"Foo/1.0 \xe9").unwrap());

        let report = render_report(&Method::GET, &Uri::from_static("/"), &headers, b"", &aggregator);
        assert!(report.contains("\"ua\": \"Foo/1.0 \u{FFFD}\""));
    }
}
