use super::dialer::{Dialer, ProxyAddr, ProxyScheme};
use crate::utils::host_port;
use anyhow::Result;
use hyper::client::HttpConnector;
use hyper::client::connect::{Connected, Connection};
use hyper::service::Service;
use hyper::{Body, Client, Request, Response, Uri};
use hyper_tls::HttpsConnector;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_native_tls::native_tls;

/// A connection established through a proxy endpoint, plain or TLS-wrapped.
pub struct ProxyStream {
    inner: Inner,
    // Plain-http targets through an HTTP proxy skip the tunnel; hyper must
    // then send the request in absolute form.
    absolute_form: bool,
}

enum Inner {
    Plain(TcpStream),
    Tls(Box<tokio_native_tls::TlsStream<TcpStream>>),
}

impl Connection for ProxyStream {
    fn connected(&self) -> Connected {
        let connected = Connected::new();
        if self.absolute_form { connected.proxy(true) } else { connected }
    }
}

impl AsyncRead for ProxyStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Inner::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ProxyStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            Inner::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Inner::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Inner::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Inner::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Hyper connector that routes every connection through one proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxyConnector {
    dialer: Dialer,
    accept_invalid_certs: bool,
}

impl ProxyConnector {
    pub fn new(addr: ProxyAddr, timeout: Duration, accept_invalid_certs: bool) -> Self {
        Self { dialer: Dialer::new(addr, timeout), accept_invalid_certs }
    }

    async fn establish(self, dst: Uri) -> Result<ProxyStream> {
        let (host, port) = host_port(&dst)?;
        let is_https = dst.scheme_str() == Some("https");

        // HTTP proxy, plain-http target: talk to the proxy directly with
        // absolute-form requests, no tunnel.
        if !is_https && self.dialer.addr().scheme() == ProxyScheme::Http {
            let stream = self.dialer.connect_raw().await?;
            return Ok(ProxyStream { inner: Inner::Plain(stream), absolute_form: true });
        }

        let stream = self.dialer.connect(&host, port).await?;
        if is_https {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(self.accept_invalid_certs)
                .build()?;
            let tls = tokio_native_tls::TlsConnector::from(tls);
            let stream = tls.connect(&host, stream).await?;
            return Ok(ProxyStream { inner: Inner::Tls(Box::new(stream)), absolute_form: false });
        }
        Ok(ProxyStream { inner: Inner::Plain(stream), absolute_form: false })
    }
}

impl Service<Uri> for ProxyConnector {
    type Response = ProxyStream;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<ProxyStream>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let connector = self.clone();
        Box::pin(async move { connector.establish(dst).await })
    }
}

/// The client a request executes on, proxied or direct. The two connector
/// types differ, so the variants carry different client types.
#[derive(Debug, Clone)]
pub enum HttpClient {
    Direct(Client<HttpsConnector<HttpConnector>, Body>),
    Proxied(Client<ProxyConnector, Body>),
}

impl HttpClient {
    pub async fn request(&self, req: Request<Body>) -> Result<Response<Body>> {
        match self {
            HttpClient::Direct(client) => Ok(client.request(req).await?),
            HttpClient::Proxied(client) => Ok(client.request(req).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Server, StatusCode};
    use std::convert::Infallible;
    use std::net::SocketAddr;

    // A loopback server that answers any request with 200 and echoes the
    // request URI in the body. Absolute-form requests make it double as an
    // HTTP forward proxy.
    async fn spawn_echo_server() -> SocketAddr {
        let make = make_service_fn(|_| async {
            Ok::<_, Infallible>(service_fn(|req: Request<Body>| async move {
                let body = format!("uri={}", req.uri());
                Ok::<_, Infallible>(Response::builder().status(StatusCode::OK).body(Body::from(body)).unwrap())
            }))
        });
        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make);
        let addr = server.local_addr();
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn test_http_proxy_gets_absolute_form_request() {
        let proxy = spawn_echo_server().await;
        let addr = ProxyAddr::parse(&format!("http://{}", proxy)).unwrap();
        let connector = ProxyConnector::new(addr, Duration::from_secs(2), false);
        let client = Client::builder().build::<_, Body>(connector);

        let response = client.get("http://origin.invalid/ip".parse().unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        // The proxy saw the full target URI, not just a path.
        assert_eq!(&body[..], b"uri=http://origin.invalid/ip");
    }

    #[tokio::test]
    async fn test_proxied_request_to_dead_proxy_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);

        let addr = ProxyAddr::parse(&format!("http://{}", dead)).unwrap();
        let connector = ProxyConnector::new(addr, Duration::from_millis(500), false);
        let client = Client::builder().build::<_, Body>(connector);
        assert!(client.get("http://origin.invalid/ip".parse().unwrap()).await.is_err());
    }
}
