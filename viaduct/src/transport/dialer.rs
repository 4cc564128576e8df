use crate::error::Error;
use anyhow::{Context, Result, bail};
use std::fmt::Display;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Http,
    Socks5,
}

/// A parsed endpoint address. Endpoint strings are opaque once ingested;
/// parsing happens at dial time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddr {
    scheme: ProxyScheme,
    host: String,
    port: u16,
}

impl ProxyAddr {
    /// Parse `socks5://host:port`, `http://host:port`, or a bare `host:port`
    /// (data-set lines without a scheme are socks5 endpoints).
    pub fn parse(addr: &str) -> Result<Self> {
        let addr = addr.trim();
        let (scheme, rest) = if let Some(rest) = addr.strip_prefix("socks5://") {
            (ProxyScheme::Socks5, rest)
        } else if let Some(rest) = addr.strip_prefix("http://") {
            (ProxyScheme::Http, rest)
        } else if let Some(rest) = addr.strip_prefix("https://") {
            (ProxyScheme::Http, rest)
        } else if addr.contains("://") {
            return Err(Error::InvalidProxyAddr(addr.to_string()).into());
        } else {
            (ProxyScheme::Socks5, addr)
        };

        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidProxyAddr(addr.to_string()))?;
        if host.is_empty() || host.contains([' ', '/']) {
            return Err(Error::InvalidProxyAddr(addr.to_string()).into());
        }
        let port: u16 = port.parse().map_err(|_| Error::InvalidProxyAddr(addr.to_string()))?;

        Ok(Self { scheme, host: host.to_string(), port })
    }

    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Display for ProxyAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.scheme {
            ProxyScheme::Http => "http",
            ProxyScheme::Socks5 => "socks5",
        };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Dials a target host through one proxy endpoint, every step bounded by the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct Dialer {
    addr: ProxyAddr,
    timeout: Duration,
}

impl Dialer {
    pub fn new(addr: ProxyAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    pub fn addr(&self) -> &ProxyAddr {
        &self.addr
    }

    /// Open a TCP connection to the proxy itself, without addressing a
    /// target. Used for absolute-form requests through HTTP proxies.
    pub async fn connect_raw(&self) -> Result<TcpStream> {
        let stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.addr.host.as_str(), self.addr.port)),
        )
        .await
        .map_err(|_| anyhow::anyhow!("connect to proxy {} timed out", self.addr))?
        .with_context(|| format!("tcp connect to proxy {} failed", self.addr))?;
        Ok(stream)
    }

    /// Open a connection to `host:port` tunnelled through the proxy.
    pub async fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        let mut stream = self.connect_raw().await?;
        match self.addr.scheme {
            ProxyScheme::Socks5 => {
                tokio::time::timeout(self.timeout, self.socks5_connect(&mut stream, host, port))
                    .await
                    .map_err(|_| anyhow::anyhow!("SOCKS5 handshake with {} timed out", self.addr))??
            }
            ProxyScheme::Http => {
                tokio::time::timeout(self.timeout, self.http_connect(&mut stream, host, port))
                    .await
                    .map_err(|_| anyhow::anyhow!("CONNECT handshake with {} timed out", self.addr))??
            }
        }
        Ok(stream)
    }

    // RFC 1928 no-auth handshake followed by CONNECT. Open proxies from
    // public data sets do not offer authentication.
    async fn socks5_connect(&self, stream: &mut TcpStream, host: &str, port: u16) -> Result<()> {
        stream.write_all(&[0x05, 0x01, 0x00]).await?;

        let mut reply = [0u8; 2];
        stream.read_exact(&mut reply).await?;
        if reply[0] != 0x05 {
            bail!("invalid SOCKS version from {}: {}", self.addr, reply[0]);
        }
        if reply[1] != 0x00 {
            bail!("proxy {} requires authentication (method {})", self.addr, reply[1]);
        }

        let mut request = vec![0x05, 0x01, 0x00];
        if let Ok(ip) = host.parse::<IpAddr>() {
            match ip {
                IpAddr::V4(v4) => {
                    request.push(0x01);
                    request.extend_from_slice(&v4.octets());
                }
                IpAddr::V6(v6) => {
                    request.push(0x04);
                    request.extend_from_slice(&v6.octets());
                }
            }
        } else {
            if host.len() > 255 {
                bail!("domain name too long: {}", host);
            }
            request.push(0x03);
            request.push(host.len() as u8);
            request.extend_from_slice(host.as_bytes());
        }
        request.extend_from_slice(&port.to_be_bytes());
        stream.write_all(&request).await?;

        let mut head = [0u8; 4];
        stream.read_exact(&mut head).await?;
        if head[1] != 0x00 {
            bail!("SOCKS5 connect via {} rejected (code {})", self.addr, head[1]);
        }
        // Drain the bound address trailing the reply header.
        match head[3] {
            0x01 => {
                let mut rest = [0u8; 6];
                stream.read_exact(&mut rest).await?;
            }
            0x04 => {
                let mut rest = [0u8; 18];
                stream.read_exact(&mut rest).await?;
            }
            0x03 => {
                let mut len = [0u8; 1];
                stream.read_exact(&mut len).await?;
                let mut rest = vec![0u8; len[0] as usize + 2];
                stream.read_exact(&mut rest).await?;
            }
            other => bail!("unknown SOCKS5 address type from {}: {}", self.addr, other),
        }
        Ok(())
    }

    async fn http_connect(&self, stream: &mut TcpStream, host: &str, port: u16) -> Result<()> {
        let request = format!(
            "CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\nProxy-Connection: Keep-Alive\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await?;

        let mut head = Vec::with_capacity(256);
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            if head.len() > 8192 {
                bail!("oversized CONNECT response from {}", self.addr);
            }
            stream.read_exact(&mut byte).await?;
            head.push(byte[0]);
        }

        let head = String::from_utf8_lossy(&head);
        let status = head.split_whitespace().nth(1).unwrap_or("");
        if status != "200" {
            bail!("CONNECT via {} rejected: {}", self.addr, head.lines().next().unwrap_or_default());
        }
        Ok(())
    }
}
