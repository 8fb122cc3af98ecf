use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailSyncResult;
use crate::modules::imap::session::SessionStream;
use crate::modules::imap::ImapSession;
use crate::modules::settings::config::ServerConfig;
use crate::modules::utils::net::{
    establish_tcp_connection_with_timeout, establish_tls_connection, resolve_to_socket_addr,
};
use crate::raise_error;
use async_imap::Client as ImapClient;
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use tokio::io::BufWriter;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct Client {
    inner: ImapClient<Box<dyn SessionStream>>,
}

impl Deref for Client {
    type Target = ImapClient<Box<dyn SessionStream>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Client {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

fn alpn(port: u16) -> &'static [&'static str] {
    if port == 993 {
        &[]
    } else {
        &["imap"]
    }
}

/// Split a configured `host[:port]` URI, defaulting the port by transport.
fn parse_uri(uri: &str, use_tls: bool) -> MailSyncResult<(String, u16)> {
    let default_port = if use_tls { 993 } else { 143 };
    match uri.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse::<u16>().map_err(|_| {
                raise_error!(
                    format!("invalid port in server uri '{}'", uri),
                    ErrorCode::InvalidParameter
                )
            })?;
            Ok((host.to_string(), port))
        }
        _ if !uri.is_empty() => Ok((uri.to_string(), default_port)),
        _ => Err(raise_error!(
            "server uri must not be empty".into(),
            ErrorCode::InvalidParameter
        )),
    }
}

impl Client {
    fn new(stream: Box<dyn SessionStream>) -> Self {
        Self {
            inner: ImapClient::new(stream),
        }
    }

    /// Dial the configured server, TLS or plain per its settings, and read
    /// the server greeting.
    pub(crate) async fn connection(server: &ServerConfig) -> MailSyncResult<Self> {
        let (host, port) = parse_uri(&server.uri, server.use_tls)?;
        let resolved_addr = resolve_to_socket_addr(&host, port)?;
        debug!("Attempting IMAP connection to {host} ({resolved_addr}).");
        if server.use_tls {
            Self::establish_secure_connection(resolved_addr, &host).await
        } else {
            Self::establish_insecure_connection(resolved_addr).await
        }
    }

    pub(crate) async fn login(
        self,
        username: &str,
        password: &str,
    ) -> MailSyncResult<ImapSession> {
        let Client { inner, .. } = self;
        let session = inner.login(username, password).await.map_err(|(e, _)| {
            raise_error!(format!("{:#?}", e), ErrorCode::ImapAuthenticationFailed)
        })?;
        Ok(session)
    }

    async fn establish_secure_connection(
        address: SocketAddr,
        server_hostname: &str,
    ) -> MailSyncResult<Self> {
        let tls_stream =
            establish_tls_connection(address, server_hostname, alpn(address.port())).await?;
        let buffered_stream = BufWriter::new(tls_stream);
        let session_stream: Box<dyn SessionStream> = Box::new(buffered_stream);
        let mut client = Client::new(session_stream);
        Self::read_greeting(&mut client).await?;
        Ok(client)
    }

    async fn establish_insecure_connection(address: SocketAddr) -> MailSyncResult<Self> {
        let tcp_stream = establish_tcp_connection_with_timeout(address).await?;
        let buffered_stream = BufWriter::new(tcp_stream);
        let session_stream: Box<dyn SessionStream> = Box::new(buffered_stream);
        let mut client = Client::new(session_stream);
        Self::read_greeting(&mut client).await?;
        Ok(client)
    }

    async fn read_greeting(client: &mut Client) -> MailSyncResult<()> {
        let _greeting = client
            .read_response()
            .await
            .ok_or_else(|| {
                raise_error!(
                    "failed to read greeting".into(),
                    ErrorCode::ImapCommandFailed
                )
            })?
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::parse_uri;

    #[test]
    fn uri_with_port() {
        assert_eq!(
            parse_uri("imap.example.com:1993", true).unwrap(),
            ("imap.example.com".to_string(), 1993)
        );
    }

    #[test]
    fn uri_defaults_port_by_transport() {
        assert_eq!(
            parse_uri("imap.example.com", true).unwrap(),
            ("imap.example.com".to_string(), 993)
        );
        assert_eq!(
            parse_uri("imap.example.com", false).unwrap(),
            ("imap.example.com".to_string(), 143)
        );
    }

    #[test]
    fn bad_uris_are_rejected() {
        assert!(parse_uri("", true).is_err());
        assert!(parse_uri("imap.example.com:notaport", true).is_err());
    }
}
