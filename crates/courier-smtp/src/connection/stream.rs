//! Implicit-TLS connection setup.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

use super::{ServerEndpoint, Transport};
use crate::error::{Error, Result};

/// Encrypted stream to the submission server.
pub type SmtpStream = TlsStream<TcpStream>;

/// Opens a TLS session to `endpoint`: TCP connect plus handshake, both
/// within `limit`.
///
/// The server certificate is always checked against the webpki roots.
///
/// # Errors
///
/// Returns [`Error::Connect`] if the host is unreachable, its name is not a
/// valid server name or the handshake fails, and [`Error::Timeout`] if the
/// whole setup takes longer than `limit`.
pub async fn open(endpoint: &ServerEndpoint, limit: Duration) -> Result<Transport<SmtpStream>> {
    let server_name = ServerName::try_from(endpoint.host().to_string())
        .map_err(|e| connect_error(endpoint, io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    let connector = create_tls_connector();
    let handshake = async {
        let tcp = TcpStream::connect((endpoint.host(), endpoint.port())).await?;
        debug!(%endpoint, "TCP connected, starting TLS handshake");
        connector.connect(server_name, tcp).await
    };

    let stream = bounded(endpoint, limit, handshake).await?;
    debug!(%endpoint, "TLS session established");
    Ok(Transport::new(stream, limit))
}

/// Runs connection setup under `limit`, mapping its failures.
async fn bounded<T, F>(endpoint: &ServerEndpoint, limit: Duration, setup: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout(limit, setup).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(connect_error(endpoint, e)),
        Err(_) => Err(Error::Timeout(limit)),
    }
}

fn connect_error(endpoint: &ServerEndpoint, source: io::Error) -> Error {
    Error::Connect {
        endpoint: endpoint.to_string(),
        source,
    }
}

/// Creates a TLS connector with the webpki root certificates.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
