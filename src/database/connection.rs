use std::future::Future;

use log::error;
use openssl::ssl::{SslConnector, SslMethod};
use postgres_openssl::MakeTlsConnector;
use tokio::time::{timeout, Duration};
use tokio_postgres::{Client, NoTls};
use url::Url;

use crate::error::StorageError;

/// Connector that verifies the server certificate against the CA at `sslrootcert_path`.
fn ssl_connector(sslrootcert_path: &str) -> Result<SslConnector, StorageError> {
    let mut builder = SslConnector::builder(SslMethod::tls())
        .map_err(|e| StorageError::Tls(format!("SSL builder error: {}", e)))?;

    builder
        .set_ca_file(sslrootcert_path)
        .map_err(|e| StorageError::Tls(format!("Error loading CA cert: {}", e)))?;

    Ok(builder.build())
}

pub fn create_ssl_connector(sslrootcert_path: &str) -> Result<MakeTlsConnector, StorageError> {
    ssl_connector(sslrootcert_path).map(MakeTlsConnector::new)
}

/// Connection string with the client-side `sslrootcert` parameter split off.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub url: String,
    pub sslrootcert: Option<String>,
}

pub fn parse_database_url(database_url: &str) -> Result<ConnectionTarget, StorageError> {
    let url = Url::parse(database_url)?;

    let mut sslrootcert = None;
    let mut clean_params = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == "sslrootcert" {
            sslrootcert = Some(value.to_string());
        } else {
            clean_params.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut clean_url = url.clone();
    clean_url.set_query(None);
    if !clean_params.is_empty() {
        let query = clean_params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        clean_url.set_query(Some(&query));
    }

    Ok(ConnectionTarget {
        url: clean_url.to_string(),
        sslrootcert,
    })
}

async fn connect(database_url: &str) -> Result<Client, StorageError> {
    let target = parse_database_url(database_url)?;

    let client = match target.sslrootcert {
        Some(path) => {
            let connector = create_ssl_connector(&path)?;
            let (client, connection) = tokio_postgres::connect(&target.url, connector).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!("Connection error: {}", e);
                }
            });
            client
        }
        None => {
            let (client, connection) = tokio_postgres::connect(&target.url, NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!("Connection error: {}", e);
                }
            });
            client
        }
    };

    Ok(client)
}

/// Open a connection and run `operation` on it, once.
///
/// Connecting and the operation together must finish within `limit`. Failures are
/// returned to the caller, never retried.
pub async fn execute_with_timeout<F, Fut, T>(
    database_url: &str,
    limit: Duration,
    operation: F,
) -> Result<T, StorageError>
where
    F: FnOnce(Client) -> Fut,
    Fut: Future<Output = Result<T, tokio_postgres::Error>>,
{
    let attempt = async {
        let client = connect(database_url).await?;
        operation(client).await.map_err(StorageError::from)
    };

    match timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(limit)),
    }
}
