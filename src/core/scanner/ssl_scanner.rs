// src/core/scanner/ssl_scanner.rs

use chrono::{DateTime, Utc};
use native_tls::TlsConnector;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};
use x509_parser::prelude::*;

use crate::core::error::ScanError;
use crate::core::models::CertificateInfo;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the certificate a TLS endpoint presents, without validating it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateAnalyzer;

impl CertificateAnalyzer {
    /// Connects to `host:port`, completes a handshake that accepts any
    /// certificate and extracts subject, issuer, validity and SAN domains.
    ///
    /// `host` may be a bracketed IPv6 literal.
    pub async fn analyze(&self, host: &str, port: u16) -> Result<Option<CertificateInfo>, ScanError> {
        info!(target = %host, port, "Starting certificate analysis.");
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

        debug!("Spawning blocking task for TLS connection.");
        let outcome = spawn_blocking(move || fetch_certificate(&host, port)).await.unwrap_or_else(|e| {
            error!(panic = %e, "Blocking certificate task panicked!");
            Err(format!("task panicked: {e}"))
        });

        match outcome {
            Ok(info) => {
                if let Some(info) = &info {
                    info!(subject = %info.subject_name, domains = info.domains.len(), "Certificate analysis finished.");
                }
                Ok(info)
            }
            Err(reason) => Err(ScanError::stage("certificate analysis", reason)),
        }
    }
}

fn fetch_certificate(host: &str, port: u16) -> Result<Option<CertificateInfo>, String> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| format!("TlsConnector error: {e}"))?;

    let address = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("address resolution failed: {e}"))?
        .next()
        .ok_or_else(|| format!("{host} did not resolve"))?;

    debug!(%address, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&address, CONNECT_TIMEOUT).map_err(|e| format!("TCP connection error: {e}"))?;
    stream.set_read_timeout(Some(CONNECT_TIMEOUT)).map_err(|e| e.to_string())?;
    stream.set_write_timeout(Some(CONNECT_TIMEOUT)).map_err(|e| e.to_string())?;

    debug!(host, "Performing TLS handshake.");
    let stream = connector.connect(host, stream).map_err(|e| format!("TLS handshake error: {e}"))?;

    let cert = match stream.peer_certificate() {
        Ok(Some(cert)) => cert,
        Ok(None) => {
            debug!("TLS connection successful, but no peer certificate provided.");
            return Ok(None);
        }
        Err(e) => return Err(format!("could not get peer certificate: {e}")),
    };

    let der = cert.to_der().map_err(|e| format!("could not convert certificate to DER: {e}"))?;
    let (_, x509) = parse_x509_certificate(&der).map_err(|e| format!("X.509 parse error: {e}"))?;
    Ok(Some(certificate_info(&x509)))
}

fn certificate_info(x509: &X509Certificate<'_>) -> CertificateInfo {
    let validity = x509.validity();
    let not_after = asn1_time_to_chrono_utc(&validity.not_after);
    let not_before = asn1_time_to_chrono_utc(&validity.not_before);

    let mut domains: Vec<String> = match x509.subject_alternative_name() {
        Ok(Some(san)) => san
            .value
            .general_names
            .iter()
            .filter_map(|name| match name {
                GeneralName::DNSName(dns) => Some(strip_wildcard(dns)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    domains.sort();
    domains.dedup();

    CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_before,
        not_after,
        days_until_expiry: not_after.signed_duration_since(Utc::now()).num_days(),
        domains,
    }
}

/// `*.example.com` becomes `example.com`. Names are lowercased.
pub fn strip_wildcard(name: &str) -> String {
    name.trim_start_matches("*.").to_ascii_lowercase()
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
