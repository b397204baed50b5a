#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::{BigNum, MsbOption};
use boring::ec::{EcGroup, EcKey};
use boring::hash::MessageDigest;
use boring::nid::Nid;
use boring::pkey::{PKey, Private};
use boring::sign::Signer;
use boring::ssl::{SslAcceptor, SslMethod};
use boring::x509::extension::{BasicConstraints, KeyUsage, SubjectAlternativeName};
use boring::x509::{X509Builder, X509Name, X509NameBuilder, X509};
use der::asn1::{BitString, OctetString};
use der::{Decode, Encode};
use rootgate::tls::chain::{CertificateBytes, CertificateChain};
use rootgate::tls::SCT_LIST_OID;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use x509_cert::ext::Extension;
use x509_cert::Certificate;

pub struct TestCert {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl TestCert {
    pub fn bytes(&self) -> CertificateBytes {
        CertificateBytes::from(self.cert.to_der().unwrap())
    }
}

pub fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(cn: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    name.build()
}

fn base_builder(
    cn: &str,
    key: &PKey<Private>,
    not_before: &Asn1Time,
    not_after: &Asn1Time,
) -> X509Builder {
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name(cn)).unwrap();
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(not_before).unwrap();
    builder.set_not_after(not_after).unwrap();
    builder
}

/// Self-signed CA valid for a year.
pub fn root_ca(cn: &str) -> TestCert {
    let key = ec_key();
    let mut builder = base_builder(
        cn,
        &key,
        &Asn1Time::days_from_now(0).unwrap(),
        &Asn1Time::days_from_now(365).unwrap(),
    );
    builder.set_issuer_name(&name(cn)).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    TestCert {
        cert: builder.build(),
        key,
    }
}

/// CA certificate for `cn` issued by `issuer`, valid for a year.
pub fn intermediate_ca(cn: &str, issuer: &TestCert) -> TestCert {
    let key = ec_key();
    let mut builder = base_builder(
        cn,
        &key,
        &Asn1Time::days_from_now(0).unwrap(),
        &Asn1Time::days_from_now(365).unwrap(),
    );
    builder
        .set_issuer_name(issuer.cert.subject_name())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.sign(&issuer.key, MessageDigest::sha256()).unwrap();
    TestCert {
        cert: builder.build(),
        key,
    }
}

fn issue(cn: &str, issuer: &TestCert, not_before: &Asn1Time, not_after: &Asn1Time) -> TestCert {
    let key = ec_key();
    let mut builder = base_builder(cn, &key, not_before, not_after);
    builder
        .set_issuer_name(issuer.cert.subject_name())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().build().unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .dns(cn)
        .build(&builder.x509v3_context(Some(&issuer.cert), None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&issuer.key, MessageDigest::sha256()).unwrap();
    TestCert {
        cert: builder.build(),
        key,
    }
}

/// End-entity certificate for `cn`, valid for `days`.
pub fn leaf(cn: &str, issuer: &TestCert, days: u32) -> TestCert {
    issue(
        cn,
        issuer,
        &Asn1Time::days_from_now(0).unwrap(),
        &Asn1Time::days_from_now(days).unwrap(),
    )
}

/// End-entity certificate whose validity ended an hour ago.
pub fn expired_leaf(cn: &str, issuer: &TestCert) -> TestCert {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    issue(
        cn,
        issuer,
        &Asn1Time::from_unix(now - 86_400).unwrap(),
        &Asn1Time::from_unix(now - 3600).unwrap(),
    )
}

pub fn chain(certs: &[&TestCert]) -> CertificateChain {
    CertificateChain::from_der_list(certs.iter().map(|c| c.bytes()).collect()).unwrap()
}

/// Extension carrying `sct_list` under the embedded-SCT OID.
pub fn sct_extension(sct_list: &[u8]) -> Extension {
    let inner = OctetString::new(sct_list).unwrap().to_der().unwrap();
    Extension {
        extn_id: SCT_LIST_OID,
        critical: false,
        extn_value: OctetString::new(inner).unwrap(),
    }
}

/// The TBSCertificate bytes of `cert`.
pub fn tbs_of(cert: &X509) -> Vec<u8> {
    let cert = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
    cert.tbs_certificate.to_der().unwrap()
}

/// Re-issue `cert` with `extension` appended, signed again by `issuer_key`.
pub fn with_extension(cert: &X509, extension: Extension, issuer_key: &PKey<Private>) -> X509 {
    let mut cert = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
    cert.tbs_certificate
        .extensions
        .get_or_insert_with(Vec::new)
        .push(extension);

    let mut signer = Signer::new(MessageDigest::sha256(), issuer_key).unwrap();
    signer
        .update(&cert.tbs_certificate.to_der().unwrap())
        .unwrap();
    cert.signature = BitString::from_bytes(&signer.sign_to_vec().unwrap()).unwrap();
    X509::from_der(&cert.to_der().unwrap()).unwrap()
}

/// TLS server presenting `chain`. Each accepted connection reports once the
/// client has gone away.
pub async fn tls_server(chain: &[&TestCert]) -> (SocketAddr, mpsc::UnboundedReceiver<()>) {
    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&chain[0].key).unwrap();
    acceptor.set_certificate(&chain[0].cert).unwrap();
    for extra in &chain[1..] {
        acceptor.add_extra_chain_cert(extra.cert.clone()).unwrap();
    }
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                if let Ok(mut stream) = tokio_boring::accept(&acceptor, socket).await {
                    let mut buf = [0u8; 1024];
                    loop {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => continue,
                        }
                    }
                }
                let _ = closed_tx.send(());
            });
        }
    });

    (addr, closed_rx)
}

/// TLS server answering every request with a fixed HTTP/1.1 body.
pub async fn https_server(leaf: &TestCert, body: Vec<u8>) -> SocketAddr {
    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&leaf.key).unwrap();
    acceptor.set_certificate(&leaf.cert).unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let Ok(mut stream) = tokio_boring::accept(&acceptor, socket).await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

/// TCP server that accepts and then says nothing. Reports when the client hangs up.
pub async fn silent_server() -> (SocketAddr, mpsc::UnboundedReceiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => continue,
                    }
                }
                let _ = closed_tx.send(());
            });
        }
    });

    (addr, closed_rx)
}
