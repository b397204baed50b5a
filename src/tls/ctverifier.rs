//! Multi-Log Certificate Transparency Verifier.
//!
//! Verifies embedded Signed Certificate Timestamps (SCTs) against a published
//! log list and applies a Chrome-style count policy.
//! Mirrors Chromium's `net/cert/multi_log_ct_verifier.cc`.
//!
//! ## Log list
//! Logs come from the v3 JSON schema Google publishes at
//! https://www.gstatic.com/ct/log_list/v3/log_list.json

use crate::base::neterror::NetError;
use crate::tls::chain::{spki_hash, CertificateChain};
use crate::tls::ct::{CtCompliance, CtComplianceOracle, LogListAdapter, Sct, SctStatus};
use crate::tls::precert::{validity_period, LeafTbs};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use boring::hash::{hash, MessageDigest};
use boring::pkey::PKey;
use boring::sign::Verifier;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const HASH_SHA256: u8 = 4;

/// Lifecycle state of a log, as published in the log list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    Pending,
    Qualified,
    Usable,
    ReadOnly,
    Retired { since: OffsetDateTime },
    Rejected,
}

impl LogState {
    /// Whether an SCT issued at `issued` by a log in this state counts.
    pub fn accepts(&self, issued: OffsetDateTime) -> bool {
        match self {
            LogState::Qualified | LogState::Usable | LogState::ReadOnly => true,
            LogState::Retired { since } => issued < *since,
            LogState::Pending | LogState::Rejected => false,
        }
    }
}

/// Information about a known CT log.
#[derive(Debug, Clone)]
pub struct CtLog {
    /// Log ID (SHA-256 hash of the log's public key, 32 bytes)
    pub id: [u8; 32],
    /// DER-encoded SubjectPublicKeyInfo (ECDSA P-256 or RSA)
    pub public_key: Vec<u8>,
    pub description: String,
    pub operator: String,
    pub state: LogState,
}

impl CtLog {
    /// Create a usable log whose ID is derived from its key.
    pub fn from_public_key(
        public_key: Vec<u8>,
        description: impl Into<String>,
    ) -> Result<Self, NetError> {
        let digest = hash(MessageDigest::sha256(), &public_key).map_err(|e| {
            NetError::CtLogListInvalid {
                reason: e.to_string(),
            }
        })?;
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        Ok(Self {
            id,
            public_key,
            description: description.into(),
            operator: String::new(),
            state: LogState::Usable,
        })
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    pub fn with_state(mut self, state: LogState) -> Self {
        self.state = state;
        self
    }
}

#[derive(Deserialize)]
struct RawLogList {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    log_list_timestamp: Option<String>,
    operators: Vec<RawOperator>,
}

#[derive(Deserialize)]
struct RawOperator {
    name: String,
    #[serde(default)]
    logs: Vec<RawLog>,
    #[serde(default)]
    tiled_logs: Vec<RawLog>,
}

#[derive(Deserialize)]
struct RawLog {
    #[serde(default)]
    description: String,
    log_id: String,
    key: String,
    #[serde(default)]
    state: Option<RawLogState>,
}

#[derive(Deserialize)]
struct RawStateTime {
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawLogState {
    Pending(RawStateTime),
    Qualified(RawStateTime),
    Usable(RawStateTime),
    Readonly(RawStateTime),
    Retired(RawStateTime),
    Rejected(RawStateTime),
}

impl RawLogState {
    fn resolve(&self) -> Result<LogState, time::error::Parse> {
        Ok(match self {
            RawLogState::Pending(_) => LogState::Pending,
            RawLogState::Qualified(_) => LogState::Qualified,
            RawLogState::Usable(_) => LogState::Usable,
            RawLogState::Readonly(_) => LogState::ReadOnly,
            RawLogState::Retired(at) => LogState::Retired {
                since: OffsetDateTime::parse(&at.timestamp, &Rfc3339)?,
            },
            RawLogState::Rejected(_) => LogState::Rejected,
        })
    }
}

/// A parsed log list.
#[derive(Debug, Clone)]
pub struct LogList {
    pub version: Option<String>,
    pub published: Option<OffsetDateTime>,
    pub logs: Vec<CtLog>,
}

impl LogList {
    /// Parse the v3 JSON schema.
    ///
    /// Entries with an undecodable key, or whose ID is not the SHA-256 of
    /// their key, are skipped.
    pub fn parse(bytes: &[u8]) -> Result<Self, NetError> {
        let raw: RawLogList =
            serde_json::from_slice(bytes).map_err(|e| NetError::CtLogListInvalid {
                reason: e.to_string(),
            })?;

        let published = raw
            .log_list_timestamp
            .as_deref()
            .and_then(|ts| OffsetDateTime::parse(ts, &Rfc3339).ok());

        let mut logs = Vec::new();
        for operator in raw.operators {
            for entry in operator.logs.iter().chain(operator.tiled_logs.iter()) {
                match Self::convert(entry, &operator.name) {
                    Ok(log) => logs.push(log),
                    Err(reason) => {
                        tracing::debug!(
                            operator = %operator.name,
                            log = %entry.description,
                            reason = %reason,
                            "skipping log list entry"
                        );
                    }
                }
            }
        }

        Ok(Self {
            version: raw.version,
            published,
            logs,
        })
    }

    fn convert(entry: &RawLog, operator: &str) -> Result<CtLog, String> {
        let key = STANDARD.decode(&entry.key).map_err(|e| e.to_string())?;
        let claimed = STANDARD.decode(&entry.log_id).map_err(|e| e.to_string())?;
        let log = CtLog::from_public_key(key, entry.description.clone())
            .map_err(|e| e.to_string())?
            .with_operator(operator);
        if claimed != log.id {
            return Err("log_id does not match key".to_string());
        }
        let state = match &entry.state {
            Some(state) => state.resolve().map_err(|e| e.to_string())?,
            None => LogState::Usable,
        };
        Ok(log.with_state(state))
    }
}

/// What an SCT's signature covers (RFC 6962, section 3.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedEntry {
    X509(Vec<u8>),
    Precert {
        issuer_key_hash: [u8; 32],
        /// TBSCertificate with the SCT list extension removed.
        tbs: Vec<u8>,
    },
}

impl SignedEntry {
    /// The `digitally-signed` struct input for `sct`.
    pub fn signed_data(&self, sct: &Sct) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.push(sct.version);
        out.push(0); // certificate_timestamp
        out.extend_from_slice(&sct.timestamp_ms.to_be_bytes());
        match self {
            SignedEntry::X509(cert) => {
                out.extend_from_slice(&0u16.to_be_bytes());
                push_u24(&mut out, cert);
            }
            SignedEntry::Precert {
                issuer_key_hash,
                tbs,
            } => {
                out.extend_from_slice(&1u16.to_be_bytes());
                out.extend_from_slice(issuer_key_hash);
                push_u24(&mut out, tbs);
            }
        }
        out.extend_from_slice(&(sct.extensions.len() as u16).to_be_bytes());
        out.extend_from_slice(&sct.extensions);
        out
    }
}

fn push_u24(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len() as u32;
    out.extend_from_slice(&len.to_be_bytes()[1..]);
    out.extend_from_slice(data);
}

/// Multi-log CT verifier.
///
/// Maintains a registry of known CT logs and verifies SCTs against them.
pub struct MultiLogCtVerifier {
    /// Map of Log ID -> Log info
    logs: Arc<DashMap<[u8; 32], CtLog>>,
}

impl Default for MultiLogCtVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiLogCtVerifier {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(DashMap::new()),
        }
    }

    pub fn from_log_list(list: LogList) -> Self {
        let verifier = Self::new();
        for log in list.logs {
            verifier.add_log(log);
        }
        verifier
    }

    pub fn add_log(&self, log: CtLog) {
        self.logs.insert(log.id, log);
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    pub fn has_log(&self, log_id: &[u8; 32]) -> bool {
        self.logs.contains_key(log_id)
    }

    pub fn operator_of(&self, log_id: &[u8; 32]) -> Option<String> {
        self.logs.get(log_id).map(|log| log.operator.clone())
    }

    /// Verify SCTs against known logs, one result per SCT.
    pub fn verify(
        &self,
        scts: &[Sct],
        entry: &SignedEntry,
        current_time: OffsetDateTime,
    ) -> Vec<(Sct, SctStatus)> {
        scts.iter()
            .map(|sct| (sct.clone(), self.verify_single_sct(sct, entry, current_time)))
            .collect()
    }

    fn verify_single_sct(
        &self,
        sct: &Sct,
        entry: &SignedEntry,
        current_time: OffsetDateTime,
    ) -> SctStatus {
        let Some(log) = self.logs.get(&sct.log_id) else {
            return SctStatus::UnknownLog;
        };

        let issued = match sct.timestamp() {
            Some(ts) if ts <= current_time => ts,
            _ => return SctStatus::FutureTimestamp,
        };

        if !log.state.accepts(issued) {
            return SctStatus::LogNotQualified;
        }

        if !Self::verify_signature(&log.public_key, sct, &entry.signed_data(sct)) {
            return SctStatus::InvalidSignature;
        }

        SctStatus::Valid
    }

    fn verify_signature(public_key: &[u8], sct: &Sct, data: &[u8]) -> bool {
        if sct.hash_algorithm != HASH_SHA256 || sct.signature.is_empty() {
            return false;
        }
        let Ok(key) = PKey::public_key_from_der(public_key) else {
            return false;
        };
        let Ok(mut verifier) = Verifier::new(MessageDigest::sha256(), &key) else {
            return false;
        };
        if verifier.update(data).is_err() {
            return false;
        }
        verifier.verify(&sct.signature).unwrap_or(false)
    }
}

/// How many SCTs a certificate needs.
#[derive(Debug, Clone)]
pub struct CtPolicy {
    /// Lifetimes up to this need `short_lifetime_scts`, longer ones `long_lifetime_scts`.
    pub short_lifetime: time::Duration,
    pub short_lifetime_scts: usize,
    pub long_lifetime_scts: usize,
    pub min_operators: usize,
}

impl Default for CtPolicy {
    fn default() -> Self {
        Self {
            short_lifetime: time::Duration::days(180),
            short_lifetime_scts: 2,
            long_lifetime_scts: 3,
            min_operators: 2,
        }
    }
}

impl CtPolicy {
    pub fn required_scts(&self, lifetime: time::Duration) -> usize {
        if lifetime <= self.short_lifetime {
            self.short_lifetime_scts
        } else {
            self.long_lifetime_scts
        }
    }

    pub fn evaluate(
        &self,
        results: &[(Sct, SctStatus)],
        verifier: &MultiLogCtVerifier,
        lifetime: time::Duration,
    ) -> CtCompliance {
        let logs: HashSet<[u8; 32]> = results
            .iter()
            .filter(|(_, status)| *status == SctStatus::Valid)
            .map(|(sct, _)| sct.log_id)
            .collect();
        let operators: HashSet<String> = logs
            .iter()
            .filter_map(|id| verifier.operator_of(id))
            .collect();

        let required = self.required_scts(lifetime);
        if logs.len() < required {
            return CtCompliance::non_compliant(format!(
                "{} valid SCTs from distinct logs, {} required",
                logs.len(),
                required
            ));
        }
        if operators.len() < self.min_operators {
            return CtCompliance::non_compliant(format!(
                "SCTs from {} operators, {} required",
                operators.len(),
                self.min_operators
            ));
        }
        CtCompliance::Compliant
    }
}

struct CachedLogList {
    written_at: OffsetDateTime,
    verifier: Arc<MultiLogCtVerifier>,
}

/// Compliance oracle backed by a log list and [`CtPolicy`].
///
/// Keeps the parsed list in memory while the source's cache policy allows.
#[derive(Default)]
pub struct LogListOracle {
    policy: CtPolicy,
    cached: Mutex<Option<CachedLogList>>,
}

impl LogListOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: CtPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When the cached log list was fetched, if one is held.
    pub fn cached_at(&self) -> Option<OffsetDateTime> {
        self.lock().as_ref().map(|entry| entry.written_at)
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedLogList>> {
        self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn verifier(
        &self,
        log_list: &LogListAdapter<'_>,
        now: OffsetDateTime,
    ) -> Result<Arc<MultiLogCtVerifier>, NetError> {
        let caching = log_list.caching_enabled();
        if caching {
            if let Some(entry) = self.lock().as_ref() {
                if !log_list.is_expired(entry.written_at, now) {
                    return Ok(Arc::clone(&entry.verifier));
                }
            }
        }

        let raw = log_list.raw_log()?;
        let list = LogList::parse(&raw)?;
        tracing::debug!(logs = list.logs.len(), version = ?list.version, "loaded CT log list");
        let verifier = Arc::new(MultiLogCtVerifier::from_log_list(list));

        if caching {
            *self.lock() = Some(CachedLogList {
                written_at: now,
                verifier: Arc::clone(&verifier),
            });
        }
        Ok(verifier)
    }
}

fn malformed(e: der::Error) -> NetError {
    tracing::debug!(error = %e, "malformed certificate during CT check");
    NetError::SslServerCertBadFormat
}

impl CtComplianceOracle for LogListOracle {
    fn check(
        &self,
        chain: &CertificateChain,
        log_list: &LogListAdapter<'_>,
    ) -> Result<CtCompliance, NetError> {
        let now = OffsetDateTime::now_utc();
        let verifier = self.verifier(log_list, now)?;

        let Some(issuer) = chain.issuer() else {
            return Ok(CtCompliance::non_compliant("issuer certificate unavailable"));
        };

        let leaf = chain.leaf().to_x509()?;
        let tbs = LeafTbs::from_der(chain.leaf().as_bytes()).map_err(malformed)?;
        let Some(list) = tbs.embedded_sct_list().map_err(malformed)? else {
            return Ok(CtCompliance::non_compliant("no embedded SCTs"));
        };
        let scts = decode_sct_list(&list)?;
        if scts.is_empty() {
            return Ok(CtCompliance::non_compliant("no embedded SCTs"));
        }

        let entry = SignedEntry::Precert {
            issuer_key_hash: spki_hash(&*issuer.to_x509()?)?,
            tbs: tbs.precert_tbs().map_err(malformed)?,
        };
        let results = verifier.verify(&scts, &entry, now);
        for (sct, status) in &results {
            tracing::debug!(log_id = %STANDARD.encode(sct.log_id), status = ?status, "SCT checked");
        }

        Ok(self
            .policy
            .evaluate(&results, &verifier, validity_period(&leaf)?))
    }
}

/// Decode a TLS-encoded SCT list (RFC 6962, section 3.3).
///
/// The SCT list format is:
/// - 2 bytes: total length of all SCTs
/// - For each SCT:
///   - 2 bytes: SCT length
///   - SCT data
///
/// Unparseable or non-v1 entries are skipped; a broken outer framing is an error.
pub fn decode_sct_list(data: &[u8]) -> Result<Vec<Sct>, NetError> {
    let mut reader = TlsReader::new(data);
    let total_len = reader.u16().ok_or(NetError::SslServerCertBadFormat)? as usize;
    let mut list = TlsReader::new(
        reader
            .take(total_len)
            .ok_or(NetError::SslServerCertBadFormat)?,
    );
    if !reader.is_empty() {
        return Err(NetError::SslServerCertBadFormat);
    }

    let mut scts = Vec::new();
    while !list.is_empty() {
        let sct_len = list.u16().ok_or(NetError::SslServerCertBadFormat)? as usize;
        let raw = list.take(sct_len).ok_or(NetError::SslServerCertBadFormat)?;
        match decode_single_sct(raw) {
            Some(sct) => scts.push(sct),
            None => tracing::debug!(len = raw.len(), "skipping undecodable SCT"),
        }
    }
    Ok(scts)
}

/// Encode SCTs as a TLS list, the inverse of [`decode_sct_list`].
pub fn encode_sct_list(scts: &[Sct]) -> Vec<u8> {
    let mut body = Vec::new();
    for sct in scts {
        let mut one = Vec::with_capacity(47 + sct.extensions.len() + sct.signature.len());
        one.push(sct.version);
        one.extend_from_slice(&sct.log_id);
        one.extend_from_slice(&sct.timestamp_ms.to_be_bytes());
        one.extend_from_slice(&(sct.extensions.len() as u16).to_be_bytes());
        one.extend_from_slice(&sct.extensions);
        one.push(sct.hash_algorithm);
        one.push(sct.signature_algorithm);
        one.extend_from_slice(&(sct.signature.len() as u16).to_be_bytes());
        one.extend_from_slice(&sct.signature);

        body.extend_from_slice(&(one.len() as u16).to_be_bytes());
        body.extend(one);
    }
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(&(body.len() as u16).to_be_bytes());
    out.extend(body);
    out
}

/// Decode a single v1 SCT:
/// version(1) log_id(32) timestamp(8) extensions(2+N)
/// hash_alg(1) sig_alg(1) signature(2+N)
fn decode_single_sct(data: &[u8]) -> Option<Sct> {
    let mut reader = TlsReader::new(data);

    let version = reader.u8()?;
    if version != 0 {
        return None;
    }
    let log_id: [u8; 32] = reader.take(32)?.try_into().ok()?;
    let timestamp_ms = u64::from_be_bytes(reader.take(8)?.try_into().ok()?);
    let ext_len = reader.u16()? as usize;
    let extensions = reader.take(ext_len)?.to_vec();
    let hash_algorithm = reader.u8()?;
    let signature_algorithm = reader.u8()?;
    let sig_len = reader.u16()? as usize;
    let signature = reader.take(sig_len)?.to_vec();

    if !reader.is_empty() {
        return None;
    }

    Some(Sct {
        version,
        log_id,
        timestamp_ms,
        extensions,
        hash_algorithm,
        signature_algorithm,
        signature,
    })
}

struct TlsReader<'a> {
    data: &'a [u8],
}

impl<'a> TlsReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.data.len() < n {
            return None;
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Some(head)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }
}
