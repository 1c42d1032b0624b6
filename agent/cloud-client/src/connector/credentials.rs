use super::error::{self, CertificateError, ConnectorError, ConnectorResult};
use snafu::{ensure, ResultExt};
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

const PEM_BEGIN: &str = "-----BEGIN";
const PEM_END: &str = "-----END";
const ASN1_SEQUENCE: u8 = 0x30;

/// A management certificate that has been decoded and checked for well-formedness. Accepts either
/// a PEM block or the bare base64 form found in publish-settings files (a PKCS#12 bundle).
#[derive(Clone, Eq, PartialEq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    pub fn parse(text: &str) -> Result<Self, CertificateError> {
        let text = text.trim();
        ensure!(!text.is_empty(), error::EmptySnafu);
        let body = if text.starts_with(PEM_BEGIN) {
            pem_body(text)?
        } else {
            text.to_string()
        };
        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        ensure!(!compact.is_empty(), error::EmptySnafu);
        let der = base64::decode(compact).context(error::EncodingSnafu)?;
        check_der(&der)?;
        Ok(Self { der })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

impl Debug for Certificate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Certificate({} bytes)", self.der.len())
    }
}

/// A subscription id, which is a GUID.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn parse(value: &str) -> ConnectorResult<Self> {
        let value = value.trim();
        Uuid::parse_str(value)
            .map(Self)
            .context(error::InvalidSubscriptionSnafu { value })
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

/// A validated (subscription id, certificate) pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    subscription_id: SubscriptionId,
    certificate: Certificate,
}

impl Credentials {
    /// Validates the certificate first, so that a bad certificate is always reported as such.
    pub fn new(subscription_id: &str, certificate: &str) -> ConnectorResult<Self> {
        let certificate = Certificate::parse(certificate).context(error::InvalidCertificateSnafu)?;
        let subscription_id = SubscriptionId::parse(subscription_id)?;
        Ok(Self {
            subscription_id,
            certificate,
        })
    }

    /// Every problem with the pair, certificate first. An empty result means `new` would succeed.
    pub fn validate(subscription_id: &str, certificate: &str) -> Vec<ConnectorError> {
        let certificate = Certificate::parse(certificate).context(error::InvalidCertificateSnafu);
        let subscription_id = SubscriptionId::parse(subscription_id);
        certificate
            .err()
            .into_iter()
            .chain(subscription_id.err())
            .collect()
    }

    pub fn subscription_id(&self) -> &SubscriptionId {
        &self.subscription_id
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

/// Returns the base64 lines between the first `-----BEGIN` line and its `-----END` line.
fn pem_body(text: &str) -> Result<String, CertificateError> {
    let mut lines = text.lines().skip(1);
    let mut body = String::new();
    for line in lines.by_ref() {
        let line = line.trim();
        if line.starts_with(PEM_END) {
            return Ok(body);
        }
        // Skip RFC 1421 headers like `Proc-Type: 4,ENCRYPTED`.
        if !line.contains(':') {
            body.push_str(line);
        }
    }
    error::UnterminatedPemSnafu.fail()
}

/// Checks that `der` is a single ASN.1 SEQUENCE whose length header matches the payload. PKCS#12
/// exports from Windows use the BER indefinite length form, which ends in two zero bytes.
fn check_der(der: &[u8]) -> Result<(), CertificateError> {
    ensure!(der.len() >= 2 && der[0] == ASN1_SEQUENCE, error::NotDerSnafu);
    let first = der[1];
    if first == 0x80 {
        ensure!(der.len() >= 4 && der.ends_with(&[0, 0]), error::NotDerSnafu);
        return Ok(());
    }
    let (declared, header) = if first < 0x80 {
        (first as usize, 2)
    } else {
        let count = (first & 0x7f) as usize;
        ensure!((1..=4).contains(&count) && der.len() >= 2 + count, error::NotDerSnafu);
        let declared = der[2..2 + count]
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);
        (declared, 2 + count)
    };
    let actual = der.len() - header;
    ensure!(
        declared == actual,
        error::LengthMismatchSnafu { declared, actual }
    );
    Ok(())
}
