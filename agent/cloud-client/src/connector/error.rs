use snafu::Snafu;

pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// The error returned when an [`ApiConnector`] cannot be constructed. A broken connector cannot be
/// partially functional, so these are configuration errors that the operator has to fix.
///
/// [`ApiConnector`]: crate::ApiConnector
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConnectorError {
    #[snafu(display("Invalid management certificate: {}", source))]
    InvalidCertificate { source: CertificateError },

    #[snafu(display("Invalid subscription id '{}': {}", value, source))]
    InvalidSubscription { value: String, source: uuid::Error },
}

impl ConnectorError {
    pub fn is_invalid_certificate(&self) -> bool {
        matches!(self, ConnectorError::InvalidCertificate { .. })
    }
}

/// The reasons a management certificate can be rejected. None of the messages include any part of
/// the certificate.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CertificateError {
    #[snafu(display("the certificate is empty"))]
    Empty,

    #[snafu(display("the certificate is not valid base64"))]
    Encoding { source: base64::DecodeError },

    #[snafu(display("the PEM block has no matching END line"))]
    UnterminatedPem,

    #[snafu(display("the certificate is not a DER encoded ASN.1 structure"))]
    NotDer,

    #[snafu(display(
        "the certificate declares {} bytes of content but carries {}",
        declared,
        actual
    ))]
    LengthMismatch { declared: usize, actual: usize },
}
