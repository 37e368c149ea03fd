use rsa::pkcs8::spki::der::pem::{self, LineEnding};
use thiserror::Error;
use x509_parser::prelude::*;

use super::{pem_string_serde, PemMaterial};

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("invalid PEM envelope: {0}")]
    Envelope(String),
    #[error("unexpected PEM label `{0}`")]
    Label(String),
    #[error("failed to parse X.509 certificate: {0}")]
    Parse(String),
}

/// An X.509 certificate, kept as DER with the fields callers inspect most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    public_key: Vec<u8>,
}

impl Certificate {
    pub fn from_der(der: Vec<u8>) -> Result<Self, CertificateError> {
        let (subject, public_key) = {
            let (_, cert) = X509Certificate::from_der(&der)
                .map_err(|e| CertificateError::Parse(format!("{:?}", e)))?;
            (
                cert.subject().to_string(),
                cert.public_key().subject_public_key.data.to_vec(),
            )
        };

        Ok(Self {
            der,
            subject,
            public_key,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Distinguished name of the subject, e.g. `CN=chef-validator`.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Raw `subjectPublicKey` bit string contents.
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public_key
    }
}

impl PemMaterial for Certificate {
    const LABEL: &'static str = "CERTIFICATE";

    type Error = CertificateError;

    fn from_pem(_label: &str, text: &str) -> Result<Self, Self::Error> {
        let (label, der) = pem::decode_vec(text.as_bytes())
            .map_err(|err| CertificateError::Envelope(err.to_string()))?;
        if label != Self::LABEL {
            return Err(CertificateError::Label(label.to_string()));
        }
        Self::from_der(der)
    }

    fn to_pem(&self) -> Result<String, Self::Error> {
        pem::encode_string(Self::LABEL, LineEnding::LF, &self.der)
            .map_err(|err| CertificateError::Envelope(err.to_string()))
    }
}

pem_string_serde!(Certificate);
