//! PEM-armoured key material carried in JSON string fields.
//!
//! Chef returns keys as JSON strings holding a PEM document. Depending on the
//! endpoint the newlines arrive as real newlines, CRLF pairs, or a literal
//! `\n` escape that survived one round of quoting too many, so decoding
//! normalises them before the envelope is parsed.

mod certificate;
mod rsa_key;

use std::fmt::Display;

use tracing::warn;

use crate::error::{record_failure, CodecError, CodecResult};

pub use certificate::{Certificate, CertificateError};
pub use rsa_key::{PrivateKey, PublicKey, RsaKeyError};

const MISSING_HEADER: &str = "<missing PEM header>";

/// Key kinds that can be parsed from, and rendered to, a PEM document.
///
/// Implementations delegate to the cryptographic provider; envelope checks,
/// newline handling and error mapping are shared in [`decode_key`] and
/// [`encode_key`].
pub trait PemMaterial: Sized {
    /// Label between `-----BEGIN ` and the closing dashes, written on encode.
    const LABEL: &'static str;

    /// Older labels still accepted on decode.
    const LEGACY_LABELS: &'static [&'static str] = &[];

    type Error: Display;

    /// `label` is the accepted label found on the document's first line.
    fn from_pem(label: &str, pem: &str) -> Result<Self, Self::Error>;

    fn to_pem(&self) -> Result<String, Self::Error>;
}

/// Parses a JSON string value holding a PEM document of kind `T`.
pub fn decode_key<T: PemMaterial>(value: &str) -> CodecResult<T> {
    let pem = normalize_line_endings(value);
    let header = envelope_header(&pem);

    let decoded = match accepted_labels::<T>().find(|label| header == begin_marker(label)) {
        Some(label) => T::from_pem(label, &pem).map_err(|err| CodecError::key_format(header, err)),
        None => {
            let expected: Vec<String> = accepted_labels::<T>()
                .map(|label| format!("`{}`", begin_marker(label)))
                .collect();
            Err(CodecError::key_format(
                header,
                format!("expected {}", expected.join(" or ")),
            ))
        }
    };

    decoded.inspect_err(|err| {
        warn!(label = T::LABEL, %err, "rejecting key material");
        record_failure(err);
    })
}

/// Renders `key` as a PEM document with `\n` line endings.
pub fn encode_key<T: PemMaterial>(key: &T) -> CodecResult<String> {
    key.to_pem()
        .map_err(|err| CodecError::key_format(begin_marker(T::LABEL), err))
        .inspect_err(record_failure)
}

/// Collapses CRLF, lone CR and literal `\n` escapes into `\n` and ends the
/// document with exactly one newline.
pub fn normalize_line_endings(text: &str) -> String {
    let unified = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("\\n", "\n");
    format!("{}\n", unified.trim())
}

fn accepted_labels<T: PemMaterial>() -> impl Iterator<Item = &'static str> {
    std::iter::once(T::LABEL).chain(T::LEGACY_LABELS.iter().copied())
}

fn begin_marker(label: &str) -> String {
    format!("-----BEGIN {label}-----")
}

fn envelope_header(pem: &str) -> &str {
    pem.lines()
        .next()
        .map(str::trim)
        .filter(|line| line.starts_with("-----BEGIN "))
        .unwrap_or(MISSING_HEADER)
}

/// Implements `Serialize`/`Deserialize` as a JSON string through the PEM codec.
macro_rules! pem_string_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let pem = $crate::keys::encode_key(self)
                    .map_err(<S::Error as serde::ser::Error>::custom)?;
                serializer.serialize_str(&pem)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                $crate::keys::decode_key(&text).map_err(<D::Error as serde::de::Error>::custom)
            }
        }
    };
}

pub(crate) use pem_string_serde;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_every_newline_flavour() {
        let expected = "-----BEGIN X-----\nAAAA\n-----END X-----\n";
        assert_eq!(
            normalize_line_endings("-----BEGIN X-----\r\nAAAA\r\n-----END X-----\r\n"),
            expected
        );
        assert_eq!(
            normalize_line_endings(r"-----BEGIN X-----\nAAAA\n-----END X-----\n"),
            expected
        );
        assert_eq!(
            normalize_line_endings("\n  -----BEGIN X-----\nAAAA\n-----END X-----"),
            expected
        );
    }

    #[test]
    fn header_falls_back_when_missing() {
        assert_eq!(envelope_header("garbage\n"), MISSING_HEADER);
        assert_eq!(
            envelope_header("-----BEGIN CERTIFICATE-----\nAAAA\n"),
            "-----BEGIN CERTIFICATE-----"
        );
    }
}
