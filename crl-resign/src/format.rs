use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};

use crate::crl::BuiltCrl;
use crate::{Error, ENCODE_CONFIG};

const PEM_LABEL: &str = "X509 CRL";

/// Encoding of an issued CRL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
	/// Raw DER bytes
	Der,
	/// PEM text labelled `X509 CRL`
	#[default]
	Pem,
}

impl FromStr for OutputFormat {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Error> {
		match s.to_ascii_lowercase().as_str() {
			"der" => Ok(OutputFormat::Der),
			"pem" => Ok(OutputFormat::Pem),
			_ => Err(Error::UnsupportedFormat(s.to_string())),
		}
	}
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			OutputFormat::Der => "der",
			OutputFormat::Pem => "pem",
		})
	}
}

/// An issued CRL in its requested encoding
///
/// Serializes to a JSON string: PEM text as is, DER as standard base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedCrl {
	/// DER encoded `CertificateList`
	Der(Vec<u8>),
	/// PEM encoded `CertificateList`
	Pem(String),
}

impl EncodedCrl {
	/// The format this CRL is encoded in
	pub fn format(&self) -> OutputFormat {
		match self {
			EncodedCrl::Der(_) => OutputFormat::Der,
			EncodedCrl::Pem(_) => OutputFormat::Pem,
		}
	}

	/// The encoded bytes, ready to be written to a file
	pub fn as_bytes(&self) -> &[u8] {
		match self {
			EncodedCrl::Der(der) => der,
			EncodedCrl::Pem(pem) => pem.as_bytes(),
		}
	}
}

impl Serialize for EncodedCrl {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			EncodedCrl::Der(der) => serializer.serialize_str(&STANDARD.encode(der)),
			EncodedCrl::Pem(pem) => serializer.serialize_str(pem),
		}
	}
}

/// Encodes a signed CRL as DER or PEM.
pub fn encode(crl: &BuiltCrl, format: OutputFormat) -> EncodedCrl {
	match format {
		OutputFormat::Der => EncodedCrl::Der(crl.der().to_vec()),
		OutputFormat::Pem => {
			let p = pem::Pem::new(PEM_LABEL, crl.der());
			EncodedCrl::Pem(pem::encode_config(&p, ENCODE_CONFIG))
		},
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::{build, build_extensions, CrlBuildSpec, Issuer};

	fn signed_crl() -> BuiltCrl {
		let issuer = Issuer::from_pem(
			include_str!("../tests/data/ed25519_ca.pem"),
			include_str!("../tests/data/ed25519_ca.key"),
		)
		.unwrap();
		let spec = CrlBuildSpec {
			crl_number: 1,
			delta_base_number: None,
			next_update: Duration::from_secs(60),
			format: OutputFormat::Pem,
			sources: Vec::new(),
		};
		let extensions = build_extensions(&issuer, &spec);
		build(
			&issuer,
			&spec,
			Vec::new(),
			extensions,
			time::OffsetDateTime::now_utc(),
		)
		.unwrap()
	}

	#[test]
	fn format_names() {
		assert_eq!("PEM".parse::<OutputFormat>().unwrap(), OutputFormat::Pem);
		assert_eq!("der".parse::<OutputFormat>().unwrap(), OutputFormat::Der);
		assert_eq!(
			"txt".parse::<OutputFormat>().unwrap_err(),
			Error::UnsupportedFormat("txt".into())
		);
		assert_eq!(OutputFormat::default(), OutputFormat::Pem);
		assert_eq!(OutputFormat::Der.to_string(), "der");
	}

	#[test]
	fn pem_wraps_der() {
		let crl = signed_crl();
		let der = encode(&crl, OutputFormat::Der);
		assert_eq!(der, EncodedCrl::Der(crl.der().to_vec()));

		let EncodedCrl::Pem(text) = encode(&crl, OutputFormat::Pem) else {
			panic!("expected PEM output");
		};
		assert!(text.starts_with("-----BEGIN X509 CRL-----"));
		assert!(text.ends_with("-----END X509 CRL-----\n") || text.ends_with("\r\n"));
		assert!(text.lines().all(|line| line.len() <= 64));
		let parsed = pem::parse(&text).unwrap();
		assert_eq!(parsed.contents(), crl.der());
	}

	#[test]
	fn serializes_as_json_string() {
		let der = EncodedCrl::Der(vec![0x30, 0x03, 0x02, 0x01, 0x01]);
		assert_eq!(serde_json::to_string(&der).unwrap(), r#""MAMCAQE=""#);
		assert_eq!(der.format(), OutputFormat::Der);

		let pem = EncodedCrl::Pem("-----BEGIN X509 CRL-----\n".into());
		assert_eq!(
			serde_json::to_string(&pem).unwrap(),
			r#""-----BEGIN X509 CRL-----\n""#
		);
	}
}
