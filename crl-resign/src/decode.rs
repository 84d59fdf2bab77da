use time::OffsetDateTime;
use yasna::{ASN1Error, ASN1Result, BERReader, BERReaderSeq, Tag};

use crate::crl::{RevocationEntry, RevocationReason};
use crate::error::ExternalError;
use crate::ext::Extension;
use crate::{oid, read_dt_utc_or_generalized, Error, SerialNumber, SignatureAlgorithm};

const PEM_LABEL: &str = "X509 CRL";

/// A CRL supplied by the caller, as decoded
///
/// Nothing about the CRL is verified: neither its signature, nor its
/// validity window, nor that its issuer has anything to do with the
/// issuer that will sign the merged CRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCrl {
	/// The version field's value: 0 for v1, 1 for v2
	pub version: u64,
	/// The issuer Name, exactly as encoded
	pub issuer_der: Vec<u8>,
	/// The OID of the signature algorithm named in the CRL
	pub signature_algorithm: Vec<u64>,
	/// Issue date of the CRL
	pub this_update: OffsetDateTime,
	/// The date by which the next CRL will be issued, if announced
	pub next_update: Option<OffsetDateTime>,
	/// Revoked certificates in the order they appear in the CRL
	pub entries: Vec<RevocationEntry>,
	/// The CRL extensions
	pub extensions: Vec<Extension>,
}

impl SourceCrl {
	/// The CRL number extension's value, if present and well formed
	pub fn crl_number(&self) -> Option<u64> {
		self.integer_extension(oid::OID_CRL_NUMBER)
	}

	/// The base CRL number of a delta CRL, if present and well formed
	pub fn delta_crl_indicator(&self) -> Option<u64> {
		self.integer_extension(oid::OID_DELTA_CRL_INDICATOR)
	}

	/// The signature algorithm, if it is one this crate can sign with
	pub fn known_signature_algorithm(&self) -> Result<&'static SignatureAlgorithm, Error> {
		SignatureAlgorithm::from_oid(&self.signature_algorithm)
	}

	fn integer_extension(&self, oid: &[u64]) -> Option<u64> {
		self.extensions
			.iter()
			.find(|ext| ext.is(oid))
			.and_then(|ext| ext.integer_value().ok())
	}
}

/// Decodes a CRL given either as PEM text or as raw DER.
///
/// PEM input must carry the `X509 CRL` label; leading whitespace is
/// tolerated. Versions 1 and 2 are accepted.
pub fn decode(input: &[u8]) -> Result<SourceCrl, Error> {
	let pem_text = std::str::from_utf8(input)
		.ok()
		.filter(|text| text.trim_start().starts_with("-----BEGIN"));
	match pem_text {
		Some(text) => {
			let parsed = pem::parse(text)
				.map_err(|e| Error::decode(format!("invalid PEM framing: {e}")))?;
			if parsed.tag() != PEM_LABEL {
				return Err(Error::decode(format!(
					"expected PEM label {PEM_LABEL:?}, found {:?}",
					parsed.tag()
				)));
			}
			decode_der(parsed.contents())
		},
		None if input.is_empty() => Err(Error::decode("empty input")),
		None => decode_der(input),
	}
}

fn decode_der(der: &[u8]) -> Result<SourceCrl, Error> {
	let crl = yasna::parse_der(der, |reader| {
		reader.read_sequence(|reader| {
			let crl = reader
				.next()
				.read_sequence(|reader| read_tbs_cert_list(reader))?;
			// signatureAlgorithm
			read_algorithm_identifier(reader.next())?;
			// signatureValue
			reader.next().read_bitvec_bytes()?;
			Ok(crl)
		})
	})
	._err()?;

	// Versions are 0 (v1, usually omitted) and 1 (v2)
	if crl.version > 1 {
		return Err(Error::decode(format!(
			"unsupported CRL version {}",
			crl.version + 1
		)));
	}
	Ok(crl)
}

fn read_tbs_cert_list(reader: &mut BERReaderSeq) -> ASN1Result<SourceCrl> {
	let version = reader.read_optional(|reader| reader.read_u64())?;
	let signature_algorithm = read_algorithm_identifier(reader.next())?;
	let issuer_der = reader.next().read_der()?;
	let this_update = read_dt_utc_or_generalized(reader.next())?;
	let next_update = reader.read_optional(read_dt_utc_or_generalized)?;
	let entries = reader.read_optional(|reader| {
		let mut entries = Vec::new();
		reader.read_sequence_of(|reader| {
			entries.push(read_revoked_certificate(reader)?);
			Ok(())
		})?;
		Ok(entries)
	})?;
	let extensions = reader.read_optional(|reader| {
		reader.read_tagged(Tag::context(0), |reader| {
			let mut extensions = Vec::new();
			reader.read_sequence_of(|reader| {
				extensions.push(Extension::read_der(reader)?);
				Ok(())
			})?;
			Ok(extensions)
		})
	})?;

	Ok(SourceCrl {
		version: version.unwrap_or(0),
		issuer_der,
		signature_algorithm,
		this_update,
		next_update,
		entries: entries.unwrap_or_default(),
		extensions: extensions.unwrap_or_default(),
	})
}

fn read_algorithm_identifier(reader: BERReader) -> ASN1Result<Vec<u64>> {
	reader.read_sequence(|reader| {
		let oid = reader.next().read_oid()?;
		// parameters
		reader.read_optional(|reader| reader.read_der())?;
		Ok(oid.components().clone())
	})
}

fn read_revoked_certificate(reader: BERReader) -> ASN1Result<RevocationEntry> {
	reader.read_sequence(|reader| {
		let serial_number = SerialNumber::read_der(reader.next())?;
		let revocation_time = read_dt_utc_or_generalized(reader.next())?;
		let extensions = reader.read_optional(|reader| reader.read_der())?;
		let reason_code = match &extensions {
			Some(extensions) => reason_code(extensions)?,
			None => None,
		};
		Ok(RevocationEntry {
			serial_number,
			revocation_time,
			reason_code,
			extensions,
		})
	})
}

pub(crate) fn reason_code(extensions: &[u8]) -> ASN1Result<Option<RevocationReason>> {
	let mut reason = None;
	yasna::parse_der(extensions, |reader| {
		reader.read_sequence_of(|reader| {
			let ext = Extension::read_der(reader)?;
			if ext.is(oid::OID_CRL_REASONS) {
				let code = yasna::parse_der(&ext.value, |reader| reader.read_enum())?;
				reason = RevocationReason::from_code(code);
			}
			Ok(())
		})
	})?;
	Ok(reason)
}

impl<T> ExternalError<T> for Result<T, ASN1Error> {
	fn _err(self) -> Result<T, Error> {
		self.map_err(|e| Error::decode(format!("malformed DER: {e}")))
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	const VAULT_CRL_1: &str = include_str!("../tests/data/vault_crl_1.pem");
	const REASONS_CRL: &[u8] = include_bytes!("../tests/data/reasons_crl.der");

	#[test]
	fn decodes_pem() {
		let crl = decode(VAULT_CRL_1.as_bytes()).unwrap();
		assert_eq!(crl.version, 1);
		assert_eq!(crl.crl_number(), Some(3));
		assert_eq!(crl.delta_crl_indicator(), None);
		assert_eq!(crl.this_update, datetime!(2022-10-26 21:29:39 UTC));
		assert_eq!(crl.next_update, Some(datetime!(2022-10-29 21:29:39 UTC)));
		assert_eq!(
			crl.known_signature_algorithm().unwrap(),
			&crate::PKCS_RSA_SHA256
		);
		assert_eq!(crl.entries.len(), 1);
		assert_eq!(
			crl.entries[0].serial_number,
			"4A:75:5F:F3:0B:1D:1E:33:AD:F5:DA:C2:60:58:56:C5:2F:50:A8:6A"
				.parse()
				.unwrap()
		);
	}

	#[test]
	fn leading_whitespace_is_tolerated() {
		let padded = format!("\n\n  {VAULT_CRL_1}");
		assert_eq!(
			decode(padded.as_bytes()).unwrap(),
			decode(VAULT_CRL_1.as_bytes()).unwrap()
		);
	}

	#[test]
	fn reason_codes_are_extracted() {
		let crl = decode(REASONS_CRL).unwrap();
		assert_eq!(crl.crl_number(), Some(7));
		let reasons: Vec<_> = crl.entries.iter().map(|e| e.reason_code).collect();
		assert_eq!(
			reasons,
			[
				Some(RevocationReason::KeyCompromise),
				Some(RevocationReason::Superseded),
				None
			]
		);
		assert!(crl.entries[0].extensions.is_some());
		assert!(crl.entries[2].extensions.is_none());
	}

	#[test]
	fn crl_without_extensions() {
		let crl = decode(include_bytes!("../tests/data/no_crl_extensions_crl.pem")).unwrap();
		assert!(crl.extensions.is_empty());
		assert_eq!(crl.crl_number(), None);
		assert_eq!(crl.entries.len(), 3);
		assert_eq!(crl.entries[2].serial_number, SerialNumber::from(0x1002));
	}

	#[test]
	fn wrong_pem_label() {
		let cert = include_str!("../tests/data/rsa_ca.pem");
		let err = decode(cert.as_bytes()).unwrap_err();
		assert!(matches!(
			err,
			Error::DecodeError { position: None, ref reason } if reason.contains("CERTIFICATE")
		));
	}

	#[test]
	fn malformed_input() {
		let truncated = &REASONS_CRL[..REASONS_CRL.len() - 10];
		assert!(matches!(decode(truncated), Err(Error::DecodeError { .. })));

		let mut trailing = REASONS_CRL.to_vec();
		trailing.push(0);
		assert!(matches!(decode(&trailing), Err(Error::DecodeError { .. })));

		assert!(matches!(decode(b""), Err(Error::DecodeError { .. })));
		assert!(matches!(
			decode(b"-----BEGIN X509 CRL-----\nnot base64\n"),
			Err(Error::DecodeError { .. })
		));
	}

	#[test]
	fn unsupported_version() {
		// A v2 CRL whose version field was bumped to 5
		let original = REASONS_CRL;
		// CertificateList and TBSCertList headers, then INTEGER 1
		let pos = original
			.windows(3)
			.position(|w| w == [0x02, 0x01, 0x01])
			.unwrap();
		let mut bumped = original.to_vec();
		bumped[pos + 2] = 4;
		assert_eq!(
			decode(&bumped).unwrap_err(),
			Error::decode("unsupported CRL version 5")
		);
	}
}
