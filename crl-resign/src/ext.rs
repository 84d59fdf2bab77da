use std::collections::HashSet;

use yasna::models::ObjectIdentifier;
use yasna::{ASN1Result, BERReader, DERWriter, DERWriterSeq, Tag};

use crate::crl::{CrlBuildSpec, RevocationReason};
use crate::error::ExternalError;
use crate::issuer::Issuer;
use crate::{oid, Error};

/// An X.509v3 extension as carried in a CRL or a CRL entry.
///
/// ```text
/// Extension ::= SEQUENCE {
///   extnID    OBJECT IDENTIFIER,
///   critical  BOOLEAN DEFAULT FALSE,
///   extnValue OCTET STRING }
/// ```
///
/// `value` holds the DER encoding inside `extnValue`, without the
/// OCTET STRING wrapping.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Extension {
	/// The extension's object identifier components
	pub oid: Vec<u64>,
	/// Whether a relying party must reject the CRL if it does not understand the extension
	pub critical: bool,
	/// DER encoded extension value
	pub value: Vec<u8>,
}

impl Extension {
	/// Creates an extension from its parts
	pub fn new(oid: &[u64], critical: bool, value: Vec<u8>) -> Self {
		Self {
			oid: oid.to_vec(),
			critical,
			value,
		}
	}

	/// An authority key identifier extension according to
	/// [RFC 5280 5.2.1](https://www.rfc-editor.org/rfc/rfc5280#section-5.2.1).
	pub fn authority_key_identifier(key_identifier: &[u8]) -> Self {
		/*
			AuthorityKeyIdentifier ::= SEQUENCE {
				   keyIdentifier             [0] KeyIdentifier           OPTIONAL,
				   authorityCertIssuer       [1] GeneralNames            OPTIONAL,
				   authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL  }
			KeyIdentifier ::= OCTET STRING
		*/
		let value = yasna::construct_der(|writer| {
			writer.write_sequence(|writer| {
				writer
					.next()
					.write_tagged_implicit(Tag::context(0), |writer| {
						writer.write_bytes(key_identifier)
					})
			})
		});
		// Conforming CAs MUST mark this extension as non-critical.
		Self::new(oid::OID_AUTHORITY_KEY_IDENTIFIER, false, value)
	}

	/// A CRL number extension according to
	/// [RFC 5280 5.2.3](https://www.rfc-editor.org/rfc/rfc5280#section-5.2.3).
	pub fn crl_number(number: u64) -> Self {
		Self::new(oid::OID_CRL_NUMBER, false, encode_integer(number))
	}

	/// A delta CRL indicator extension according to
	/// [RFC 5280 5.2.4](https://www.rfc-editor.org/rfc/rfc5280#section-5.2.4).
	///
	/// `base_crl_number` names the complete CRL the delta applies to.
	pub fn delta_crl_indicator(base_crl_number: u64) -> Self {
		// The delta CRL indicator is a critical CRL extension.
		Self::new(
			oid::OID_DELTA_CRL_INDICATOR,
			true,
			encode_integer(base_crl_number),
		)
	}

	/// A CRL entry reason code extension according to
	/// [RFC 5280 5.3.1](https://www.rfc-editor.org/rfc/rfc5280#section-5.3.1).
	pub fn reason_code(reason: RevocationReason) -> Self {
		let value = yasna::construct_der(|writer| writer.write_enum(reason as i64));
		Self::new(oid::OID_CRL_REASONS, false, value)
	}

	/// Whether the extension has the given OID
	pub fn is(&self, oid: &[u64]) -> bool {
		self.oid == oid
	}

	/// Decodes the value as a non-negative INTEGER, as used by the CRL number
	/// and delta CRL indicator extensions
	pub fn integer_value(&self) -> Result<u64, Error> {
		decode_integer(&self.value)
	}

	pub(crate) fn write_der(&self, writer: DERWriter) {
		writer.write_sequence(|writer| {
			writer.next().write_oid(&ObjectIdentifier::from_slice(&self.oid));
			// DER forbids encoding the DEFAULT FALSE value
			if self.critical {
				writer.next().write_bool(true);
			}
			writer.next().write_bytes(&self.value);
		});
	}

	pub(crate) fn read_der(reader: BERReader) -> ASN1Result<Self> {
		reader.read_sequence(|reader| {
			let oid = reader.next().read_oid()?;
			let critical = reader.read_optional(|reader| reader.read_bool())?;
			let value = reader.next().read_bytes()?;
			Ok(Self {
				oid: oid.components().clone(),
				critical: critical.unwrap_or(false),
				value,
			})
		})
	}
}

/// A collection of X.509 extensions.
///
/// Preserves the order that extensions were added and maintains the invariant that
/// there are no duplicate extension OIDs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Extensions {
	exts: Vec<Extension>,
	oids: HashSet<Vec<u64>>,
}

impl Extensions {
	/// Construct a set of extensions from an iterator of extensions.
	///
	/// # Errors
	///
	/// Returns [Error::DuplicateExtension] if any of the extensions have the same OID.
	pub(crate) fn new(extensions: impl IntoIterator<Item = Extension>) -> Result<Self, Error> {
		let mut result = Self::default();
		for ext in extensions {
			result.add_extension(ext)?;
		}
		Ok(result)
	}

	/// Add an extension to the collection.
	///
	/// # Errors
	///
	/// Returns [Error::DuplicateExtension] if the extension's OID is already present in the collection.
	pub(crate) fn add_extension(&mut self, extension: Extension) -> Result<(), Error> {
		if self.oids.contains(&extension.oid) {
			return Err(Error::DuplicateExtension(oid::to_dotted(&extension.oid)));
		}

		self.oids.insert(extension.oid.clone());
		self.exts.push(extension);
		Ok(())
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.exts.is_empty()
	}

	pub(crate) fn into_vec(self) -> Vec<Extension> {
		self.exts
	}

	/// Write the SEQUENCE of extensions to the DER writer.
	///
	/// This will return without writing anything if there are no extensions in the collection.
	pub(crate) fn write_der(&self, writer: DERWriter) {
		debug_assert_eq!(self.exts.len(), self.oids.len());

		// Avoid writing an empty extensions sequence.
		if self.exts.is_empty() {
			return;
		}

		// Extensions ::= SEQUENCE SIZE (1..MAX) OF Extension
		writer.write_sequence(|writer| self.write_items(writer))
	}

	fn write_items(&self, writer: &mut DERWriterSeq) {
		for extension in &self.exts {
			extension.write_der(writer.next());
		}
	}

	/// DER encoding of the extensions SEQUENCE, or `None` if there are none
	pub(crate) fn to_der(&self) -> Option<Vec<u8>> {
		match self.is_empty() {
			true => None,
			false => Some(yasna::construct_der(|writer| self.write_der(writer))),
		}
	}
}

/// Builds the CRL extensions for a new CRL signed by `issuer`.
///
/// The extensions are, in order: the authority key identifier, the CRL
/// number, and, when `spec` describes a delta CRL, the delta CRL indicator.
/// Nothing else is added.
pub fn build_extensions(issuer: &Issuer, spec: &CrlBuildSpec) -> Vec<Extension> {
	let mut extensions = vec![
		Extension::authority_key_identifier(&issuer.key_identifier()),
		Extension::crl_number(spec.crl_number),
	];
	if let Some(base) = spec.delta_base_number {
		extensions.push(Extension::delta_crl_indicator(base));
	}
	extensions
}

/// DER encodes a non-negative INTEGER
pub fn encode_integer(value: u64) -> Vec<u8> {
	yasna::construct_der(|writer| writer.write_u64(value))
}

/// Decodes a DER INTEGER that must fit an unsigned 64 bit value
pub fn decode_integer(der: &[u8]) -> Result<u64, Error> {
	yasna::parse_der(der, |reader| reader.read_u64())._err()
}

/// Wraps `contents` into a DER OCTET STRING
pub fn encode_octet_string(contents: &[u8]) -> Vec<u8> {
	yasna::construct_der(|writer| writer.write_bytes(contents))
}

/// Unwraps the contents of a DER OCTET STRING
pub fn decode_octet_string(der: &[u8]) -> Result<Vec<u8>, Error> {
	yasna::parse_der(der, |reader| reader.read_bytes())._err()
}

#[cfg(test)]
mod extensions_tests {
	use super::*;

	fn dummy(oid: &[u64], critical: bool, der: &[u8]) -> Extension {
		Extension::new(oid, critical, der.to_vec())
	}

	#[test]
	fn test_no_duplicates() {
		let ext = dummy(oid::OID_CRL_NUMBER, false, &[0x02, 0x01, 0x01]);

		// It should be an error to add two extensions with the same OID.
		let mut exts = Extensions::default();
		exts.add_extension(ext.clone()).unwrap();
		assert_eq!(
			exts.add_extension(ext.clone()),
			Err(Error::DuplicateExtension("2.5.29.20".to_string())),
		);

		// Or to construct an extensions set from an iterator containing two extensions with the
		// same OID.
		assert_eq!(
			Extensions::new(vec![ext.clone(), ext]).unwrap_err(),
			Error::DuplicateExtension("2.5.29.20".to_string()),
		);
	}

	#[test]
	fn test_write_der() {
		let ext_a = dummy(&[1, 3, 6, 1, 4, 3], true, b"a");
		let ext_b = dummy(&[1, 3, 6, 1, 4, 2], false, b"b");

		// Extensions come out in the order they were added, ext_b's criticality
		// is elided, and values are wrapped into an OCTET STRING unmodified.
		let expected_der = vec![
			0x30, 0x1B, // exts SEQUENCE
			0x30, 0x0D, // ext_a SEQUENCE
			0x06, 0x05, 0x2B, 0x06, 0x01, 0x04, 0x03, // ext_a OID
			0x01, 0x01, 0xFF, // ext_a critical = true
			0x04, 0x01, 0x61, // ext_a OCTET STRING "a"
			0x30, 0x0A, // ext_b SEQUENCE
			0x06, 0x05, 0x2B, 0x06, 0x01, 0x04, 0x02, // ext_b OID
			0x04, 0x01, 0x62, // ext_b OCTET STRING "b"
		];

		let exts = Extensions::new(vec![ext_a.clone(), ext_b.clone()]).unwrap();
		assert_eq!(exts.to_der().unwrap(), expected_der);
		assert_eq!(Extensions::default().to_der(), None);

		let mut read = Vec::new();
		yasna::parse_der(&expected_der, |reader| {
			reader.read_sequence_of(|reader| {
				read.push(Extension::read_der(reader)?);
				Ok(())
			})
		})
		.unwrap();
		assert_eq!(read, vec![ext_a, ext_b]);
	}

	#[test]
	fn crl_extension_values() {
		let number = Extension::crl_number(2);
		assert!(!number.critical);
		assert_eq!(number.value, [0x02, 0x01, 0x02]);
		assert_eq!(number.integer_value(), Ok(2));

		let delta = Extension::delta_crl_indicator(0x80);
		assert!(delta.critical);
		assert!(delta.is(&[2, 5, 29, 27]));
		assert_eq!(delta.value, [0x02, 0x02, 0x00, 0x80]);

		let akid = Extension::authority_key_identifier(&[0xAA, 0xBB]);
		assert!(!akid.critical);
		assert_eq!(akid.value, [0x30, 0x04, 0x80, 0x02, 0xAA, 0xBB]);

		let reason = Extension::reason_code(RevocationReason::KeyCompromise);
		assert_eq!(reason.value, [0x0A, 0x01, 0x01]);
	}

	#[test]
	fn integer_and_octet_string_helpers() {
		assert_eq!(encode_integer(0), [0x02, 0x01, 0x00]);
		assert_eq!(encode_integer(256), [0x02, 0x02, 0x01, 0x00]);
		assert_eq!(decode_integer(&[0x02, 0x02, 0x01, 0x00]), Ok(256));
		assert!(decode_integer(&[0x02, 0x01, 0xFF]).is_err());
		assert!(decode_integer(&[0x04, 0x01, 0x00]).is_err());

		assert_eq!(encode_octet_string(b"hi"), [0x04, 0x02, b'h', b'i']);
		assert_eq!(decode_octet_string(&[0x04, 0x02, b'h', b'i']).unwrap(), b"hi");
		assert!(decode_octet_string(&[0x04, 0x05, b'h']).is_err());
	}
}
