use std::collections::HashMap;
use std::hash::BuildHasher;

use yasna::models::ObjectIdentifier;
use yasna::{ASN1Result, BERReader, DERWriterSeq, Tag};

use crate::error::ExternalError;
use crate::ext::{decode_octet_string, Extension};
use crate::{oid, Error, KeyIdMethod, KeyPair, SignatureAlgorithm};

/// The subjectPublicKeyInfo of an issuer certificate
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SubjectPublicKeyInfo {
	/// The key's algorithm OID, e.g. rsaEncryption or id-ecPublicKey
	pub algorithm: Vec<u64>,
	/// The named curve, for elliptic curve keys
	pub curve: Option<Vec<u64>>,
	/// The subjectPublicKey bits
	pub key: Vec<u8>,
}

impl SubjectPublicKeyInfo {
	fn read_der(reader: BERReader) -> ASN1Result<Self> {
		reader.read_sequence(|reader| {
			let (algorithm, curve) = reader.next().read_sequence(|reader| {
				let algorithm = reader.next().read_oid()?;
				// NULL for RSA, a curve OID for EC keys, absent for Ed25519,
				// anything else for key types we can't sign with anyway.
				let params = reader.read_optional(|reader| reader.read_der())?;
				let curve = params.and_then(|params| {
					yasna::parse_der(&params, |reader| reader.read_oid()).ok()
				});
				Ok((algorithm, curve))
			})?;
			let (key, _bits) = reader.next().read_bitvec_bytes()?;
			Ok(Self {
				algorithm: algorithm.components().clone(),
				curve: curve.map(|curve: ObjectIdentifier| curve.components().clone()),
				key,
			})
		})
	}
}

/// The parts of an issuing CA's certificate needed to sign CRLs in its name
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IssuerCertificate {
	der: Vec<u8>,
	subject_der: Vec<u8>,
	public_key: SubjectPublicKeyInfo,
	subject_key_identifier: Option<Vec<u8>>,
	crl_sign_permitted: bool,
}

impl IssuerCertificate {
	/// Parses a DER encoded X.509 certificate
	pub fn from_der(der: &[u8]) -> Result<Self, Error> {
		let (subject_der, public_key, extensions) =
			yasna::parse_der(der, |reader| {
				reader.read_sequence(|reader| {
					let parsed = reader
						.next()
						.read_sequence(|reader| Self::read_tbs_certificate(reader))?;
					// signatureAlgorithm
					reader.next().read_der()?;
					// signatureValue
					reader.next().read_bitvec_bytes()?;
					Ok(parsed)
				})
			})
			.map_err(|_| Error::CouldNotParseCertificate)?;

		let mut subject_key_identifier = None;
		let mut crl_sign_permitted = true;
		for ext in &extensions {
			if ext.is(oid::OID_SUBJECT_KEY_IDENTIFIER) {
				let key_id =
					decode_octet_string(&ext.value).map_err(|_| Error::CouldNotParseCertificate)?;
				subject_key_identifier = Some(key_id);
			} else if ext.is(oid::OID_KEY_USAGE) {
				crl_sign_permitted = key_usage_has_crl_sign(&ext.value)?;
			}
		}

		Ok(Self {
			der: der.to_vec(),
			subject_der,
			public_key,
			subject_key_identifier,
			crl_sign_permitted,
		})
	}

	/// Parses a PEM encoded X.509 certificate
	pub fn from_pem(pem_str: &str) -> Result<Self, Error> {
		let certificate = pem::parse(pem_str)._err()?;
		if certificate.tag() != "CERTIFICATE" {
			return Err(Error::CouldNotParseCertificate);
		}
		Self::from_der(certificate.contents())
	}

	/// Parses a certificate that is either PEM text or raw DER
	pub fn from_pem_or_der(input: &[u8]) -> Result<Self, Error> {
		match std::str::from_utf8(input) {
			Ok(text) if text.trim_start().starts_with("-----BEGIN") => Self::from_pem(text),
			_ => Self::from_der(input),
		}
	}

	fn read_tbs_certificate(
		reader: &mut yasna::BERReaderSeq,
	) -> ASN1Result<(Vec<u8>, SubjectPublicKeyInfo, Vec<Extension>)> {
		// version [0] EXPLICIT Version DEFAULT v1
		reader.read_optional(|reader| {
			reader.read_tagged(Tag::context(0), |reader| reader.read_u64())
		})?;
		// serialNumber
		reader.next().read_bigint_bytes()?;
		// signature
		reader.next().read_der()?;
		// issuer
		reader.next().read_der()?;
		// validity
		reader.next().read_der()?;
		let subject_der = reader.next().read_der()?;
		let public_key = SubjectPublicKeyInfo::read_der(reader.next())?;
		// issuerUniqueID [1] IMPLICIT, subjectUniqueID [2] IMPLICIT
		for tag in [Tag::context(1), Tag::context(2)] {
			reader.read_optional(|reader| {
				reader.read_tagged_implicit(tag, |reader| reader.read_bitvec_bytes())
			})?;
		}
		let extensions = reader.read_optional(|reader| {
			reader.read_tagged(Tag::context(3), |reader| {
				let mut extensions = Vec::new();
				reader.read_sequence_of(|reader| {
					extensions.push(Extension::read_der(reader)?);
					Ok(())
				})?;
				Ok(extensions)
			})
		})?;
		Ok((subject_der, public_key, extensions.unwrap_or_default()))
	}

	/// The DER encoding of the whole certificate
	pub fn der(&self) -> &[u8] {
		&self.der
	}

	/// The subject Name, exactly as encoded in the certificate
	pub fn subject_der(&self) -> &[u8] {
		&self.subject_der
	}

	/// The certificate's subjectPublicKeyInfo
	pub fn public_key(&self) -> &SubjectPublicKeyInfo {
		&self.public_key
	}

	/// The subject key identifier extension's value, if present
	pub fn subject_key_identifier(&self) -> Option<&[u8]> {
		self.subject_key_identifier.as_deref()
	}

	/// Whether the key usage extension is absent or includes cRLSign
	pub fn crl_sign_permitted(&self) -> bool {
		self.crl_sign_permitted
	}
}

fn key_usage_has_crl_sign(value: &[u8]) -> Result<bool, Error> {
	// KeyUsage ::= BIT STRING { ..., cRLSign (6), ... }
	let (bits, len) = yasna::parse_der(value, |reader| reader.read_bitvec_bytes())
		.map_err(|_| Error::CouldNotParseCertificate)?;
	Ok(len > 6 && bits.first().map_or(false, |byte| byte & 0x02 != 0))
}

/// A certificate authority that signs CRLs
///
/// Holds the issuer certificate and, optionally, the key pair belonging to it.
/// An issuer without a key can still be resolved and inspected, but every
/// attempt to sign with it fails with [`Error::SigningError`].
#[derive(Debug)]
pub struct Issuer {
	certificate: IssuerCertificate,
	key_pair: Option<KeyPair>,
	key_identifier_method: KeyIdMethod,
}

impl Issuer {
	/// Pairs a certificate with its private key
	///
	/// Fails with [`Error::CertificateKeyPairMismatch`] if the key pair's
	/// public key is not the one in the certificate.
	pub fn new(certificate: IssuerCertificate, key_pair: KeyPair) -> Result<Self, Error> {
		if key_pair.public_key_raw() != certificate.public_key.key.as_slice() {
			return Err(Error::CertificateKeyPairMismatch);
		}
		Ok(Self {
			certificate,
			key_pair: Some(key_pair),
			key_identifier_method: KeyIdMethod::default(),
		})
	}

	/// An issuer whose private key is not available
	pub fn without_key(certificate: IssuerCertificate) -> Self {
		Self {
			certificate,
			key_pair: None,
			key_identifier_method: KeyIdMethod::default(),
		}
	}

	/// Parses the certificate and private key from PEM
	pub fn from_pem(certificate_pem: &str, key_pem: &str) -> Result<Self, Error> {
		Self::new(
			IssuerCertificate::from_pem(certificate_pem)?,
			KeyPair::from_pem(key_pem)?,
		)
	}

	/// Sets the method to derive the authority key identifier with when
	/// the certificate has no subject key identifier
	pub fn with_key_identifier_method(mut self, method: KeyIdMethod) -> Self {
		self.key_identifier_method = method;
		self
	}

	/// The issuer's certificate
	pub fn certificate(&self) -> &IssuerCertificate {
		&self.certificate
	}

	/// The issuer's key pair, if any
	pub fn key_pair(&self) -> Option<&KeyPair> {
		self.key_pair.as_ref()
	}

	/// The key identifier written into the authority key identifier extension
	///
	/// This is the certificate's subject key identifier if it has one, so that
	/// relying parties can match the CRL to the certificate. Otherwise it is
	/// derived from the public key.
	pub fn key_identifier(&self) -> Vec<u8> {
		match self.certificate.subject_key_identifier() {
			Some(ski) => ski.to_vec(),
			None => self
				.key_identifier_method
				.derive(&self.certificate.public_key.key),
		}
	}

	/// The algorithm CRLs signed by this issuer use
	pub fn signature_algorithm(&self) -> Result<&'static SignatureAlgorithm, Error> {
		SignatureAlgorithm::for_public_key(&self.certificate.public_key)
	}

	pub(crate) fn sign_der(
		&self,
		alg: &'static SignatureAlgorithm,
		f: impl FnOnce(&mut DERWriterSeq<'_>) -> Result<(), Error>,
	) -> Result<Vec<u8>, Error> {
		let key_pair = self
			.key_pair
			.as_ref()
			.ok_or_else(|| Error::SigningError("the issuer has no private key".to_string()))?;
		key_pair.sign_der(alg, f)
	}
}

/// Looks up issuers by reference, e.g. an issuer ID or name
///
/// The engine resolves the issuer once before a build starts and never
/// consults the resolver again.
pub trait IssuerResolver {
	/// Returns the issuer `reference` refers to, or [`Error::IssuerNotFound`]
	fn resolve(&self, reference: &str) -> Result<&Issuer, Error>;
}

impl<S: BuildHasher> IssuerResolver for HashMap<String, Issuer, S> {
	fn resolve(&self, reference: &str) -> Result<&Issuer, Error> {
		self.get(reference)
			.ok_or_else(|| Error::IssuerNotFound(reference.to_string()))
	}
}
