use time::OffsetDateTime;
use yasna::{DERWriter, Tag};

use crate::decode::SourceCrl;
use crate::ext::{Extension, Extensions};
use crate::format::OutputFormat;
use crate::issuer::Issuer;
use crate::{check_encodable_dt, dt_strip_nanos, write_dt_utc_or_generalized};
use crate::{Error, SerialNumber, SignatureAlgorithm};

/// Identifies the reason a certificate was revoked.
/// See RFC 5280 §5.3.1[^1]
///
/// [^1] <https://www.rfc-editor.org/rfc/rfc5280#section-5.3.1>
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[allow(missing_docs)] // Not much to add above the code name.
pub enum RevocationReason {
	Unspecified = 0,
	KeyCompromise = 1,
	CaCompromise = 2,
	AffiliationChanged = 3,
	Superseded = 4,
	CessationOfOperation = 5,
	CertificateHold = 6,
	// 7 is not defined.
	RemoveFromCrl = 8,
	PrivilegeWithdrawn = 9,
	AaCompromise = 10,
}

impl RevocationReason {
	/// Maps a CRLReason code to its enum value
	pub fn from_code(code: i64) -> Option<Self> {
		use RevocationReason::*;
		Some(match code {
			0 => Unspecified,
			1 => KeyCompromise,
			2 => CaCompromise,
			3 => AffiliationChanged,
			4 => Superseded,
			5 => CessationOfOperation,
			6 => CertificateHold,
			8 => RemoveFromCrl,
			9 => PrivilegeWithdrawn,
			10 => AaCompromise,
			_ => return None,
		})
	}
}

/// A revoked certificate as listed in a CRL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
	/// Serial number identifying the revoked certificate.
	pub serial_number: SerialNumber,
	/// The date at which the CA processed the revocation.
	pub revocation_time: OffsetDateTime,
	/// The reason code found in the entry's extensions, if any.
	pub reason_code: Option<RevocationReason>,
	/// The DER encoded `crlEntryExtensions` SEQUENCE, carried over verbatim.
	///
	/// When absent, a reason code extension is synthesized from
	/// [`RevocationEntry::reason_code`], unless the reason is unspecified.
	pub extensions: Option<Vec<u8>>,
}

impl RevocationEntry {
	/// An entry without reason or extensions
	pub fn new(serial_number: SerialNumber, revocation_time: OffsetDateTime) -> Self {
		Self {
			serial_number,
			revocation_time,
			reason_code: None,
			extensions: None,
		}
	}

	fn write_der(&self, writer: DERWriter) {
		writer.write_sequence(|writer| {
			// Write serial number.
			// RFC 5280 §4.1.2.2:
			//    Note: Non-conforming CAs may issue certificates with serial numbers
			//    that are negative or zero.  Certificate users SHOULD be prepared to
			//    gracefully handle such certificates.
			self.serial_number.write_der(writer.next());

			// Write revocation date.
			write_dt_utc_or_generalized(writer.next(), self.revocation_time);

			// Write extensions if applicable.
			match (&self.extensions, self.reason_code) {
				(Some(extensions), _) => writer.next().write_der(extensions),
				(None, Some(reason)) if reason != RevocationReason::Unspecified => {
					writer.next().write_sequence(|writer| {
						Extension::reason_code(reason).write_der(writer.next());
					})
				},
				(None, _) => (),
			}
		})
	}
}

/// Parameters of a CRL to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlBuildSpec {
	/// The CRL number of the new CRL.
	pub crl_number: u64,
	/// The CRL number of the base CRL, making the new CRL a delta CRL.
	pub delta_base_number: Option<u64>,
	/// Time between thisUpdate and nextUpdate. Whole seconds only.
	pub next_update: std::time::Duration,
	/// Encoding of the result.
	pub format: OutputFormat,
	/// Decoded input CRLs, in request order.
	pub sources: Vec<SourceCrl>,
}

impl CrlBuildSpec {
	/// Whether a delta CRL is requested
	pub fn is_delta(&self) -> bool {
		self.delta_base_number.is_some()
	}
}

/// A freshly signed CRL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltCrl {
	this_update: OffsetDateTime,
	next_update: OffsetDateTime,
	crl_number: u64,
	delta_base_number: Option<u64>,
	entries: Vec<RevocationEntry>,
	extensions: Vec<Extension>,
	signature_algorithm: &'static SignatureAlgorithm,
	der: Vec<u8>,
}

impl BuiltCrl {
	/// Issue date of the CRL.
	pub fn this_update(&self) -> OffsetDateTime {
		self.this_update
	}
	/// The date by which the next CRL will be issued.
	pub fn next_update(&self) -> OffsetDateTime {
		self.next_update
	}
	/// The CRL number.
	pub fn crl_number(&self) -> u64 {
		self.crl_number
	}
	/// The base CRL number for delta CRLs.
	pub fn delta_base_number(&self) -> Option<u64> {
		self.delta_base_number
	}
	/// The revoked certificates, in the order they were written.
	pub fn entries(&self) -> &[RevocationEntry] {
		&self.entries
	}
	/// The CRL extensions, in the order they were written.
	pub fn extensions(&self) -> &[Extension] {
		&self.extensions
	}
	/// The algorithm the CRL was signed with.
	pub fn signature_algorithm(&self) -> &'static SignatureAlgorithm {
		self.signature_algorithm
	}
	/// The complete DER encoded `CertificateList`.
	pub fn der(&self) -> &[u8] {
		&self.der
	}
}

/// Assembles a CRL and signs it with the issuer's key.
///
/// `thisUpdate` is `now` truncated to whole seconds and `nextUpdate` lies
/// exactly `spec.next_update` after it. The issuer field is copied verbatim
/// from the subject of the issuer certificate.
///
/// Fails with [`Error::InvalidRequest`] if `spec.next_update` is zero or not
/// a whole number of seconds, or if a date falls outside the years
/// 0000-9999. Fails with [`Error::UnsupportedKeyType`] if no signature algorithm fits the
/// issuer's key, with [`Error::IssuerNotCrlSigner`] if the certificate's key
/// usage does not allow CRL signing, and with [`Error::SigningError`] if the
/// issuer has no key or signing fails. Nothing is returned in these cases.
pub fn build(
	issuer: &Issuer,
	spec: &CrlBuildSpec,
	entries: Vec<RevocationEntry>,
	extensions: Vec<Extension>,
	now: OffsetDateTime,
) -> Result<BuiltCrl, Error> {
	check_next_update(spec.next_update)?;
	let this_update = dt_strip_nanos(now.to_offset(time::UtcOffset::UTC));
	let next_update = time::Duration::try_from(spec.next_update)
		.ok()
		.and_then(|duration| this_update.checked_add(duration))
		.ok_or_else(|| Error::InvalidRequest("next_update is out of range".to_string()))?;
	check_encodable_dt(this_update, "this_update")?;
	check_encodable_dt(next_update, "next_update")?;
	for entry in &entries {
		check_encodable_dt(entry.revocation_time, "revocation_time")?;
	}

	let alg = issuer.signature_algorithm()?;
	if !issuer.certificate().crl_sign_permitted() {
		return Err(Error::IssuerNotCrlSigner);
	}
	let exts = Extensions::new(extensions)?;

	let tbs = TbsCertList {
		alg,
		issuer_der: issuer.certificate().subject_der(),
		this_update,
		next_update,
		entries: &entries,
		extensions: &exts,
	};
	let der = issuer.sign_der(alg, |writer| tbs.write(writer))?;

	tracing::debug!(
		alg = ?alg,
		entries = entries.len(),
		bytes = der.len(),
		"signed CRL"
	);

	Ok(BuiltCrl {
		this_update,
		next_update,
		crl_number: spec.crl_number,
		delta_base_number: spec.delta_base_number,
		entries,
		extensions: exts.into_vec(),
		signature_algorithm: alg,
		der,
	})
}

pub(crate) fn check_next_update(duration: std::time::Duration) -> Result<(), Error> {
	if duration.is_zero() {
		return Err(Error::InvalidRequest("next_update must be positive".into()));
	}
	if duration.subsec_nanos() != 0 {
		return Err(Error::InvalidRequest(
			"next_update must be a whole number of seconds".into(),
		));
	}
	Ok(())
}

struct TbsCertList<'a> {
	alg: &'static SignatureAlgorithm,
	issuer_der: &'a [u8],
	this_update: OffsetDateTime,
	next_update: OffsetDateTime,
	entries: &'a [RevocationEntry],
	extensions: &'a Extensions,
}

impl TbsCertList<'_> {
	fn write(&self, writer: &mut yasna::DERWriterSeq) -> Result<(), Error> {
		// Write CRL version.
		// RFC 5280 §5.1.2.1:
		//   This optional field describes the version of the encoded CRL.  When
		//   extensions are used, as required by this profile, this field MUST be
		//   present and MUST specify version 2 (the integer value is 1).
		writer.next().write_u8(1);

		// Write algorithm identifier.
		// RFC 5280 §5.1.2.2:
		//   This field MUST contain the same algorithm identifier as the
		//   signatureAlgorithm field in the sequence CertificateList
		self.alg.write_alg_ident(writer.next());

		// Write issuer.
		// RFC 5280 §5.1.2.3:
		//   The issuer field MUST contain a non-empty X.500 distinguished name (DN).
		writer.next().write_der(self.issuer_der);

		// Write thisUpdate date.
		// RFC 5280 §5.1.2.4:
		//    This field indicates the issue date of this CRL.  thisUpdate may be
		//    encoded as UTCTime or GeneralizedTime.
		write_dt_utc_or_generalized(writer.next(), self.this_update);

		// Write nextUpdate date.
		// While OPTIONAL in the ASN.1 module, RFC 5280 §5.1.2.5 says:
		//   Conforming CRL issuers MUST include the nextUpdate field in all CRLs.
		write_dt_utc_or_generalized(writer.next(), self.next_update);

		// Write revokedCertificates.
		// RFC 5280 §5.1.2.6:
		//   When there are no revoked certificates, the revoked certificates list
		//   MUST be absent
		if !self.entries.is_empty() {
			writer.next().write_sequence(|writer| {
				for entry in self.entries {
					entry.write_der(writer.next());
				}
			});
		}

		// Write crlExtensions.
		// RFC 5280 §5.1.2.7:
		//   This field may only appear if the version is 2 (Section 5.1.2.1).  If
		//   present, this field is a sequence of one or more CRL extensions.
		if !self.extensions.is_empty() {
			writer.next().write_tagged(Tag::context(0), |writer| {
				self.extensions.write_der(writer);
			});
		}

		Ok(())
	}
}
