use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::crl::{check_next_update, CrlBuildSpec, RevocationEntry};
use crate::decode::{self, decode, SourceCrl};
use crate::ext::{Extension, Extensions};
use crate::format::{EncodedCrl, OutputFormat};
use crate::merge::merge_entries;
use crate::{check_encodable_dt, oid, Error, SerialNumber};

/// A request to merge existing CRLs into a new one
///
/// JSON form:
///
/// ```json
/// {
///   "crl_number": "5",
///   "delta_crl_number": "4",
///   "next_update": "12h",
///   "format": "pem",
///   "crls": ["-----BEGIN X509 CRL-----\n..."]
/// }
/// ```
///
/// The CRL numbers may be JSON numbers or numeric strings. `next_update` is a
/// duration such as `"1h"` or `"90m"`, or a number of seconds. `format`
/// defaults to `"pem"`. Each of `crls` is PEM text or base64 encoded DER.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawResignCrlsRequest")]
pub struct ResignCrlsRequest {
	/// The CRL number of the new CRL.
	pub crl_number: u64,
	/// If set, the new CRL is a delta CRL against the base CRL with this number.
	pub delta_crl_number: Option<u64>,
	/// Time between thisUpdate and nextUpdate. Must be positive whole seconds.
	pub next_update: Duration,
	/// Encoding of the resulting CRL.
	pub format: OutputFormat,
	/// The CRLs to merge, each PEM text or DER bytes.
	pub crls: Vec<Vec<u8>>,
}

impl ResignCrlsRequest {
	/// Parses and validates a JSON request
	pub fn from_json(json: &str) -> Result<Self, Error> {
		let raw: RawResignCrlsRequest =
			serde_json::from_str(json).map_err(|e| Error::InvalidRequest(e.to_string()))?;
		Self::try_from(raw)
	}

	/// Validates the request and decodes every CRL in it.
	///
	/// A CRL that fails to decode is reported with its index in `crls`.
	pub fn into_spec(self) -> Result<CrlBuildSpec, Error> {
		check_next_update(self.next_update)?;
		if self.crls.is_empty() {
			return Err(Error::InvalidRequest(
				"at least one CRL must be supplied".into(),
			));
		}

		let sources = self
			.crls
			.iter()
			.enumerate()
			.map(|(i, crl)| decode(crl).map_err(|e| e.at_position(i)))
			.collect::<Result<Vec<SourceCrl>, Error>>()?;
		tracing::debug!(crls = sources.len(), "decoded source CRLs");

		Ok(CrlBuildSpec {
			crl_number: self.crl_number,
			delta_base_number: self.delta_crl_number,
			next_update: self.next_update,
			format: self.format,
			sources,
		})
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResignCrlsRequest {
	crl_number: RawInteger,
	#[serde(default)]
	delta_crl_number: Option<RawInteger>,
	next_update: RawDuration,
	#[serde(default)]
	format: Option<String>,
	crls: Vec<String>,
}

impl TryFrom<RawResignCrlsRequest> for ResignCrlsRequest {
	type Error = Error;

	fn try_from(raw: RawResignCrlsRequest) -> Result<Self, Error> {
		Ok(Self {
			crl_number: raw.crl_number.to_u64("crl_number")?,
			delta_crl_number: optional_integer(raw.delta_crl_number, "delta_crl_number")?,
			next_update: raw.next_update.to_duration()?,
			format: parse_format(raw.format.as_deref())?,
			crls: raw.crls.into_iter().map(crl_blob).collect(),
		})
	}
}

/// A request to sign a CRL from an explicit list of revoked certificates
///
/// Takes the same numbering, `next_update` and `format` fields as
/// [`ResignCrlsRequest`], with `revoked_certs` in place of `crls`:
///
/// ```json
/// {
///   "crl_number": 1,
///   "next_update": "24h",
///   "revoked_certs": [{
///     "serial_number": "4a:75:5f:f3",
///     "revocation_time": "2022-10-26T21:29:39Z",
///     "extensions": [{"id": "2.5.29.21", "critical": false, "value": "CgEB"}]
///   }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSignRevocationListRequest")]
pub struct SignRevocationListRequest {
	/// The CRL number of the new CRL.
	pub crl_number: u64,
	/// If set, the new CRL is a delta CRL against the base CRL with this number.
	pub delta_crl_number: Option<u64>,
	/// Time between thisUpdate and nextUpdate. Must be positive whole seconds.
	pub next_update: Duration,
	/// Encoding of the resulting CRL.
	pub format: OutputFormat,
	/// The certificates to list. May be empty.
	pub revoked_certs: Vec<RevokedCertRequest>,
}

impl SignRevocationListRequest {
	/// Parses and validates a JSON request
	pub fn from_json(json: &str) -> Result<Self, Error> {
		let raw: RawSignRevocationListRequest =
			serde_json::from_str(json).map_err(|e| Error::InvalidRequest(e.to_string()))?;
		Self::try_from(raw)
	}

	/// Validates the request and turns it into CRL parameters and the
	/// revocation entries to list, duplicates removed.
	pub fn into_parts(self) -> Result<(CrlBuildSpec, Vec<RevocationEntry>), Error> {
		check_next_update(self.next_update)?;
		let entries = self
			.revoked_certs
			.into_iter()
			.map(RevokedCertRequest::into_entry)
			.collect::<Result<Vec<_>, Error>>()?;
		let spec = CrlBuildSpec {
			crl_number: self.crl_number,
			delta_base_number: self.delta_crl_number,
			next_update: self.next_update,
			format: self.format,
			sources: Vec::new(),
		};
		Ok((spec, merge_entries(entries)))
	}
}

/// A revoked certificate to list in a CRL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRevokedCert")]
pub struct RevokedCertRequest {
	/// Serial number of the revoked certificate.
	pub serial_number: SerialNumber,
	/// When the certificate was revoked.
	pub revocation_time: OffsetDateTime,
	/// crlEntryExtensions of the entry, in order.
	pub extensions: Vec<Extension>,
}

impl RevokedCertRequest {
	/// Builds the CRL entry.
	///
	/// Fails if two extensions share an OID, or if a reason code extension
	/// does not hold a CRLReason.
	pub fn into_entry(self) -> Result<RevocationEntry, Error> {
		let extensions = Extensions::new(self.extensions)?.to_der();
		let reason_code = match &extensions {
			Some(der) => decode::reason_code(der).map_err(|_| {
				Error::InvalidRequest(format!(
					"malformed reason code for serial number {}",
					self.serial_number
				))
			})?,
			None => None,
		};
		Ok(RevocationEntry {
			serial_number: self.serial_number,
			revocation_time: self.revocation_time,
			reason_code,
			extensions,
		})
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSignRevocationListRequest {
	crl_number: RawInteger,
	#[serde(default)]
	delta_crl_number: Option<RawInteger>,
	next_update: RawDuration,
	#[serde(default)]
	format: Option<String>,
	#[serde(default)]
	revoked_certs: Vec<RawRevokedCert>,
}

impl TryFrom<RawSignRevocationListRequest> for SignRevocationListRequest {
	type Error = Error;

	fn try_from(raw: RawSignRevocationListRequest) -> Result<Self, Error> {
		Ok(Self {
			crl_number: raw.crl_number.to_u64("crl_number")?,
			delta_crl_number: optional_integer(raw.delta_crl_number, "delta_crl_number")?,
			next_update: raw.next_update.to_duration()?,
			format: parse_format(raw.format.as_deref())?,
			revoked_certs: raw
				.revoked_certs
				.into_iter()
				.map(RevokedCertRequest::try_from)
				.collect::<Result<_, _>>()?,
		})
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRevokedCert {
	serial_number: String,
	revocation_time: RawTime,
	#[serde(default)]
	extensions: Vec<RawExtension>,
}

impl TryFrom<RawRevokedCert> for RevokedCertRequest {
	type Error = Error;

	fn try_from(raw: RawRevokedCert) -> Result<Self, Error> {
		Ok(Self {
			serial_number: raw.serial_number.parse()?,
			revocation_time: raw.revocation_time.to_datetime()?,
			extensions: raw
				.extensions
				.into_iter()
				.map(RawExtension::into_extension)
				.collect::<Result<_, _>>()?,
		})
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExtension {
	id: String,
	#[serde(default)]
	critical: bool,
	value: String,
}

impl RawExtension {
	fn into_extension(self) -> Result<Extension, Error> {
		let oid = oid::parse_dotted(&self.id)
			.ok_or_else(|| Error::InvalidRequest(format!("invalid extension id {:?}", self.id)))?;
		let value = STANDARD.decode(self.value.trim()).map_err(|e| {
			Error::InvalidRequest(format!("extension {} value is not base64: {e}", self.id))
		})?;
		Ok(Extension::new(&oid, self.critical, value))
	}
}

/// The result of a resign or sign operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResignResponse {
	/// The new CRL.
	pub crl: EncodedCrl,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInteger {
	Unsigned(u64),
	Signed(i64),
	Text(String),
}

impl RawInteger {
	fn to_u64(&self, field: &str) -> Result<u64, Error> {
		let negative = || Error::InvalidRequest(format!("{field} must not be negative"));
		match self {
			RawInteger::Unsigned(n) => Ok(*n),
			RawInteger::Signed(_) => Err(negative()),
			RawInteger::Text(text) => {
				let text = text.trim();
				if let Ok(n) = text.parse::<u64>() {
					return Ok(n);
				}
				match text.parse::<i64>() {
					Ok(_) => Err(negative()),
					Err(_) => Err(Error::InvalidRequest(format!(
						"{field} is not a number: {text:?}"
					))),
				}
			},
		}
	}
}

fn optional_integer(raw: Option<RawInteger>, field: &str) -> Result<Option<u64>, Error> {
	raw.map(|raw| raw.to_u64(field)).transpose()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
	Seconds(u64),
	Fractional(f64),
	Text(String),
}

impl RawDuration {
	fn to_duration(&self) -> Result<Duration, Error> {
		let duration = match self {
			RawDuration::Seconds(secs) => Duration::from_secs(*secs),
			RawDuration::Fractional(secs) => {
				if !secs.is_finite() || *secs <= 0.0 {
					return Err(Error::InvalidRequest(
						"next_update must be positive".into(),
					));
				}
				Duration::try_from_secs_f64(*secs)
					.map_err(|e| Error::InvalidRequest(format!("invalid next_update: {e}")))?
			},
			RawDuration::Text(text) => {
				let text = text.trim();
				match text.parse::<u64>() {
					Ok(secs) => Duration::from_secs(secs),
					Err(_) => humantime::parse_duration(text).map_err(|e| {
						Error::InvalidRequest(format!("invalid next_update {text:?}: {e}"))
					})?,
				}
			},
		};
		check_next_update(duration)?;
		Ok(duration)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
	Unix(i64),
	Text(String),
}

impl RawTime {
	fn to_datetime(&self) -> Result<OffsetDateTime, Error> {
		let dt = match self {
			RawTime::Unix(secs) => OffsetDateTime::from_unix_timestamp(*secs)
				.map_err(|e| Error::InvalidRequest(format!("invalid revocation_time: {e}")))?,
			RawTime::Text(text) => OffsetDateTime::parse(text.trim(), &Rfc3339).map_err(|e| {
				Error::InvalidRequest(format!("invalid revocation_time {text:?}: {e}"))
			})?,
		};
		check_encodable_dt(dt, "revocation_time")?;
		Ok(dt)
	}
}

fn parse_format(format: Option<&str>) -> Result<OutputFormat, Error> {
	format.map_or(Ok(OutputFormat::default()), str::parse)
}

/// PEM text is kept as is, anything else is taken as base64 DER.
///
/// Text that is neither is passed on unchanged for the decoder to reject.
fn crl_blob(text: String) -> Vec<u8> {
	if text.trim_start().starts_with("-----BEGIN") {
		return text.into_bytes();
	}
	match STANDARD.decode(text.trim()) {
		Ok(der) => der,
		Err(_) => text.into_bytes(),
	}
}
