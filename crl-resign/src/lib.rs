/*!
Rust X.509 CRL construction and resigning

This crate merges the revocation entries of one or more externally supplied
Certificate Revocation Lists into a single new CRL, signed by a designated
certificate authority. Base and delta CRLs are supported.

The most simple way of using this crate is by calling [`resign_crls`] with an
[`Issuer`] and a [`ResignCrlsRequest`]. The individual stages ([`decode`],
[`merge`], [`build_extensions`], [`build`] and [`encode`]) are public as well.

## Example

```no_run
use crl_resign::{resign_crls, Issuer, ResignCrlsRequest};
# fn main() -> Result<(), crl_resign::Error> {
let issuer = Issuer::from_pem(
	&std::fs::read_to_string("ca.pem").unwrap(),
	&std::fs::read_to_string("ca.key").unwrap(),
)?;
let request = ResignCrlsRequest::from_json(
	r#"{"crl_number": "2", "next_update": "1h", "format": "pem",
	    "crls": ["-----BEGIN X509 CRL-----\n..."]}"#,
)?;
let response = resign_crls(&issuer, request, time::OffsetDateTime::now_utc())?;
println!("{}", serde_json::to_string(&response).unwrap());
# Ok(())
# }
```
*/
#![forbid(unsafe_code)]
#![forbid(non_ascii_idents)]
#![deny(missing_docs)]
#![allow(clippy::complexity, clippy::style, clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use std::fmt;
use std::str::FromStr;

use time::{Duration, OffsetDateTime};
use yasna::models::{GeneralizedTime, UTCTime};
use yasna::tags::{TAG_GENERALIZEDTIME, TAG_UTCTIME};
use yasna::{ASN1Error, ASN1ErrorKind, ASN1Result, BERReader, DERWriter};

pub use crate::crl::{build, BuiltCrl, CrlBuildSpec, RevocationEntry, RevocationReason};
pub use crate::decode::{decode, SourceCrl};
pub use crate::engine::{resign_crls, resign_crls_for, sign_revocation_list};
pub use crate::error::Error;
pub use crate::ext::{
	build_extensions, decode_integer, decode_octet_string, encode_integer, encode_octet_string,
	Extension,
};
pub use crate::format::{encode, EncodedCrl, OutputFormat};
pub use crate::issuer::{Issuer, IssuerCertificate, IssuerResolver, SubjectPublicKeyInfo};
pub use crate::key_pair::{KeyPair, RemoteKeyPair};
pub use crate::merge::merge;
pub use crate::request::{
	ResignCrlsRequest, ResignResponse, RevokedCertRequest, SignRevocationListRequest,
};
pub use crate::sign_algo::algo::*;
pub use crate::sign_algo::SignatureAlgorithm;

mod crl;
mod decode;
mod engine;
mod error;
mod ext;
mod format;
mod issuer;
mod key_pair;
mod merge;
mod oid;
mod request;
mod ring_like;
mod sign_algo;

const ENCODE_CONFIG: pem::EncodeConfig = {
	let line_ending = match cfg!(target_family = "windows") {
		true => pem::LineEnding::CRLF,
		false => pem::LineEnding::LF,
	};
	pem::EncodeConfig::new().set_line_ending(line_ending)
};

/// Method to generate key identifiers from public keys.
///
/// This allows choice over methods to generate key identifiers
/// as specified in RFC 7093 section 2. It is only consulted when the
/// issuer certificate carries no subject key identifier of its own.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default)]
#[non_exhaustive]
pub enum KeyIdMethod {
	/// RFC 7093 method 1
	#[default]
	Sha256,
	/// RFC 7093 method 2
	Sha384,
	/// RFC 7093 method 3
	Sha512,
	/// Pre-specified identifier.
	PreSpecified(Vec<u8>),
}

impl KeyIdMethod {
	/// Derives a key identifier from the raw subjectPublicKey bits
	pub(crate) fn derive(&self, subject_public_key: &[u8]) -> Vec<u8> {
		use crate::ring_like::digest;
		// Decide which method from RFC 7093 to use
		let digest_method = match self {
			KeyIdMethod::Sha256 => &digest::SHA256,
			KeyIdMethod::Sha384 => &digest::SHA384,
			KeyIdMethod::Sha512 => &digest::SHA512,
			KeyIdMethod::PreSpecified(b) => {
				return b.to_vec();
			},
		};
		let digest = digest::digest(digest_method, subject_public_key);
		let truncated_digest = &digest.as_ref()[0..20];
		truncated_digest.to_vec()
	}
}

fn dt_strip_nanos(dt: OffsetDateTime) -> OffsetDateTime {
	// Set nanoseconds to zero
	// This is needed because the GeneralizedTime serializer would otherwise
	// output fractional values which RFC 5280 explicitly forbode [1].
	// UTCTime cannot express fractional seconds or leap seconds
	// therefore, it needs to be stripped of nanoseconds fully.
	// [1]: https://tools.ietf.org/html/rfc5280#section-4.1.2.5.2
	dt - Duration::nanoseconds(i64::from(dt.nanosecond()))
}

fn dt_to_generalized(dt: OffsetDateTime) -> GeneralizedTime {
	let date_time = dt_strip_nanos(dt);
	GeneralizedTime::from_datetime(date_time)
}

/// Fails unless `dt` can be written as UTCTime or GeneralizedTime.
///
/// GeneralizedTime has exactly four year digits.
pub(crate) fn check_encodable_dt(dt: OffsetDateTime, field: &str) -> Result<(), Error> {
	if (0..=9999).contains(&dt.year()) {
		Ok(())
	} else {
		Err(Error::InvalidRequest(format!(
			"{field} year {} is outside 0000-9999",
			dt.year()
		)))
	}
}

fn write_dt_utc_or_generalized(writer: DERWriter, dt: OffsetDateTime) {
	// RFC 5280 requires CAs to write CRL dates below 2050 as UTCTime,
	// and anything starting from 2050 as GeneralizedTime [1].
	// UTCTime can't represent dates before 1950 either.
	// [1]: https://tools.ietf.org/html/rfc5280#section-5.1.2.4
	if (1950..2050).contains(&dt.year()) {
		let date_time = dt_strip_nanos(dt);
		let ut = UTCTime::from_datetime(date_time);
		writer.write_utctime(&ut);
	} else {
		let gt = dt_to_generalized(dt);
		writer.write_generalized_time(&gt);
	}
}

fn read_dt_utc_or_generalized(reader: BERReader) -> ASN1Result<OffsetDateTime> {
	let tag = reader.lookahead_tag()?;
	if tag == TAG_UTCTIME {
		Ok(reader.read_utctime()?.datetime().to_owned())
	} else if tag == TAG_GENERALIZEDTIME {
		Ok(reader.read_generalized_time()?.datetime().to_owned())
	} else {
		Err(ASN1Error::new(ASN1ErrorKind::Invalid))
	}
}

/// A certificate serial number.
///
/// Serial numbers are arbitrary-precision integers. The magnitude is kept
/// big-endian without leading zero bytes, so two serials compare equal
/// exactly when their integer values do.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SerialNumber {
	inner: Vec<u8>,
	negative: bool,
}

impl SerialNumber {
	/// Create a serial number from the given big-endian byte slice.
	pub fn from_slice(bytes: &[u8]) -> SerialNumber {
		Self::from_magnitude(bytes, false)
	}

	fn from_magnitude(bytes: &[u8], negative: bool) -> SerialNumber {
		let start = bytes
			.iter()
			.position(|b| *b != 0)
			.unwrap_or(bytes.len().saturating_sub(1));
		let inner = match &bytes[start..] {
			[] => vec![0],
			magnitude => magnitude.to_vec(),
		};
		let negative = negative && inner != [0];
		SerialNumber { inner, negative }
	}

	/// Return the big-endian magnitude of the serial number.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.inner.clone()
	}

	/// Return the length of the serial number's magnitude in bytes.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Whether the serial number is below zero.
	///
	/// RFC 5280 forbids this, but CAs have issued such certificates and
	/// their revocations are carried over faithfully.
	pub fn is_negative(&self) -> bool {
		self.negative
	}

	pub(crate) fn write_der(&self, writer: DERWriter) {
		writer.write_bigint_bytes(&self.inner, !self.negative);
	}

	pub(crate) fn read_der(reader: BERReader) -> ASN1Result<Self> {
		let (magnitude, non_negative) = reader.read_bigint_bytes()?;
		Ok(Self::from_magnitude(&magnitude, !non_negative))
	}
}

impl fmt::Display for SerialNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
		if self.negative {
			f.write_str("-")?;
		}
		let hex: Vec<_> = self.inner.iter().map(|b| format!("{:02x}", b)).collect();
		write!(f, "{}", hex.join(":"))
	}
}

impl FromStr for SerialNumber {
	type Err = Error;

	/// Parses hex text such as `4a:75:5f` or `4A-75-5F` or `4a755f`
	fn from_str(s: &str) -> Result<Self, Error> {
		let digits: Vec<u8> = s
			.trim()
			.bytes()
			.filter(|b| !matches!(b, b':' | b'-'))
			.collect();
		if digits.is_empty() {
			return Err(Error::InvalidRequest("empty serial number".into()));
		}
		let invalid = || Error::InvalidRequest(format!("invalid hex serial number {s:?}"));
		// Left-pad odd-length input with a zero nibble
		let padded = if digits.len() % 2 == 1 {
			std::iter::once(b'0').chain(digits).collect::<Vec<_>>()
		} else {
			digits
		};
		let bytes = padded
			.chunks(2)
			.map(|pair| {
				std::str::from_utf8(pair)
					.ok()
					.and_then(|pair| u8::from_str_radix(pair, 16).ok())
					.ok_or_else(invalid)
			})
			.collect::<Result<Vec<u8>, Error>>()?;
		Ok(SerialNumber::from_slice(&bytes))
	}
}

impl From<Vec<u8>> for SerialNumber {
	fn from(inner: Vec<u8>) -> SerialNumber {
		SerialNumber::from_slice(&inner)
	}
}

impl From<u64> for SerialNumber {
	fn from(u: u64) -> SerialNumber {
		SerialNumber::from_slice(&u.to_be_bytes())
	}
}

impl AsRef<[u8]> for SerialNumber {
	fn as_ref(&self) -> &[u8] {
		&self.inner
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::panic::catch_unwind;
	use time::{Date, Month, PrimitiveDateTime, Time};

	fn get_times() -> [OffsetDateTime; 2] {
		let dt_nanos = {
			let date = Date::from_calendar_date(2020, Month::December, 3).unwrap();
			let time = Time::from_hms_nano(0, 0, 1, 444).unwrap();
			PrimitiveDateTime::new(date, time).assume_utc()
		};
		let dt_zero = {
			let date = Date::from_calendar_date(2020, Month::December, 3).unwrap();
			let time = Time::from_hms_nano(0, 0, 1, 0).unwrap();
			PrimitiveDateTime::new(date, time).assume_utc()
		};
		[dt_nanos, dt_zero]
	}

	#[test]
	fn test_dt_utc_strip_nanos() {
		let times = get_times();

		// No stripping - OffsetDateTime with nanos
		let res = catch_unwind(|| UTCTime::from_datetime(times[0]));
		assert!(res.is_err());

		// Stripping
		for dt in times {
			let date_time = dt_strip_nanos(dt);
			assert_eq!(date_time.time().nanosecond(), 0);
			assert_eq!(date_time.unix_timestamp(), times[1].unix_timestamp());
			let _ut = UTCTime::from_datetime(date_time);
		}
	}

	#[test]
	fn utc_or_generalized_by_year() {
		let in_utc_range = get_times()[1];
		let der = yasna::construct_der(|w| write_dt_utc_or_generalized(w, in_utc_range));
		assert_eq!(der[0], TAG_UTCTIME.tag_number as u8);
		let read = yasna::parse_der(&der, read_dt_utc_or_generalized).unwrap();
		assert_eq!(read, in_utc_range);

		let far_future = in_utc_range.replace_year(2051).unwrap();
		let der = yasna::construct_der(|w| write_dt_utc_or_generalized(w, far_future));
		assert_eq!(der[0], TAG_GENERALIZEDTIME.tag_number as u8);
		let read = yasna::parse_der(&der, read_dt_utc_or_generalized).unwrap();
		assert_eq!(read, far_future);
	}

	#[test]
	fn serial_number_normalization() {
		assert_eq!(
			SerialNumber::from_slice(&[0, 0, 0x5e, 0xed]),
			SerialNumber::from(0x5eed)
		);
		assert_eq!(SerialNumber::from(0).to_bytes(), vec![0]);
		assert_eq!(SerialNumber::from(0x5eed).to_string(), "5e:ed");
		assert_eq!(
			"4A-75-5F".parse::<SerialNumber>().unwrap(),
			"4a:75:5f".parse::<SerialNumber>().unwrap()
		);
		assert_eq!(
			"abc".parse::<SerialNumber>().unwrap(),
			SerialNumber::from(0xabc)
		);
		assert!("zz".parse::<SerialNumber>().is_err());
		assert!("::".parse::<SerialNumber>().is_err());
	}

	#[test]
	fn serial_number_der() {
		// High bit set: DER needs a leading zero byte to stay positive
		let serial = SerialNumber::from_slice(&[0x80, 0x01]);
		let der = yasna::construct_der(|w| serial.write_der(w));
		assert_eq!(der, [0x02, 0x03, 0x00, 0x80, 0x01]);
		assert_eq!(yasna::parse_der(&der, SerialNumber::read_der).unwrap(), serial);

		// -1
		let negative = yasna::parse_der(&[0x02, 0x01, 0xff], SerialNumber::read_der).unwrap();
		assert!(negative.is_negative());
		assert_eq!(negative.to_string(), "-01");
		let der = yasna::construct_der(|w| negative.write_der(w));
		assert_eq!(der, [0x02, 0x01, 0xff]);
	}

	#[test]
	fn key_identifier_is_truncated_digest() {
		let key = b"subject public key";
		assert_eq!(KeyIdMethod::Sha256.derive(key).len(), 20);
		assert_eq!(KeyIdMethod::Sha512.derive(key).len(), 20);
		assert_ne!(
			KeyIdMethod::Sha256.derive(key),
			KeyIdMethod::Sha384.derive(key)
		);
		assert_eq!(
			KeyIdMethod::PreSpecified(vec![1, 2, 3]).derive(key),
			vec![1, 2, 3]
		);
	}
}
