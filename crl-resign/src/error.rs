use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
/// The error type of the crl-resign crate
pub enum Error {
	/// A supplied CRL could not be decoded
	DecodeError {
		/// Index of the offending CRL in the request, if known
		position: Option<usize>,
		/// What was wrong with the input
		reason: String,
	},
	/// The requested issuer reference does not resolve to an issuer
	IssuerNotFound(String),
	/// The issuer's key type has no compatible signature algorithm
	UnsupportedKeyType,
	/// The signature algorithm OID is not one this crate knows
	UnsupportedSignatureAlgorithm,
	/// The requested output format is neither DER nor PEM
	UnsupportedFormat(String),
	/// The signing capability is unavailable or the signing operation failed
	SigningError(String),
	/// A request field is missing, malformed or out of range
	InvalidRequest(String),
	/// The issuer certificate could not be parsed
	CouldNotParseCertificate,
	/// The key pair could not be parsed
	CouldNotParseKeyPair,
	/// The key pair does not belong to the issuer certificate
	CertificateKeyPairMismatch,
	/// The issuer certificate's key usage does not include cRLSign
	IssuerNotCrlSigner,
	/// Two extensions with the same OID were supplied
	DuplicateExtension(String),
	/// Unspecified `ring` error
	RingUnspecified,
	/// The `ring` library rejected the key upon loading
	RingKeyRejected(String),
	/// An error from the `pem` crate
	PemError(String),
}

impl Error {
	/// Attaches the index of the offending input to a [`Error::DecodeError`].
	///
	/// Other variants are returned unchanged.
	pub fn at_position(self, index: usize) -> Self {
		match self {
			Error::DecodeError { reason, .. } => Error::DecodeError {
				position: Some(index),
				reason,
			},
			other => other,
		}
	}

	pub(crate) fn decode(reason: impl Into<String>) -> Self {
		Error::DecodeError {
			position: None,
			reason: reason.into(),
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			DecodeError {
				position: Some(position),
				reason,
			} => write!(f, "Could not decode CRL at position {position}: {reason}")?,
			DecodeError {
				position: None,
				reason,
			} => write!(f, "Could not decode CRL: {reason}")?,
			IssuerNotFound(reference) => write!(f, "Issuer not found: {reference}")?,
			UnsupportedKeyType => write!(
				f,
				"The issuer key type has no compatible signature algorithm"
			)?,
			UnsupportedSignatureAlgorithm => write!(f, "Unsupported signature algorithm")?,
			UnsupportedFormat(format) => write!(
				f,
				"Unsupported output format {format:?}, expected \"der\" or \"pem\""
			)?,
			SigningError(e) => write!(f, "Signing the CRL failed: {e}")?,
			InvalidRequest(e) => write!(f, "Invalid request: {e}")?,
			CouldNotParseCertificate => write!(f, "Could not parse the issuer certificate")?,
			CouldNotParseKeyPair => write!(f, "Could not parse key pair")?,
			CertificateKeyPairMismatch => write!(
				f,
				"The key pair does not match the issuer certificate's public key"
			)?,
			IssuerNotCrlSigner => write!(
				f,
				"The issuer certificate's key usage does not permit CRL signing"
			)?,
			DuplicateExtension(oid) => write!(f, "Extension with OID {oid} present multiple times")?,
			RingUnspecified => write!(f, "Unspecified ring error")?,
			RingKeyRejected(e) => write!(f, "Key rejected by ring: {e}")?,
			PemError(e) => write!(f, "PEM error: {e}")?,
		};
		Ok(())
	}
}

impl std::error::Error for Error {}

/// A trait describing an error that can be converted into a crl-resign [`Error`].
///
/// We use this trait to avoid leaking external error types into the public API
/// through a `From<x> for Error` implementation.
pub(crate) trait ExternalError<T>: Sized {
	fn _err(self) -> Result<T, Error>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn position_is_attached_to_decode_errors_only() {
		let err = Error::decode("truncated").at_position(3);
		assert_eq!(
			err,
			Error::DecodeError {
				position: Some(3),
				reason: "truncated".into()
			}
		);
		assert_eq!(
			err.to_string(),
			"Could not decode CRL at position 3: truncated"
		);

		assert_eq!(
			Error::UnsupportedKeyType.at_position(1),
			Error::UnsupportedKeyType
		);
	}
}
