use std::fmt;

use pki_types::PrivateKeyDer;
use yasna::{DERWriter, DERWriterSeq};

use crate::error::ExternalError;
use crate::ring_like::{
	ecdsa_key_pair, ecdsa_sign, error as ring_error, rsa_key_pair, rsa_sign,
	signature::{EcdsaKeyPair, Ed25519KeyPair, KeyPair as RingKeyPair, RsaKeyPair},
};
use crate::sign_algo::{algo::*, SignAlgo, SignatureAlgorithm};
use crate::Error;

/// A key pair variant
#[allow(clippy::large_enum_variant)]
pub(crate) enum KeyPairKind {
	/// A Ecdsa key pair
	Ec(EcdsaKeyPair),
	/// A Ed25519 key pair
	Ed(Ed25519KeyPair),
	/// A RSA key pair
	Rsa(RsaKeyPair),
	/// A remote key pair
	Remote(Box<dyn RemoteKeyPair + Send + Sync>),
}

impl fmt::Debug for KeyPairKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Ec(key_pair) => write!(f, "{:?}", key_pair),
			Self::Ed(key_pair) => write!(f, "{:?}", key_pair),
			Self::Rsa(key_pair) => write!(f, "{:?}", key_pair),
			Self::Remote(_) => write!(f, "Box<dyn RemoteKeyPair>"),
		}
	}
}

/// The private half of an issuer, used to sign CRLs
///
/// Ed25519 keys are read from PKCS#8, RSA keys from PKCS#8 or PKCS#1.
/// ECDSA keys must be PKCS#8 with the `ring` backend; `aws_lc_rs`
/// also reads SEC1 (`openssl ecparam -genkey` output).
#[derive(Debug)]
pub struct KeyPair {
	pub(crate) kind: KeyPairKind,
	pub(crate) alg: &'static SignatureAlgorithm,
}

impl KeyPair {
	/// Returns the key pair's signature algorithm
	pub fn algorithm(&self) -> &'static SignatureAlgorithm {
		self.alg
	}

	/// Parses the key pair from the ASCII PEM format
	pub fn from_pem(pem_str: &str) -> Result<Self, Error> {
		let private_key = pem::parse(pem_str)._err()?;
		Self::try_from(private_key.contents())
	}

	/// Obtains the key pair from a raw public key and a remote private key
	pub fn from_remote(key_pair: Box<dyn RemoteKeyPair + Send + Sync>) -> Result<Self, Error> {
		Ok(Self {
			alg: key_pair.algorithm(),
			kind: KeyPairKind::Remote(key_pair),
		})
	}

	/// Get the raw public key of this key pair
	///
	/// The key is in raw format, as how [`ring::signature::KeyPair::public_key`]
	/// would output. This matches the contents of the BIT STRING inside
	/// a certificate's subjectPublicKeyInfo.
	pub fn public_key_raw(&self) -> &[u8] {
		match &self.kind {
			KeyPairKind::Ec(kp) => kp.public_key().as_ref(),
			KeyPairKind::Ed(kp) => kp.public_key().as_ref(),
			KeyPairKind::Rsa(kp) => kp.public_key().as_ref(),
			KeyPairKind::Remote(kp) => kp.public_key(),
		}
	}

	/// Check if this key pair can be used with the given signature algorithm
	///
	/// An RSA key pair is compatible with every RSA PKCS#1 digest variant.
	pub fn is_compatible(&self, signature_algorithm: &SignatureAlgorithm) -> bool {
		self.alg.same_key_type(signature_algorithm)
	}

	/// Access the remote key pair if it is a remote one
	pub fn as_remote(&self) -> Option<&(dyn RemoteKeyPair + Send + Sync)> {
		if let KeyPairKind::Remote(remote) = &self.kind {
			Some(remote.as_ref())
		} else {
			None
		}
	}

	/// Writes `SEQUENCE { tbs, signatureAlgorithm, signatureValue }`
	///
	/// `f` writes the contents of the to-be-signed sequence, which is then
	/// signed with `alg`.
	pub(crate) fn sign_der(
		&self,
		alg: &'static SignatureAlgorithm,
		f: impl FnOnce(&mut DERWriterSeq<'_>) -> Result<(), Error>,
	) -> Result<Vec<u8>, Error> {
		yasna::try_construct_der(|writer| {
			writer.write_sequence(|writer| {
				let data = yasna::try_construct_der(|writer| writer.write_sequence(f))?;
				writer.next().write_der(&data);

				// Write signatureAlgorithm
				alg.write_alg_ident(writer.next());

				// Write signature
				self.sign(alg, &data, writer.next())?;

				Ok(())
			})
		})
	}

	pub(crate) fn sign(
		&self,
		alg: &'static SignatureAlgorithm,
		msg: &[u8],
		writer: DERWriter,
	) -> Result<(), Error> {
		let signature = self.signature(alg, msg).map_err(|e| match e {
			Error::SigningError(_) => e,
			other => Error::SigningError(other.to_string()),
		})?;
		writer.write_bitvec_bytes(&signature, signature.len() * 8);
		Ok(())
	}

	fn signature(&self, alg: &'static SignatureAlgorithm, msg: &[u8]) -> Result<Vec<u8>, Error> {
		if !self.is_compatible(alg) {
			return Err(Error::SigningError(format!(
				"key pair of type {:?} cannot sign with {:?}",
				self.alg, alg
			)));
		}
		match (&self.kind, alg.sign_alg) {
			(KeyPairKind::Ec(kp), _) => ecdsa_sign(kp, msg),
			(KeyPairKind::Ed(kp), _) => Ok(kp.sign(msg).as_ref().to_vec()),
			(KeyPairKind::Rsa(kp), SignAlgo::Rsa(encoding)) => rsa_sign(kp, encoding, msg),
			(KeyPairKind::Rsa(_), _) => Err(Error::SigningError(format!(
				"{alg:?} is not an RSA signature algorithm"
			))),
			// A remote signer produces exactly one kind of signature
			(KeyPairKind::Remote(_), _) if self.alg != alg => Err(Error::SigningError(format!(
				"remote key pair signs with {:?}, not {:?}",
				self.alg, alg
			))),
			(KeyPairKind::Remote(kp), _) => kp.sign(msg),
		}
	}
}

impl TryFrom<&[u8]> for KeyPair {
	type Error = Error;

	fn try_from(key: &[u8]) -> Result<KeyPair, Error> {
		let key = &PrivateKeyDer::try_from(key).map_err(|_| Error::CouldNotParseKeyPair)?;

		key.try_into()
	}
}

impl TryFrom<Vec<u8>> for KeyPair {
	type Error = Error;

	fn try_from(key: Vec<u8>) -> Result<KeyPair, Error> {
		let key = &PrivateKeyDer::try_from(key).map_err(|_| Error::CouldNotParseKeyPair)?;

		key.try_into()
	}
}

impl TryFrom<&PrivateKeyDer<'_>> for KeyPair {
	type Error = Error;

	fn try_from(key: &PrivateKeyDer) -> Result<KeyPair, Error> {
		if let PrivateKeyDer::Pkcs8(pkcs8) = key {
			if let Ok(edkp) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(pkcs8.secret_pkcs8_der()) {
				return Ok(KeyPair {
					kind: KeyPairKind::Ed(edkp),
					alg: &PKCS_ED25519,
				});
			}
		}

		for alg in SignatureAlgorithm::iter() {
			let SignAlgo::EcDsa(curve) = alg.sign_alg else {
				continue;
			};
			if let Ok(eckp) = ecdsa_key_pair(curve, key) {
				return Ok(KeyPair {
					kind: KeyPairKind::Ec(eckp),
					alg,
				});
			}
		}

		match rsa_key_pair(key) {
			Ok(rsakp) => Ok(KeyPair {
				kind: KeyPairKind::Rsa(rsakp),
				alg: &PKCS_RSA_SHA256,
			}),
			Err(_) => Err(Error::CouldNotParseKeyPair),
		}
	}
}

/// A private key that is not directly accessible, but can be used to sign messages
///
/// Trait objects based on this trait can be passed to the [`KeyPair::from_remote`] function
/// to sign CRLs with a key held elsewhere, for example in an HSM.
pub trait RemoteKeyPair {
	/// Returns the public key of this key pair in the binary format as in [`KeyPair::public_key_raw`]
	fn public_key(&self) -> &[u8];

	/// Signs `msg` using the selected algorithm
	fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, Error>;

	/// Reveals the algorithm to be used when calling `sign()`
	fn algorithm(&self) -> &'static SignatureAlgorithm;
}

impl<T> ExternalError<T> for Result<T, ring_error::KeyRejected> {
	fn _err(self) -> Result<T, Error> {
		self.map_err(|e| Error::RingKeyRejected(e.to_string()))
	}
}

impl<T> ExternalError<T> for Result<T, ring_error::Unspecified> {
	fn _err(self) -> Result<T, Error> {
		self.map_err(|_| Error::RingUnspecified)
	}
}

impl<T> ExternalError<T> for Result<T, pem::PemError> {
	fn _err(self) -> Result<T, Error> {
		self.map_err(|e| Error::PemError(e.to_string()))
	}
}
