//! One set of names for the `ring` and `aws-lc-rs` backends

#[cfg(feature = "aws_lc_rs")]
pub(crate) use aws_lc_rs::*;
#[cfg(all(feature = "ring", not(feature = "aws_lc_rs")))]
pub(crate) use ring::*;

use pki_types::PrivateKeyDer;

use self::rand::SystemRandom;
use self::signature::{EcdsaKeyPair, EcdsaSigningAlgorithm, RsaEncoding, RsaKeyPair};
use crate::error::ExternalError;
use crate::Error;

/// Loads an ECDSA key for the curve of `alg`.
///
/// `ring` only reads PKCS#8, `aws-lc-rs` also reads SEC1.
pub(crate) fn ecdsa_key_pair(
	alg: &'static EcdsaSigningAlgorithm,
	key: &PrivateKeyDer<'_>,
) -> Result<EcdsaKeyPair, Error> {
	#[cfg(all(feature = "ring", not(feature = "aws_lc_rs")))]
	{
		let PrivateKeyDer::Pkcs8(pkcs8) = key else {
			return Err(Error::CouldNotParseKeyPair);
		};
		EcdsaKeyPair::from_pkcs8(alg, pkcs8.secret_pkcs8_der(), &SystemRandom::new())._err()
	}

	#[cfg(feature = "aws_lc_rs")]
	{
		EcdsaKeyPair::from_private_key_der(alg, key.secret_der())._err()
	}
}

/// Loads a PKCS#8 or PKCS#1 RSA key
pub(crate) fn rsa_key_pair(key: &PrivateKeyDer<'_>) -> Result<RsaKeyPair, Error> {
	match key {
		PrivateKeyDer::Pkcs8(pkcs8) => RsaKeyPair::from_pkcs8(pkcs8.secret_pkcs8_der())._err(),
		PrivateKeyDer::Pkcs1(pkcs1) => RsaKeyPair::from_der(pkcs1.secret_pkcs1_der())._err(),
		_ => Err(Error::CouldNotParseKeyPair),
	}
}

/// PKCS#1 v1.5 signature over `msg`, as long as the key's modulus
pub(crate) fn rsa_sign(
	key_pair: &RsaKeyPair,
	encoding: &'static dyn RsaEncoding,
	msg: &[u8],
) -> Result<Vec<u8>, Error> {
	#[cfg(all(feature = "ring", not(feature = "aws_lc_rs")))]
	let modulus_len = key_pair.public().modulus_len();
	#[cfg(feature = "aws_lc_rs")]
	let modulus_len = key_pair.public_modulus_len();

	let mut signature = vec![0; modulus_len];
	key_pair
		.sign(encoding, &SystemRandom::new(), msg, &mut signature)
		._err()?;
	Ok(signature)
}

/// ASN.1 encoded ECDSA signature over `msg`
pub(crate) fn ecdsa_sign(key_pair: &EcdsaKeyPair, msg: &[u8]) -> Result<Vec<u8>, Error> {
	let signature = key_pair.sign(&SystemRandom::new(), msg)._err()?;
	Ok(signature.as_ref().to_vec())
}

#[cfg(not(any(feature = "ring", feature = "aws_lc_rs")))]
compile_error!("At least one of the 'ring' or 'aws_lc_rs' features must be activated");
