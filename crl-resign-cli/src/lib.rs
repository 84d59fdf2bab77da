#![warn(missing_docs)]
//! This library wraps [crl_resign] for use from the command line: it loads
//! the issuer and the CRLs to merge from files and writes the new CRL out.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use crl_resign::{EncodedCrl, Issuer, IssuerCertificate, KeyPair};

/// A specialized `Result` type.
pub type Result<T> = anyhow::Result<T>;

/// Loads the issuer certificate and, if given, its private key.
///
/// The certificate may be PEM or DER. Without a key the issuer can be
/// inspected but not sign.
pub fn load_issuer(cert_path: &Path, key_path: Option<&Path>) -> Result<Issuer> {
	let cert = fs::read(cert_path)
		.with_context(|| format!("failed to read issuer certificate {}", cert_path.display()))?;
	let certificate = IssuerCertificate::from_pem_or_der(&cert)
		.with_context(|| format!("invalid issuer certificate {}", cert_path.display()))?;

	let Some(key_path) = key_path else {
		tracing::warn!("no issuer key given, signing will fail");
		return Ok(Issuer::without_key(certificate));
	};
	let key = fs::read_to_string(key_path)
		.with_context(|| format!("failed to read issuer key {}", key_path.display()))?;
	let key_pair = KeyPair::from_pem(&key)
		.with_context(|| format!("invalid issuer key {}", key_path.display()))?;
	Issuer::new(certificate, key_pair).context("issuer key does not match the certificate")
}

/// Reads every CRL file into memory, in order.
pub fn read_crls(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
	paths
		.iter()
		.map(|path| {
			fs::read(path).with_context(|| format!("failed to read CRL {}", path.display()))
		})
		.collect()
}

/// Writes the CRL to `output`, or to stdout if no path is given.
pub fn write_crl(crl: &EncodedCrl, output: Option<&Path>) -> Result<()> {
	match output {
		Some(path) => fs::write(path, crl.as_bytes())
			.with_context(|| format!("failed to write CRL to {}", path.display())),
		None => {
			let mut stdout = io::stdout().lock();
			stdout.write_all(crl.as_bytes())?;
			stdout.flush()?;
			Ok(())
		},
	}
}

#[cfg(test)]
mod tests {
	use assert_fs::prelude::*;

	use super::*;

	fn fixture(name: &str) -> PathBuf {
		Path::new(env!("CARGO_MANIFEST_DIR"))
			.join("../crl-resign/tests/data")
			.join(name)
	}

	#[test]
	fn loads_issuer_with_and_without_key() -> anyhow::Result<()> {
		let issuer = load_issuer(&fixture("rsa_ca.pem"), Some(&fixture("rsa_ca.key")))?;
		assert!(issuer.key_pair().is_some());

		let issuer = load_issuer(&fixture("p256_ca.pem"), None)?;
		assert!(issuer.key_pair().is_none());

		let mismatch = load_issuer(&fixture("p256_ca.pem"), Some(&fixture("rsa_ca.key")));
		assert!(mismatch.is_err());
		Ok(())
	}

	#[test]
	fn missing_files_name_the_path() {
		let err = read_crls(&[fixture("does_not_exist.crl")]).unwrap_err();
		assert!(err.to_string().contains("does_not_exist.crl"));
	}

	#[test]
	fn test_write_files() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		let der = temp.child("out.crl");
		let pem = temp.child("out.pem");

		const EMPTY_SEQUENCE: &[u8] = &[0x30, 0x00];
		write_crl(&EncodedCrl::Der(EMPTY_SEQUENCE.to_vec()), Some(der.path()))?;
		write_crl(&EncodedCrl::Pem("x".into()), Some(pem.path()))?;

		der.assert(EMPTY_SEQUENCE);
		pem.assert("x");
		Ok(())
	}

	#[test]
	fn reads_crls_in_order() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		let first = temp.child("first.crl");
		let second = temp.child("second.crl");
		first.write_binary(b"one")?;
		second.write_binary(b"two")?;

		let crls = read_crls(&[first.to_path_buf(), second.to_path_buf()])?;
		assert_eq!(crls, vec![b"one".to_vec(), b"two".to_vec()]);
		Ok(())
	}
}
