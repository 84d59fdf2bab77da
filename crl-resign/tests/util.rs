#![allow(dead_code)]

use std::time::Duration;

use crl_resign::{Issuer, IssuerCertificate, OutputFormat, ResignCrlsRequest};
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::revocation_list::CertificateRevocationList;

pub const RSA_CA: &str = include_str!("data/rsa_ca.pem");
pub const RSA_KEY: &str = include_str!("data/rsa_ca.key");
pub const RSA_NO_CRL_SIGN: &str = include_str!("data/rsa_nocrlsign.pem");
pub const P256_CA: &str = include_str!("data/p256_ca.pem");
pub const P256_NO_SKI: &str = include_str!("data/p256_noski_ca.pem");
pub const P256_KEY: &str = include_str!("data/p256_ca.key");
pub const P384_CA: &str = include_str!("data/p384_ca.pem");
pub const P384_KEY: &str = include_str!("data/p384_ca.key");
pub const ED25519_CA: &str = include_str!("data/ed25519_ca.pem");
pub const ED25519_KEY: &str = include_str!("data/ed25519_ca.key");
pub const DSA_CA: &str = include_str!("data/dsa_ca.pem");

pub const VAULT_CRL_1: &str = include_str!("data/vault_crl_1.pem");
pub const VAULT_CRL_2: &str = include_str!("data/vault_crl_2.pem");
pub const VAULT_SERIAL_1: &str = "4A755FF30B1D1E33ADF5DAC2605856C52F50A86A";
pub const VAULT_SERIAL_2: &str = "3CF94774ACDC9CC9631CDDEF0DCA909324565B14";
pub const REASONS_CRL: &[u8] = include_bytes!("data/reasons_crl.der");

pub fn rsa_issuer() -> Issuer {
	Issuer::from_pem(RSA_CA, RSA_KEY).unwrap()
}

pub fn issuer_without_key(cert_pem: &str) -> Issuer {
	Issuer::without_key(IssuerCertificate::from_pem(cert_pem).unwrap())
}

/// A request merging both Vault CRLs into CRL number 2, valid for an hour
pub fn vault_request(format: OutputFormat) -> ResignCrlsRequest {
	ResignCrlsRequest {
		crl_number: 2,
		delta_crl_number: None,
		next_update: Duration::from_secs(3600),
		format,
		crls: vec![VAULT_CRL_1.into(), VAULT_CRL_2.into()],
	}
}

/// Parses `crl_der` and checks its signature against the certificate in
/// `issuer_pem`.
pub fn parse_and_verify<'a>(crl_der: &'a [u8], issuer_pem: &str) -> CertificateRevocationList<'a> {
	let issuer_der = pem::parse(issuer_pem).unwrap().into_contents();
	let (_, issuer) = X509Certificate::from_der(&issuer_der).unwrap();

	let (rest, crl) = CertificateRevocationList::from_der(crl_der).expect("failed to parse CRL DER");
	assert!(rest.is_empty());
	assert_eq!(crl.issuer(), issuer.subject());
	crl.verify_signature(issuer.public_key())
		.expect("CRL signature does not verify against the issuer");
	crl
}

/// Extension OIDs of `crl` in dotted form, in encoded order
pub fn extension_oids(crl: &CertificateRevocationList) -> Vec<String> {
	crl.extensions()
		.iter()
		.map(|ext| ext.oid.to_id_string())
		.collect()
}

/// Revoked serial numbers of `crl` as upper case hex
pub fn serials(crl: &CertificateRevocationList) -> Vec<String> {
	crl.iter_revoked_certificates()
		.map(|revoked| {
			revoked
				.raw_serial()
				.iter()
				.skip_while(|b| **b == 0)
				.map(|b| format!("{b:02X}"))
				.collect()
		})
		.collect()
}
