/// id-ecPublicKey in [RFC 5480](https://datatracker.ietf.org/doc/html/rfc5480#appendix-A)
pub(crate) const EC_PUBLIC_KEY: &[u64] = &[1, 2, 840, 10045, 2, 1];
/// secp256r1 in [RFC 5480](https://datatracker.ietf.org/doc/html/rfc5480#appendix-A)
pub(crate) const EC_SECP_256_R1: &[u64] = &[1, 2, 840, 10045, 3, 1, 7];
/// secp384r1 in [RFC 5480](https://datatracker.ietf.org/doc/html/rfc5480#appendix-A)
pub(crate) const EC_SECP_384_R1: &[u64] = &[1, 3, 132, 0, 34];
/// secp521r1 in [RFC 5480](https://datatracker.ietf.org/doc/html/rfc5480#appendix-A)
#[cfg(feature = "aws_lc_rs")]
pub(crate) const EC_SECP_521_R1: &[u64] = &[1, 3, 132, 0, 35];

/// rsaEncryption in [RFC 4055](https://www.rfc-editor.org/rfc/rfc4055#section-6)
pub(crate) const RSA_ENCRYPTION: &[u64] = &[1, 2, 840, 113549, 1, 1, 1];

/// id-Ed25519 in [RFC 8410](https://www.rfc-editor.org/rfc/rfc8410#section-3)
pub(crate) const ED25519: &[u64] = &[1, 3, 101, 112];

/// id-ce-subjectKeyIdentifier in [RFC 5280](https://www.rfc-editor.org/rfc/rfc5280#appendix-A)
pub(crate) const OID_SUBJECT_KEY_IDENTIFIER: &[u64] = &[2, 5, 29, 14];

/// id-ce-keyUsage in [RFC 5280](https://tools.ietf.org/html/rfc5280#appendix-A.2)
pub(crate) const OID_KEY_USAGE: &[u64] = &[2, 5, 29, 15];

/// id-ce-cRLNumber in [RFC 5280](https://www.rfc-editor.org/rfc/rfc5280#appendix-A)
pub(crate) const OID_CRL_NUMBER: &[u64] = &[2, 5, 29, 20];

/// id-ce-cRLReasons in [RFC 5280](https://www.rfc-editor.org/rfc/rfc5280#appendix-A)
pub(crate) const OID_CRL_REASONS: &[u64] = &[2, 5, 29, 21];

/// id-ce-deltaCRLIndicator in [RFC 5280](https://www.rfc-editor.org/rfc/rfc5280#appendix-A)
pub(crate) const OID_DELTA_CRL_INDICATOR: &[u64] = &[2, 5, 29, 27];

/// id-ce-authorityKeyIdentifier in [RFC 5280](https://www.rfc-editor.org/rfc/rfc5280#appendix-A)
pub(crate) const OID_AUTHORITY_KEY_IDENTIFIER: &[u64] = &[2, 5, 29, 35];

/// Parses a dotted-decimal object identifier such as `2.5.29.21`.
///
/// Returns `None` for empty input, non-numeric arcs, or fewer than two arcs.
pub(crate) fn parse_dotted(s: &str) -> Option<Vec<u64>> {
	let components = s
		.trim()
		.split('.')
		.map(|arc| arc.parse::<u64>().ok())
		.collect::<Option<Vec<_>>>()?;
	if components.len() < 2 {
		return None;
	}
	Some(components)
}

/// Formats object identifier components in dotted-decimal notation.
pub(crate) fn to_dotted(oid: &[u64]) -> String {
	oid.iter()
		.map(|arc| arc.to_string())
		.collect::<Vec<_>>()
		.join(".")
}
