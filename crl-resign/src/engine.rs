use time::OffsetDateTime;

use crate::crl::{build, CrlBuildSpec, RevocationEntry};
use crate::ext::build_extensions;
use crate::format::encode;
use crate::issuer::{Issuer, IssuerResolver};
use crate::merge::merge;
use crate::request::{ResignCrlsRequest, ResignResponse, SignRevocationListRequest};
use crate::Error;

/// Merges the CRLs of `request` into a new CRL signed by `issuer`.
///
/// The entries of all supplied CRLs are combined, the first entry winning
/// for a serial number listed more than once. The new CRL is issued at
/// `now` and carries an authority key identifier, the requested CRL number
/// and, for delta CRLs, a delta CRL indicator.
///
/// Nothing is returned unless every stage succeeds.
pub fn resign_crls(
	issuer: &Issuer,
	request: ResignCrlsRequest,
	now: OffsetDateTime,
) -> Result<ResignResponse, Error> {
	let spec = request.into_spec()?;
	let entries = merge(&spec.sources);
	tracing::debug!(
		sources = spec.sources.len(),
		entries = entries.len(),
		"merged revocation entries"
	);
	issue(issuer, &spec, entries, now)
}

/// Signs a new CRL listing the revoked certificates of `request`.
pub fn sign_revocation_list(
	issuer: &Issuer,
	request: SignRevocationListRequest,
	now: OffsetDateTime,
) -> Result<ResignResponse, Error> {
	let (spec, entries) = request.into_parts()?;
	issue(issuer, &spec, entries, now)
}

/// Like [`resign_crls`], with the issuer looked up by reference first.
///
/// Fails with [`Error::IssuerNotFound`] if `resolver` does not know
/// `reference`.
pub fn resign_crls_for<R: IssuerResolver + ?Sized>(
	resolver: &R,
	reference: &str,
	request: ResignCrlsRequest,
	now: OffsetDateTime,
) -> Result<ResignResponse, Error> {
	let issuer = resolver.resolve(reference)?;
	tracing::debug!(issuer = reference, "resolved issuer");
	resign_crls(issuer, request, now)
}

fn issue(
	issuer: &Issuer,
	spec: &CrlBuildSpec,
	entries: Vec<RevocationEntry>,
	now: OffsetDateTime,
) -> Result<ResignResponse, Error> {
	let extensions = build_extensions(issuer, spec);
	let built = build(issuer, spec, entries, extensions, now)?;
	let crl = encode(&built, spec.format);
	tracing::info!(
		crl_number = built.crl_number(),
		delta_base = ?built.delta_base_number(),
		entries = built.entries().len(),
		format = %spec.format,
		"issued CRL"
	);
	Ok(ResignResponse { crl })
}
