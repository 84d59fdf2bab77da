//! Command Line argument parsing
#![allow(missing_docs)]

use std::path::PathBuf;
use std::time::Duration;

use bpaf::Bpaf;
use crl_resign::OutputFormat;

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options)]
/// crl-resign: merge CRLs and sign the result with a CA
pub struct Options {
	/// Certificate of the CA signing the new CRL
	#[bpaf(long, argument("CA.pem"))]
	pub issuer_cert: PathBuf,
	/// Private key of the CA, PKCS#8 PEM
	#[bpaf(long, argument("KEY.pem"))]
	pub issuer_key: Option<PathBuf>,
	/// CRL number of the new CRL
	#[bpaf(long, argument("N"))]
	pub crl_number: u64,
	/// Issue a delta CRL against the base CRL with this number
	#[bpaf(long, argument("N"))]
	pub delta_crl_number: Option<u64>,
	/// Time until the next CRL is due, e.g. 1h or 7days
	#[bpaf(long, argument::<String>("DURATION"), parse(parse_duration))]
	pub next_update: Duration,
	/// Output encoding, pem or der
	#[bpaf(long, argument("FORMAT"), fallback(OutputFormat::Pem), display_fallback)]
	pub format: OutputFormat,
	/// Write the CRL to this file instead of stdout
	#[bpaf(short, long, argument("FILE"))]
	pub output: Option<PathBuf>,
	/// CRL files to merge, PEM or DER
	#[bpaf(positional("CRL"), some("at least one CRL is required"))]
	pub crls: Vec<PathBuf>,
}

/// Accepts humantime durations as well as bare seconds
fn parse_duration(input: String) -> Result<Duration, humantime::DurationError> {
	match input.trim().parse::<u64>() {
		Ok(secs) => Ok(Duration::from_secs(secs)),
		Err(_) => humantime::parse_duration(&input),
	}
}
