//! Merge existing CRLs and re-sign them with a CA.
//!
//! Requires at least three positional command line arguments:
//! * File path to PEM containing the CA's key pair
//! * File path to PEM containing the CA's certificate
//! * File paths to the CRLs to merge, PEM or DER
//!
//! The merged CRL is printed as PEM.

use std::error::Error;
use std::fs;
use std::time::Duration;

use crl_resign::{resign_crls, EncodedCrl, Issuer, OutputFormat, ResignCrlsRequest};
use time::OffsetDateTime;

fn main() -> Result<(), Box<dyn Error>> {
	let mut args = std::env::args().skip(1);

	let key_file = args
		.next()
		.ok_or("provide the CA's pem keys file as 1st argument")?;
	let cert_file = args
		.next()
		.ok_or("provide the CA's pem certificate file as 2nd argument")?;
	let crls = args.map(fs::read).collect::<Result<Vec<_>, _>>()?;

	let issuer = Issuer::from_pem(&fs::read_to_string(cert_file)?, &fs::read_to_string(key_file)?)?;

	let request = ResignCrlsRequest {
		crl_number: 1,
		delta_crl_number: None,
		next_update: Duration::from_secs(24 * 60 * 60),
		format: OutputFormat::Pem,
		crls,
	};
	let response = resign_crls(&issuer, request, OffsetDateTime::now_utc())?;

	if let EncodedCrl::Pem(pem) = response.crl {
		print!("{pem}");
	}

	Ok(())
}
