//! Sign a CRL from a JSON list of revoked certificates.
//!
//! Requires three positional command line arguments:
//! * File path to PEM containing the CA's key pair
//! * File path to PEM containing the CA's certificate
//! * File path to the JSON request
//!
//! Prints the JSON response.

use std::error::Error;
use std::fs;

use crl_resign::{sign_revocation_list, Issuer, SignRevocationListRequest};
use time::OffsetDateTime;

fn main() -> Result<(), Box<dyn Error>> {
	let mut args = std::env::args().skip(1);

	let key_file = args
		.next()
		.ok_or("provide the CA's pem keys file as 1st argument")?;
	let cert_file = args
		.next()
		.ok_or("provide the CA's pem certificate file as 2nd argument")?;
	let request_file = args
		.next()
		.ok_or("provide the JSON request file as 3rd argument")?;

	let issuer = Issuer::from_pem(&fs::read_to_string(cert_file)?, &fs::read_to_string(key_file)?)?;
	let request = SignRevocationListRequest::from_json(&fs::read_to_string(request_file)?)?;

	let response = sign_revocation_list(&issuer, request, OffsetDateTime::now_utc())?;
	println!("{}", serde_json::to_string_pretty(&response)?);

	Ok(())
}
