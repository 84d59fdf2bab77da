use anyhow::Context;
use crl_resign::{resign_crls, ResignCrlsRequest};
use crl_resign_cli::{load_issuer, read_crls, write_crl, Result};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

mod args;

fn main() -> Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	let opts = args::options().run();

	let issuer = load_issuer(&opts.issuer_cert, opts.issuer_key.as_deref())?;
	let request = ResignCrlsRequest {
		crl_number: opts.crl_number,
		delta_crl_number: opts.delta_crl_number,
		next_update: opts.next_update,
		format: opts.format,
		crls: read_crls(&opts.crls)?,
	};

	let response =
		resign_crls(&issuer, request, OffsetDateTime::now_utc()).context("failed to resign CRLs")?;
	write_crl(&response.crl, opts.output.as_deref())
}
