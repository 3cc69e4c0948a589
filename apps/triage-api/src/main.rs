use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = triage_api::Args::parse();

	triage_api::run(args).await
}
