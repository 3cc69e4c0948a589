use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = triage_worker::Args::parse();

	triage_worker::run(args).await
}
