use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vitalq_api::Args::parse();

	vitalq_api::run(args).await
}
