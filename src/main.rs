#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leadfunnel::cli::run().await
}
