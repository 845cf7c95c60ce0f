use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    codebook_cli::main_entry().await
}
