use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ddc::start().await
}
