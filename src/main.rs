#[tokio::main]
async fn main() -> anyhow::Result<()> {
    board_server::run().await
}
