/*
 * Responsibility
 * - tokio runtime の起動
 * - app::run() を呼ぶだけ (ロジックは持たない)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    request_gate::app::run().await
}
