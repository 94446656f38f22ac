#[tokio::main]
async fn main() -> std::io::Result<()> {
    gesture_shooter::run_with_config().await
}
