pub mod context;
pub mod feed_loop;
pub mod lifecycle;

pub use lifecycle::run_standalone;

pub async fn run() -> anyhow::Result<()> {
    run_standalone().await
}
