// `main.rs` is intentionally tiny: it only declares modules and delegates
// execution to `app::run()`. The real implementation lives in the `config`,
// `scoreboard`, `payload`, `mqtt`, and `repl` modules under `src/` so each
// responsibility is isolated and easier to navigate / test.
mod app;
mod config;
mod mqtt;
mod payload;
mod repl;
mod scoreboard;

/// Start the tool. Configuration errors surface here and exit non-zero
/// before the interactive loop ever starts.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
