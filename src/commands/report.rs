use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;

use cellwatch::command::{CommandSender, Feedback};
use cellwatch::config::Config;
use cellwatch::report::Reporter;
use cellwatch::scheduler::TickQueue;
use cellwatch::service::BlockMonitor;
use cellwatch::world::GridWorld;

pub async fn report(config: Config, world_path: &Path, args: Vec<String>) -> Result<()> {
    let world = Arc::new(
        GridWorld::from_file(world_path)
            .with_context(|| format!("Failed to load world snapshot {}", world_path.display()))?,
    );
    let reporter = Arc::new(
        Reporter::new(&config.reporter, Handle::current()).context("Failed to create reporter")?,
    );
    let monitor = BlockMonitor::new(
        config,
        world.clone(),
        Arc::new(TickQueue::new()),
        reporter.clone(),
    )?;

    let handler = monitor.command_handler(world);
    let reply = handler
        .handle(&CommandSender::console(), "httpblockinfo", "httpblockinfo", args.as_slice())
        .context("Command was not handled")?;

    for feedback in &reply.feedback {
        match feedback {
            Feedback::Error(msg) => println!("[error] {msg}"),
            Feedback::Warning(msg) => println!("[warn]  {msg}"),
            Feedback::Success(msg) => println!("{msg}"),
        }
    }

    reporter.drain().await;

    if let Some(snapshot) = &reply.sent {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    }

    if reply.feedback.iter().any(Feedback::is_error) {
        anyhow::bail!("Block info command failed");
    }

    Ok(())
}
