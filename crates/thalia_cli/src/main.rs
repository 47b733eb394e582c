mod mocks;

use clap::Parser;
use mocks::{CannedGenerator, LoggingPlatform, NoStyle};
use std::io::{self, Write};
use std::sync::Arc;
use thalia_core::ThaliaConfig;
use thalia_engagement::{EngagementMonitor, EngagementTarget, PostingScheduler};
use thalia_memory::MemoryStore;
use thalia_persona::EmotionalStateEngine;
use thalia_pipeline::{GenerationInput, ResponseGenerationPipeline};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Autonomous persona demo loop", long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "thalia.toml")]
    config: String,

    /// Start with the posting scheduler in auto mode
    #[arg(long)]
    auto: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut config = ThaliaConfig::load_or_default(&args.config);
    if args.auto {
        config.scheduler.auto_mode = true;
    }

    info!("Wiring up the agent with local mock collaborators");
    let generator = Arc::new(CannedGenerator);
    let platform = Arc::new(LoggingPlatform::default());
    let memory = Arc::new(MemoryStore::new(
        Arc::new(thalia_core::NullBackend),
        config.memory.clone(),
    ));
    let persona = Arc::new(Mutex::new(EmotionalStateEngine::new(config.persona.clone())));
    let pipeline = Arc::new(ResponseGenerationPipeline::new(
        generator,
        Arc::new(NoStyle),
        memory.clone(),
        persona.clone(),
        config.pipeline.clone(),
    ));
    let scheduler = PostingScheduler::new(
        platform.clone(),
        pipeline.clone(),
        Arc::new(thalia_core::NullBackend),
        config.scheduler.clone(),
    );
    let monitor = EngagementMonitor::new(
        platform,
        pipeline.clone(),
        scheduler.post_floor(),
        config.engagement.clone(),
    );
    monitor
        .add_target(EngagementTarget::new("demo_friend", vec!["systems".into()], 1.0))
        .await;

    println!("thalia online. commands: batch <n>, approve-all, stats, cycle, state, quit.");
    println!("anything else is treated as a chat message.");
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        input.clear();
        stdin.read_line(&mut input)?;
        let trimmed = input.trim();

        match trimmed {
            "" => {}
            "quit" | "exit" => break,
            "stats" => {
                let stats = scheduler.stats().await;
                println!("{stats:?}");
            }
            "state" => {
                let snapshot = pipeline.persona_snapshot().await;
                println!(
                    "state={} style={} mode={:?}",
                    snapshot.state, snapshot.post_style, snapshot.narrative_mode
                );
            }
            "approve-all" => {
                let n = scheduler.spread_over_24h().await?;
                println!("scheduled {n} posts over the next 24h");
            }
            "cycle" => {
                let outcome = monitor.run_cycle().await;
                println!("cycle: {outcome:?}");
            }
            cmd if cmd.starts_with("batch ") => {
                let n: usize = cmd.trim_start_matches("batch ").trim().parse().unwrap_or(1);
                let ids = scheduler.generate_batch(n, "whatever is on the wire today").await;
                println!("queued {} pending posts", ids.len());
            }
            message => {
                let reply = pipeline.generate(&GenerationInput::chat(message)).await;
                println!("\nthalia: {reply}\n");
            }
        }

        // Background housekeeping the long-running service would do on a
        // timer; cheap enough to run per interaction here.
        let stats = memory.consolidate().await;
        if stats.promoted > 0 {
            info!(promoted = stats.promoted, "memories consolidated");
        }

        print!("> ");
        io::stdout().flush()?;
    }

    scheduler.stop().await;
    monitor.stop().await;
    Ok(())
}
