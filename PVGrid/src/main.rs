use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pvgconfig::get_config;
use pvgcontrol::{RotationConfigExt, RotationScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ========== PHASE 1 : Configuration ==========
    let config = get_config();
    let ranges = config.get_address_ranges()?;
    let max_slots = config.get_max_slots().max(1);
    let slots = config.get_default_slots().clamp(1, max_slots) as usize;
    info!(slots, ranges = ranges.len(), "🎬 PVGrid control core starting");

    // ========== PHASE 2 : Rotation des adresses ==========
    let scheduler = RotationScheduler::new(config.rotation_config())?;
    let assignments = scheduler.subscribe();
    scheduler.start(slots, ranges)?;

    let display = tokio::task::spawn_blocking(move || {
        while let Ok(assignment) = assignments.recv() {
            for (slot, address) in assignment.iter().enumerate() {
                info!(slot, %address, "slot address");
            }
        }
    });

    // ========== PHASE 3 : Arrêt ==========
    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutdown requested");
    scheduler.stop();
    drop(scheduler);
    let _ = display.await;

    Ok(())
}
