use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use configurator_assets::{
    DeliveryConfig, DeliveryService, DeviceClass, HttpAssetFetcher, MemoryStore, NetworkClass,
    PlanRequest, QualityTier, TierTable,
};

#[derive(Parser)]
#[command(name = "configurator-assets")]
#[command(about = "3D asset delivery and caching for the jewelry configurator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the frame URLs planned for a configuration
    Plan(SequenceArgs),

    /// Preload a sequence against the asset origin
    Preload {
        #[command(flatten)]
        sequence: SequenceArgs,

        /// Wait for the background phase and print its report
        #[arg(long)]
        wait: bool,
    },

    /// Show the tier table
    Tiers,
}

#[derive(Args)]
struct SequenceArgs {
    /// Configuration ID (e.g., "ring42")
    #[arg(short, long)]
    config: String,

    /// Material ID (e.g., "gold")
    #[arg(short, long)]
    material: String,

    /// Declared device class (mobile, desktop, highEnd)
    #[arg(short, long)]
    device: Option<String>,

    /// Network class (fast, medium, slow) or effective type (4g, 3g, 2g)
    #[arg(short, long, default_value = "fast")]
    network: String,

    /// Quality tier (immediate, onInteraction, onDemand)
    #[arg(short, long, default_value = "immediate")]
    tier: String,
}

impl SequenceArgs {
    fn to_request(&self) -> Result<PlanRequest> {
        let tier = QualityTier::parse(&self.tier)
            .ok_or_else(|| anyhow!("Unknown tier: {}", self.tier))?;
        let network = NetworkClass::parse(&self.network)
            .unwrap_or_else(|| NetworkClass::from_effective_type(&self.network));

        let mut request = PlanRequest::new(&self.config, &self.material)
            .network(network)
            .tier(tier);

        if let Some(device) = &self.device {
            let device =
                DeviceClass::parse(device).ok_or_else(|| anyhow!("Unknown device: {}", device))?;
            request = request.device(device);
        }

        Ok(request)
    }
}

fn build_service(config: DeliveryConfig) -> Result<DeliveryService> {
    let fetcher = HttpAssetFetcher::new(config.request_timeout)?;
    let service = DeliveryService::new(config, Arc::new(MemoryStore::new()), Arc::new(fetcher))?;
    Ok(service)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "configurator_assets=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan(sequence) => {
            let request = sequence.to_request()?;
            let service = build_service(DeliveryConfig::from_env()?)?;
            let plan = service.plan_tier(&request).await?;

            println!(
                "{} / {} / {} on {}: {} frames ({})",
                plan.config_id,
                plan.material_id,
                plan.tier,
                plan.effective_device,
                plan.frame_count(),
                plan.spec.format
            );
            for url in &plan.urls {
                println!("  {}", url);
            }
        }

        Commands::Preload { sequence, wait } => {
            let request = sequence.to_request()?;
            let service = build_service(DeliveryConfig::from_env()?)?;
            let outcome = service.preload_assets(&request).await?;

            println!(
                "Eager phase done: {} frames loaded, {} scheduled in background",
                outcome.eager_loaded, outcome.background_scheduled
            );

            if wait {
                if let Some(background) = outcome.background {
                    let report = background.await?;
                    println!(
                        "Background phase: {} loaded, {} skipped{}",
                        report.loaded.len(),
                        report.skipped.len(),
                        if report.superseded { " (superseded)" } else { "" }
                    );
                    for url in &report.skipped {
                        println!("  skipped {}", url);
                    }
                }
            }

            let report = service.performance_report();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Tiers => {
            let table = TierTable::standard();
            println!(
                "{:<10} {:<15} {:>7} {:>12} {:>7} {:>10}",
                "device", "tier", "frames", "bytes", "format", "target_ms"
            );
            println!("{}", "=".repeat(66));
            for device in DeviceClass::ALL {
                for tier in QualityTier::ALL {
                    if let Some(spec) = table.get(device, tier) {
                        println!(
                            "{:<10} {:<15} {:>7} {:>12} {:>7} {:>10}",
                            device.as_str(),
                            tier.as_str(),
                            spec.frame_count,
                            spec.approx_byte_size,
                            spec.format.extension(),
                            spec.target_load_time_ms
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
