mod config;

use config::StressConfig;
use stress_test::{stress_test_scaling, stress_test_sessions};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    fmt()
        .with_env_filter(filter)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

/// Base configuration: the JSON file named by the first argument, if any.
fn load_config() -> Result<StressConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(StressConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let base = load_config()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main(base))?;
    Ok(())
}

async fn async_main(base: StressConfig) -> Result<(), stress_test::SessionError> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                              ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: configured scale
    let stats = stress_test_sessions(base.clone()).await?;
    stats.print();

    // Test 2: same sessions with every invariant checked after each message
    let stats = stress_test_sessions(StressConfig {
        messages_per_session: base.messages_per_session.min(200),
        verify_invariants: true,
        ..base.clone()
    })
    .await?;
    stats.print();

    // Test 3: many members, lots of messages in flight
    let mut flow = base.flow.clone();
    flow.asynchronity *= 4;
    let stats = stress_test_sessions(StressConfig {
        members_per_session: base.members_per_session * 4,
        messages_per_session: base.messages_per_session * 2,
        flow,
        ..base.clone()
    })
    .await?;
    stats.print();

    // Test 4: scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS                                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(base, 20, 4).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
