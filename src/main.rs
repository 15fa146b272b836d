use murmur_engine::SimConfig;
use simulation::{run_gset_convergence, run_membership_convergence, run_pncounter_convergence};
pub mod simulation;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    rt.block_on(async_main());
}

async fn async_main() {
    println!("murmur convergence demo");

    let stats = run_membership_convergence(5, SimConfig::default());
    stats.print();

    let stats = run_gset_convergence(4, 50, SimConfig::default()).await;
    stats.print();

    // Same runs over a faulty network: drops and duplicate deliveries.
    let faults = SimConfig {
        loss_rate: 0.2,
        dup_rate: 0.3,
    };
    let stats = run_gset_convergence(4, 50, faults).await;
    stats.print();

    let stats = run_pncounter_convergence(4, 25, faults).await;
    stats.print();

    println!("\nall runs converged");
}
