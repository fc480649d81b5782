//! Factory-aware analysis of a few small component graphs.
//!
//! Run with `RUST_LOG=mizan_validation=trace` to watch the walk.

use mizan::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// === Components ===

struct ServiceWithUnknownArg;
struct ConsumingService;

type SupplyingFactory = dyn Fn(i32) -> ServiceWithUnknownArg;
type BareFactory = dyn Fn() -> ServiceWithUnknownArg;

fn service_with_unknown_arg() -> ComponentRegistration {
    ComponentRegistration::of::<ServiceWithUnknownArg>().depends_on_named::<i32>("arg")
}

fn analyze(title: &str, builder: ContainerBuilder) -> Result<()> {
    let container = builder.with_factory_support().build()?;
    let registry = container.snapshot();
    let findings = unresolvable_dependencies(&*registry)?;
    let report = findings.report(&*registry);
    info!(scenario = title, findings = findings.len(), "Scenario analyzed");

    println!("=== {title} ===");
    print!("{report}");
    if !report.summary.passed {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("Failed to serialize report: {err}"),
        }
    }
    println!();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scenarios=info,mizan_validation=info")),
        )
        .init();

    analyze("No factory", Container::builder().register(service_with_unknown_arg()))?;

    analyze(
        "Explicit factory supplying the argument",
        Container::builder()
            .register(service_with_unknown_arg())
            .register(ComponentRegistration::delegate_factory::<SupplyingFactory>()),
    )?;

    analyze(
        "Implicit factory supplying the argument",
        Container::builder()
            .register(service_with_unknown_arg())
            .register(ComponentRegistration::of::<ConsumingService>().depends_on_factory::<SupplyingFactory>()),
    )?;

    analyze(
        "Implicit factory missing the argument",
        Container::builder()
            .register(service_with_unknown_arg())
            .register(ComponentRegistration::of::<ConsumingService>().depends_on_factory::<BareFactory>()),
    )?;

    Ok(())
}
