use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt::time, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `level` is the crate's default directive (`"info"`, `"debug"`, ...);
/// `RUST_LOG` can still override or add directives. Call once, early.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()?
        .add_directive(format!("sora={level}").parse()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_timer(time::uptime()),
        )
        .with(filter)
        .try_init()?;
    Ok(())
}
