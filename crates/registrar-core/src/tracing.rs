use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives used when `RUST_LOG` is unset or unparsable. sqlx logs every
/// statement at `info`, which would drown the request traces.
pub const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn,sea_orm_migration=warn";

fn filter_from(env: Option<&str>) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the JSON stdout subscriber. A second call is a no-op.
pub fn init_tracing() {
    let filter = filter_from(std::env::var("RUST_LOG").ok().as_deref());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init();
}
