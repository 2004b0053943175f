use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

use crate::util::env::env_flag;

/// Default filter for the service binaries when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,actix_server=warn";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Source file/line annotations are on
/// unless `LOG_SOURCE=0`. Calling this twice is a no-op rather than an error so
/// binaries and test harnesses can both reach for it.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let with_source = env_flag("LOG_SOURCE", true);

    let installed = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(with_source)
        .with_file(with_source)
        .try_init();

    if let Err(e) = installed {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
    Ok(())
}
