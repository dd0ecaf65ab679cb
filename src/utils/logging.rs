use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

static RELOAD_HANDLE: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

/// Installs the global subscriber on first call, reloads the env filter on
/// every call after that.
pub fn init(level: &str, json: bool) -> Result<()> {
    let handle = RELOAD_HANDLE.get_or_try_init(|| {
        let (filter, handle) = reload::Layer::new(EnvFilter::try_new(level)?);

        let registry = tracing_subscriber::registry().with(filter);

        let fmt = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true);

        if json {
            registry.with(fmt.json()).try_init()?;
        } else {
            registry.with(fmt.pretty()).try_init()?;
        }

        anyhow::Ok(handle)
    })?;

    handle.reload(EnvFilter::try_new(level)?)?;

    Ok(())
}
