use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing. `RUST_LOG` wins when set; otherwise verbosity
/// maps -v to info and -vv to debug for the protium crates.
pub fn init(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "protium=warn,protium_pkg=warn,protium_build=warn,protium_config=warn",
        1 => "protium=info,protium_pkg=info,protium_build=info,protium_config=info",
        _ => "protium=debug,protium_pkg=debug,protium_build=debug,protium_config=debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
