use std::sync::Once;

use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter, Registry};

static INIT: Once = Once::new();

/// Initialize logging.  Nothing is installed unless the environment variable
/// `RUST_LOG` is set to a non-empty value, in which case it is interpreted as
/// an `EnvFilter` directive and events go to stderr.
pub fn init_logging() {
    INIT.call_once(|| {
        // Scripts frequently set RUST_LOG unconditionally but potentially with
        // an empty value, and we don't want that to be interpreted as a desire
        // to enable logging.
        let rustlog = match std::env::var("RUST_LOG") {
            Ok(v) if !v.is_empty() => v,
            _ => return,
        };
        let env_filter = match EnvFilter::try_new(&rustlog) {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("Ignoring unparseable RUST_LOG {:?}: {}", rustlog, e);
                return;
            }
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
            .compact()
            // Logs usually end up in files, where ANSI isn't helpful.
            .with_ansi(false)
            // Wall time takes up a lot of columns and we rarely care.
            .without_time()
            .with_filter(env_filter);
        let _ = Registry::default().with(layer).try_init();
    });
}
