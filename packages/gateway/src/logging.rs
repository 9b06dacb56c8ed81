//! Logger initialization, grounded on the teacher's `env_logger::Builder`
//! usage in `sweetmcp/packages/axum/src/config.rs` but without the extra
//! pipe-to-file plumbing this crate doesn't need — a gateway library logs
//! to whatever the embedding binary points stderr at.

use std::str::FromStr;

use log::LevelFilter;

/// Initialize `env_logger` from `level` (falling back to `info`), honoring
/// `RUST_LOG` if the caller has already set it.
pub fn init(level: Option<&str>) {
    let default_level = level.and_then(|l| LevelFilter::from_str(l).ok()).unwrap_or(LevelFilter::Info);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }
    let _ = builder.try_init();
}
