use log::LevelFilter;
use env_logger::{Builder, Env};
use std::io::Write;
use chrono::Utc;

/// Installs the global logger. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    Builder::from_env(Env::default().default_filter_or(LevelFilter::Info.as_str()))
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    log::debug!("Logger initialized.");
}
