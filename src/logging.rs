use colored::{Color, Colorize};
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::BrightBlack,
        Level::Debug => Color::Cyan,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

/// Install the process logger. `RUST_LOG` wins over `default_level` when set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(default_level: &str) {
    let env = Env::default().default_filter_or(default_level);

    let _ = Builder::from_env(env)
        .format(|buf, record| {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
            let level = record.level();
            writeln!(
                buf,
                "{} {} [{}] {}",
                timestamp.dimmed(),
                format!("{:<5}", level.as_str()).color(level_color(level)),
                record.target().dimmed(),
                record.args()
            )
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init("warn");
        init("debug");
        log::warn!("logger initialized twice without panicking");
    }

    #[test]
    fn levels_have_distinct_colors() {
        assert_ne!(level_color(Level::Warn), level_color(Level::Error));
        assert_eq!(level_color(Level::Info), Color::Green);
    }
}
