use tracing::Level;

use crate::log_buffer::GlobalLogSink;

/// Install a compact subscriber at `level` that writes to the global log
/// buffer when one is installed and to stderr otherwise. Later calls are
/// no-ops.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .with_writer(GlobalLogSink)
        .with_target(false)
        .with_thread_names(false)
        .without_time()
        .try_init();
}

pub fn init_default() {
    init(Level::DEBUG);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_buffer::{LogBuffer, global_log_buffer, set_global_log_buffer};

    #[test]
    fn events_land_in_the_global_buffer() {
        set_global_log_buffer(LogBuffer::new(10_000));
        init_default();
        init_default();
        tracing::debug!(marker = 7, "subscriber smoke test");
        let buffer = global_log_buffer().expect("buffer installed");
        assert!(
            buffer
                .tail(10_000)
                .iter()
                .any(|line| line.contains("subscriber smoke test") && line.contains("marker=7"))
        );
    }
}
