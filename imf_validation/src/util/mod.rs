//! Internal utility methods.

#[cfg(test)]
pub mod mxf_builder;

/// Helper function to initialize the logger for testing.
#[cfg(test)]
pub fn logger() {
    _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}
