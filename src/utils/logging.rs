#[cfg(feature = "logging")]
pub fn init_logger(
    min_level: log::LevelFilter, debug_file_name: &std::ffi::OsStr,
) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            // Local time only works on single-threaded processes, and the ctrl-c handler
            // lives on its own thread.
            let offset = time::OffsetDateTime::now_utc();
            let timestamp = offset
                .format(&time::macros::format_description!(
                    // "[[[" escapes a bracket ("[[") to show one "[".
                    "[[[year]-[month]-[day]][[[hour]:[minute]:[second][subsecond digits:9]]"
                ))
                .unwrap_or_default();

            out.finish(format_args!(
                "{}[{}][{}] {}",
                timestamp,
                record.target(),
                record.level(),
                message
            ))
        })
        .level(min_level)
        .chain(fern::log_file(debug_file_name)?)
        .apply()?;

    Ok(())
}
