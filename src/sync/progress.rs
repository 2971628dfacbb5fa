use indicatif::ProgressStyle;

/// Spinner style used while an entry is being processed.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.yellow} {wide_msg}")
        .unwrap()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Style used when an entry finishes successfully.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {wide_msg}")
        .unwrap()
        .tick_strings(&["✔", "✔"])
}

/// Style used when an entry fails.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.red} {wide_msg}")
        .unwrap()
        .tick_strings(&["✘", "✘"])
}
