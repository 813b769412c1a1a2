use framely_core::models::VideoResponse;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human-readable byte count (KB/MB with one decimal)
pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Share of the original size saved by the media service's compression
pub fn compression_savings(original: i64, compressed: i64) -> f64 {
    if original <= 0 {
        return 0.0;
    }
    ((original - compressed) as f64 / original as f64 * 100.0).max(0.0)
}

/// One line per video, newest first as the API returns them
pub fn format_video_table(videos: &[VideoResponse]) -> String {
    let mut out = format!(
        "{:<36}  {:<24}  {:>10}  {:>10}  {:>7}  {:>8}\n",
        "ID", "TITLE", "ORIGINAL", "COMPRESSED", "SAVED", "DURATION"
    );
    for video in videos {
        out.push_str(&format!(
            "{:<36}  {:<24}  {:>10}  {:>10}  {:>6.1}%  {:>7.1}s\n",
            video.id,
            truncate_string(&video.title, 24),
            format_size(video.original_size),
            format_size(video.compressed_size),
            compression_savings(video.original_size, video.compressed_size),
            video.duration,
        ));
    }
    out
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
