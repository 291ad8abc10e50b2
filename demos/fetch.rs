//! Client example
//!
//! Extracts a URL through a running backend, downloads its first format and
//! prints progress as the view state changes.
//!
//! Usage: cargo run --example fetch -- <url> [audio|video]
//!
//! Start the backend first with `cargo run --example serve`.

use mediagrab::utils::{format_count, format_duration, format_size_or_unknown};
use mediagrab::{ClientConfig, FormatKind, MediaClient, ViewState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let url = args.next().ok_or("usage: fetch <url> [audio|video]")?;
    let preferred = match args.next().as_deref() {
        Some("audio") => FormatKind::Audio,
        _ => FormatKind::Video,
    };

    let client = MediaClient::new(&ClientConfig::default())?;
    let mut events = client.subscribe();
    let mut view = ViewState::default();

    let session = match client.submit(&url).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Ok(());
        }
    };

    let info = &session.info;
    println!("{} by {}", info.title, info.author);
    println!(
        "  {} | {} views",
        format_duration(info.duration_secs),
        format_count(info.views)
    );
    for format in session.formats() {
        println!(
            "  [{}] {} {} ({})",
            format.format_id,
            format.kind.as_str(),
            format.resolution_label,
            format_size_or_unknown(format.size_bytes)
        );
    }

    let Some(format) = info
        .formats_of(preferred)
        .next()
        .or_else(|| info.formats.first())
        .cloned()
    else {
        eprintln!("No formats available");
        return Ok(());
    };
    if let Err(e) = client.pick(&format.format_id, format.kind).await {
        eprintln!("{}", e.user_message());
        return Ok(());
    }

    while let Ok(event) = events.recv().await {
        view.apply(&event);
        match &view {
            ViewState::Downloading { phase, stalled, .. } => {
                let note = if *stalled { " (no progress for a while)" } else { "" };
                println!("{phase}{note}");
            }
            ViewState::Complete { download_url, .. } => {
                println!("Done: {download_url}");
                break;
            }
            ViewState::Error { message, .. } => {
                eprintln!("{message}");
                break;
            }
            _ => {}
        }
    }

    client.reset();
    Ok(())
}
