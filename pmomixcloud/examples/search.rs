//! Recherche Mixcloud puis traduction des premières pistes en URL de stream
//!
//! Usage : `cargo run --example search -- "deep house"`

use pmoconfig::get_config;
use pmomixcloud::MixcloudBackend;
use pmosource::{Backend, SearchQuery};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();
    if config.get_log_enable_console()? {
        let level = config.get_log_min_level()?.to_lowercase();
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .init();
    }

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let text = if text.is_empty() { "jazz mix".to_string() } else { text };

    let backend = MixcloudBackend::from_config_obj(config.as_ref())?;

    println!("Recherche: '{}'...", text);
    let Some(result) = backend
        .library()
        .search(&SearchQuery::field("any", text.as_str()), None, false)
        .await
    else {
        println!("Aucun résultat");
        return Ok(());
    };

    println!("✓ {} piste(s) trouvée(s) ({})\n", result.tracks.len(), result.uri);

    for (i, track) in result.tracks.iter().take(5).enumerate() {
        let artist = track
            .artists
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or("?");
        println!("  {}. {} - {} ({}s)", i + 1, artist, track.name, track.length);

        match backend.playback().translate_uri(&track.uri).await {
            Some(url) => println!("     Stream: {}", url),
            None => println!("     Pas de stream disponible"),
        }
    }

    let stats = backend.client().cache().stats().await;
    println!("\nCache: {} entrée(s)", stats.total_count());

    Ok(())
}
