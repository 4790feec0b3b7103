//! Parcourt le VFS Mixcloud depuis la racine
//!
//! Usage : `cargo run --example browse -- [uri] [profondeur]`
//!
//! Sans argument, liste la racine et descend d'un niveau.

use pmoconfig::get_config;
use pmomixcloud::MixcloudBackend;
use pmosource::{Backend, LibraryProvider};
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

    let mut args = std::env::args().skip(1);
    let backend = MixcloudBackend::from_config_obj(config.as_ref())?;
    let library = backend.library();

    let start = args.next().unwrap_or_else(|| library.root_directory().uri);
    let depth: usize = args.next().map(|d| d.parse()).transpose()?.unwrap_or(1);

    println!("=== PMOMixcloud - {} ===\n", start);
    walk(library, &start, depth).await;

    Ok(())
}

async fn walk(library: &dyn LibraryProvider, uri: &str, depth: usize) {
    let mut level = vec![uri.to_string()];

    for current in 0..=depth {
        let mut next = Vec::new();

        for uri in level {
            let entries = library.browse(&uri).await;
            println!("{} ({} entrées)", uri, entries.len());

            for entry in entries {
                let marker = if entry.is_directory() { "+" } else { "-" };
                println!("  {} {}  [{}]", marker, entry.name, entry.uri);
                if entry.is_directory() && current < depth {
                    next.push(entry.uri);
                }
            }
            println!();
        }

        level = next;
    }
}
