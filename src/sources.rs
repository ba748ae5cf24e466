use anyhow::Result;

use crate::config::Config;
use crate::fetch::FILE_SCHEME;
use crate::models::SourceDescriptor;

/// Print the effective site catalog as a table.
pub fn list_sources(config: &Config) -> Result<()> {
    let sites = config.catalog()?;

    println!("{:<4} {:<10} {:<6} {:<24} URL", "#", "CATEGORY", "ORIGIN", "CONTENT");
    for (i, site) in sites.iter().enumerate() {
        println!(
            "{:<4} {:<10} {:<6} {:<24} {}",
            i + 1,
            site.category,
            origin(site),
            site.content_selector.as_deref().unwrap_or("-"),
            site.locator
        );
    }

    let extractable = sites.iter().filter(|s| s.content_selector.is_some()).count();
    println!(
        "\n{} sites ({} with a content selector)",
        sites.len(),
        extractable
    );
    Ok(())
}

fn origin(site: &SourceDescriptor) -> &'static str {
    if site.locator.starts_with(FILE_SCHEME) {
        "local"
    } else {
        "remote"
    }
}
