use rust_embed::RustEmbed;

/// The single-page UI: `#/` is the check page, `#/admin` the admin console.
#[derive(RustEmbed)]
#[folder = "dist"]
pub struct Assets;
