//! # Photo Porter CLI
//!
//! Copies photos from a card or folder into a library organized by date and camera.

mod cli;

use photo_porter::error::Result;

fn main() -> Result<()> {
    cli::run()
}
