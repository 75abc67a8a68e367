//! `corral inspect`: resolve an image reference to its on-disk contents.

use clap::Args;
use corral_common::config::RuntimeConfig;
use corral_common::types::ImageReference;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image reference: `[library/]image[:tag]`.
    pub image: String,
}

/// Executes the `inspect` command.
///
/// Prints `{reference}\t{contents path}\t{present|missing}` to stdout.
///
/// # Errors
///
/// Returns an error if the image reference is invalid.
pub fn execute(args: &InspectArgs, config: &RuntimeConfig) -> anyhow::Result<()> {
    let image: ImageReference = args.image.parse()?;
    let line = describe(&image, config);
    tracing::debug!(image = %image, "inspected image");
    #[allow(clippy::print_stdout)]
    {
        println!("{line}");
    }
    Ok(())
}

fn describe(image: &ImageReference, config: &RuntimeConfig) -> String {
    let contents = image.contents_path(&config.image_root);
    let state = if contents.is_dir() { "present" } else { "missing" };
    format!("{image}\t{}\t{state}", contents.display())
}
