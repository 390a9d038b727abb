//! CLI Command Implementations

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::audio;
use crate::chart;
use crate::error::Result;
use crate::spectrum::{self, ZoomWindow};
use crate::verify::{
    SpeakerComparator, VerificationRequest, VerificationScheduler,
};

/// Load both recordings, render the chart, and run verification.
///
/// Load and analysis failures are reported before the comparator is ever
/// invoked, so a known-bad input never costs a model call.
pub fn compare(
    comparator: Arc<dyn SpeakerComparator>,
    reference_path: &Path,
    test_path: &Path,
    chart_path: &Path,
    json: bool,
) -> Result<()> {
    let reference = audio::load(reference_path)?;
    let test = audio::load(test_path)?;
    info!(
        "Loaded reference ({:.2}s) and test ({:.2}s)",
        reference.duration(),
        test.duration()
    );

    // Spectrum analysis is cheap and synchronous; it also catches silent
    // inputs before verification is submitted.
    let reference_profile = spectrum::analyze(&reference)?;
    let test_profile = spectrum::analyze(&test)?;
    let zoom = ZoomWindow::around(
        reference_profile.center_of_mass()?,
        test_profile.center_of_mass()?,
    );

    chart::render_comparison(&reference_profile, &test_profile, zoom, chart_path)?;
    info!("Comparison chart written to {}", chart_path.display());

    let scheduler = VerificationScheduler::new(comparator);
    let handle = scheduler.submit(VerificationRequest::new(reference, test))?;
    let result = handle.wait()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let label = if result.matched {
            "Same speaker"
        } else {
            "Different speaker"
        };
        println!("{} (score {:.3})", label, result.score);
        println!("Chart: {}", chart_path.display());
    }

    Ok(())
}

/// Print a one-recording spectrum summary.
pub fn analyze(input: &Path) -> Result<()> {
    let buffer = audio::load(input)?;
    let profile = spectrum::analyze(&buffer)?;
    let center = profile.center_of_mass()?;

    println!("File:            {}", input.display());
    println!("Duration:        {:.2}s", buffer.duration());
    println!("Samples:         {}", buffer.len());
    println!("Spectrum bins:   {}", profile.len());
    println!("Peak frequency:  {:.1} Hz", profile.peak_frequency());
    println!("Spectral center: {center:.1} Hz");

    Ok(())
}
