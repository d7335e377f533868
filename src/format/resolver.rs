use std::cmp::Ordering;

use tracing::trace;

use super::{FormatConstraints, Quality};
use crate::common::errors::{Error, Result};
use crate::info::StreamDescriptor;

fn by_general(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    a.resolution()
        .cmp(&b.resolution())
        .then_with(|| a.bitrate.unwrap_or(0).cmp(&b.bitrate.unwrap_or(0)))
        .then_with(|| a.quality_label.cmp(&b.quality_label))
}

/// Audio-only streams outrank muxed ones, whose bitrate is mostly video.
fn by_audio(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    (!a.has_video)
        .cmp(&!b.has_video)
        .then_with(|| a.bitrate.unwrap_or(0).cmp(&b.bitrate.unwrap_or(0)))
}

fn by_video(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    a.resolution()
        .cmp(&b.resolution())
        .then_with(|| a.fps.unwrap_or(0).cmp(&b.fps.unwrap_or(0)))
        .then_with(|| a.bitrate.unwrap_or(0).cmp(&b.bitrate.unwrap_or(0)))
}

/// Picks one descriptor out of `catalog`.
///
/// Candidates are narrowed by filter and origin, then ranked with a total
/// order: combined streams first when the filter asks for them, then the
/// quality-specific comparison, then catalog position. The same inputs
/// always give the same descriptor.
pub fn choose(catalog: &[StreamDescriptor], constraints: &FormatConstraints) -> Result<StreamDescriptor> {
    let prefer_combined = constraints
        .filter
        .as_ref()
        .is_some_and(|f| f.wants_combined());

    let mut candidates: Vec<(usize, &StreamDescriptor)> = catalog
        .iter()
        .enumerate()
        .filter(|(_, d)| constraints.admits(d))
        .filter(|(_, d)| match &constraints.quality {
            Quality::HighestAudio | Quality::LowestAudio => d.has_audio,
            Quality::HighestVideo | Quality::LowestVideo => d.has_video,
            Quality::Itag(itag) => d.itag == *itag,
            Quality::Label(label) => d.quality_label.as_deref() == Some(label.as_str()),
            Quality::Highest | Quality::Lowest => true,
        })
        .collect();

    let (rank, descending): (fn(&StreamDescriptor, &StreamDescriptor) -> Ordering, bool) =
        match constraints.quality {
            Quality::Lowest => (by_general, false),
            Quality::HighestAudio => (by_audio, true),
            Quality::LowestAudio => (by_audio, false),
            Quality::HighestVideo => (by_video, true),
            Quality::LowestVideo => (by_video, false),
            Quality::Highest | Quality::Itag(_) | Quality::Label(_) => (by_general, true),
        };

    candidates.sort_by(|(ia, a), (ib, b)| {
        let combined = if prefer_combined {
            b.is_combined().cmp(&a.is_combined())
        } else {
            Ordering::Equal
        };
        let quality = if descending { rank(b, a) } else { rank(a, b) };
        combined.then(quality).then(ia.cmp(ib))
    });

    let (index, chosen) = candidates.first().ok_or(Error::NoMatchingFormat)?;
    trace!(
        "[ {} ]: chose itag {} (catalog index {})",
        chosen.origin, chosen.itag, index
    );
    Ok((*chosen).clone())
}
