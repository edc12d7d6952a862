use crate::scoring::TextProfile;
use crate::types::Assessment;

/// One independently testable teaching-quality signal, normalized to [0, 1].
pub trait Signal: Send + Sync {
    fn name(&self) -> &'static str;
    fn measure(&self, profile: &TextProfile) -> f32;
}

/// Turns chunk text into score, level, vocabulary and grammar tags.
///
/// Implementations must be pure: the batch pipeline calls them from many
/// threads and relies on identical input yielding identical output.
pub trait Assessor: Send + Sync {
    fn assess(&self, text: &str) -> Assessment;
}
