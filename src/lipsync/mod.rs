//! Lip-sync — mouth shapes from speech alignment or live amplitude.

pub mod alignment;
pub mod sampler;
pub mod timeline;
pub mod viseme;

#[cfg(test)]
mod tests;

pub use alignment::{Alignment, TimedChar};
pub use sampler::{
    interpolated_jaw, sample_amplitude, sample_timeline, AmplitudeSmoother, PlaybackSample,
    PlaybackSampler, TimelineSample,
};
pub use timeline::{MouthEvent, Timeline};
pub use viseme::{MouthShape, Viseme};
