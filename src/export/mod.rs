//! Export Pipeline
//!
//! Turns the selected windows of both tracks into downloadable files:
//! extraction, WAV framing, lossy re-encoding, and delivery to a sink.

mod encoder;
mod pipeline;
mod request;
mod sink;

#[cfg(feature = "lame")]
pub use encoder::LameEncoder;
pub use encoder::{EncodeJob, LossyEncoder, PassthroughEncoder, VirtualFs};
pub use pipeline::{export, ExportArtifact, ExportReport};
pub use request::{
    default_filename, track_name_from_file, ExportContent, ExportOptions, ExportRequest,
    OutputFormat, TrackExport, DEFAULT_BITRATE_KBPS, DEFAULT_TRACK_NAME,
};
pub use sink::{DirectorySink, DownloadSink, MemorySink};
