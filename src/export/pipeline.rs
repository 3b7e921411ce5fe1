//! Export pipeline
//!
//! extract → 32-bit float WAV → lossy encoder → sink, one file at a time.
//! The encoder is a single shared resource, so jobs never overlap. A
//! failure stops the pipeline with one error; files saved before it stay
//! saved.

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::{encode_wav, extract, BitDepth};
use crate::error::Result;
use crate::export::encoder::{EncodeJob, LossyEncoder};
use crate::export::request::ExportRequest;
use crate::export::sink::DownloadSink;
use crate::window::{TimeWindow, TrackId};

/// One exported file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub track: TrackId,
    pub filename: String,
    /// Window exported, in the track's own time base
    pub window: TimeWindow,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Summary of a finished export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub track_name: String,
    pub encoder: String,
    pub bitrate_kbps: u32,
    pub created_at: DateTime<Utc>,
    pub artifacts: Vec<ExportArtifact>,
}

impl ExportReport {
    /// Pretty JSON manifest of the export
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run an export
///
/// `progress` is called after each file is encoded with the file name and
/// a step-count percentage (50 then 100 for two files).
pub fn export<E, S>(
    request: &ExportRequest,
    encoder: &mut E,
    sink: &mut S,
    progress: &mut dyn FnMut(&str, u8),
) -> Result<ExportReport>
where
    E: LossyEncoder + ?Sized,
    S: DownloadSink + ?Sized,
{
    let result = run(request, encoder, sink, progress);
    if let Err(err) = &result {
        error!("Export of '{}' failed: {}", request.track_name, err);
    }
    result
}

fn run<E, S>(
    request: &ExportRequest,
    encoder: &mut E,
    sink: &mut S,
    progress: &mut dyn FnMut(&str, u8),
) -> Result<ExportReport>
where
    E: LossyEncoder + ?Sized,
    S: DownloadSink + ?Sized,
{
    info!(
        "Exporting {} file(s) of '{}' via {} at {} kbps",
        request.files.len(),
        request.track_name,
        encoder.name(),
        request.bitrate_kbps
    );

    // Extract and frame everything up front so a bad window fails before
    // the encoder is touched.
    let wavs = request
        .files
        .iter()
        .map(|file| {
            let window = extract(&file.buffer, file.window.start(), file.window.end())?;
            Ok(encode_wav(&window, BitDepth::Float32))
        })
        .collect::<Result<Vec<Vec<u8>>>>()?;

    encoder.load()?;

    let total = request.files.len();
    let mut artifacts = Vec::with_capacity(total);

    for (index, (file, wav)) in request.files.iter().zip(wavs).enumerate() {
        let step = index + 1;
        let job = EncodeJob {
            input: format!("input{}.wav", step),
            bitrate_kbps: request.bitrate_kbps,
            output: format!("output{}.{}", step, request.format.extension()),
        };

        encoder.write_file(&job.input, wav)?;
        encoder.exec(&job)?;
        progress(&file.filename, (step * 100 / total) as u8);

        let data = encoder.read_file(&job.output)?;
        sink.save(&data, &file.filename)?;

        artifacts.push(ExportArtifact {
            track: file.track,
            filename: file.filename.clone(),
            window: file.window,
            size_bytes: data.len(),
            sha256: format!("{:x}", Sha256::digest(&data)),
        });
    }

    Ok(ExportReport {
        track_name: request.track_name.clone(),
        encoder: encoder.name().to_string(),
        bitrate_kbps: request.bitrate_kbps,
        created_at: Utc::now(),
        artifacts,
    })
}
