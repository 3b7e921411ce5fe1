//! Export requests and options

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::PcmBuffer;
use crate::error::{MirrorError, Result};
use crate::window::{TimeWindow, TrackId, TrackPair};

/// Name used when the source file name has no usable stem
pub const DEFAULT_TRACK_NAME: &str = "Track";

/// Default lossy encoder bitrate
pub const DEFAULT_BITRATE_KBPS: u32 = 320;

/// Container of the exported files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
        }
    }
}

/// What part of each track is exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportContent {
    /// The selected window only
    #[default]
    Window,
    /// The entire track, ignoring the selection
    FullTrack,
}

/// User-facing export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Encoder bitrate; the session default is used when unset
    pub bitrate_kbps: Option<u32>,
    /// Output names; `[ORIGINAL] {name}.{ext}` / `[REVERSED] {name}.{ext}`
    /// when unset
    pub filenames: Option<TrackPair<String>>,
    pub content: ExportContent,
    /// Which tracks to export
    pub tracks: TrackPair<bool>,
    pub format: OutputFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            bitrate_kbps: None,
            filenames: None,
            content: ExportContent::Window,
            tracks: TrackPair::new(true, true),
            format: OutputFormat::Mp3,
        }
    }
}

/// One file to produce
#[derive(Debug, Clone, PartialEq)]
pub struct TrackExport {
    pub track: TrackId,
    pub buffer: Arc<PcmBuffer>,
    /// Window in this track's own time base
    pub window: TimeWindow,
    pub filename: String,
}

/// Everything the export pipeline needs, detached from the session
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub track_name: String,
    pub bitrate_kbps: u32,
    pub format: OutputFormat,
    /// Files in export order, original first
    pub files: Vec<TrackExport>,
}

impl ExportRequest {
    /// Build a request from per-track buffers and windows
    ///
    /// # Errors
    /// * `InvalidConfig` - no track selected, or a zero bitrate
    /// * `Range` - a full-track export of an empty buffer
    pub fn build(
        track_name: &str,
        buffers: &TrackPair<Arc<PcmBuffer>>,
        windows: &TrackPair<TimeWindow>,
        options: &ExportOptions,
        default_bitrate_kbps: u32,
    ) -> Result<Self> {
        let bitrate_kbps = options.bitrate_kbps.unwrap_or(default_bitrate_kbps);
        if bitrate_kbps == 0 {
            return Err(MirrorError::InvalidConfig {
                reason: "bitrate must be positive".to_string(),
            });
        }

        let mut files = Vec::with_capacity(2);
        for track in TrackId::ALL {
            if !options.tracks[track] {
                continue;
            }

            let buffer = Arc::clone(&buffers[track]);
            let window = match options.content {
                ExportContent::Window => windows[track],
                ExportContent::FullTrack => TimeWindow::new(0.0, buffer.duration_secs())?,
            };
            let filename = match &options.filenames {
                Some(names) => names[track].clone(),
                None => default_filename(track, track_name, options.format),
            };

            files.push(TrackExport {
                track,
                buffer,
                window,
                filename,
            });
        }

        if files.is_empty() {
            return Err(MirrorError::InvalidConfig {
                reason: "no track selected for export".to_string(),
            });
        }

        Ok(Self {
            track_name: track_name.to_string(),
            bitrate_kbps,
            format: options.format,
            files,
        })
    }
}

/// `[ORIGINAL] {name}.mp3` style output name
pub fn default_filename(track: TrackId, track_name: &str, format: OutputFormat) -> String {
    format!("[{}] {}.{}", track.label(), track_name, format.extension())
}

/// Display name of a source file: the name without its last extension
///
/// # Example
/// ```
/// use mirrorwave::export::track_name_from_file;
///
/// assert_eq!(track_name_from_file("My Song.final.mp3"), "My Song.final");
/// assert_eq!(track_name_from_file(".wav"), "Track");
/// ```
pub fn track_name_from_file(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() && !file_name[dot + 1..].contains('/') => {
            &file_name[..dot]
        }
        _ => file_name,
    };

    if stem.is_empty() {
        DEFAULT_TRACK_NAME.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn buffers() -> TrackPair<Arc<PcmBuffer>> {
        let buffer = Arc::new(PcmBuffer::silence(1, 800, 100).unwrap());
        TrackPair::new(Arc::clone(&buffer), buffer)
    }

    fn windows() -> TrackPair<TimeWindow> {
        TrackPair::new(
            TimeWindow::new(1.0, 2.0).unwrap(),
            TimeWindow::new(6.0, 7.0).unwrap(),
        )
    }

    #[test_case("track.mp3", "track")]
    #[test_case("a.b.c", "a.b")]
    #[test_case("noext", "noext")]
    #[test_case(".mp3", "Track")]
    #[test_case("", "Track")]
    #[test_case("trailing.", "trailing.")]
    fn test_track_name_from_file(file: &str, expected: &str) {
        assert_eq!(track_name_from_file(file), expected);
    }

    #[test]
    fn test_default_filenames() {
        let request =
            ExportRequest::build("track", &buffers(), &windows(), &ExportOptions::default(), 320)
                .unwrap();

        let names: Vec<&str> = request.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["[ORIGINAL] track.mp3", "[REVERSED] track.mp3"]);
        assert_eq!(request.bitrate_kbps, 320);
        assert_eq!(request.files[1].window, windows().reversed);
    }

    #[test]
    fn test_custom_options() {
        let options = ExportOptions {
            bitrate_kbps: Some(128),
            filenames: Some(TrackPair::new("a.wav".to_string(), "b.wav".to_string())),
            tracks: TrackPair::new(false, true),
            format: OutputFormat::Wav,
            ..ExportOptions::default()
        };
        let request = ExportRequest::build("track", &buffers(), &windows(), &options, 320).unwrap();

        assert_eq!(request.files.len(), 1);
        assert_eq!(request.files[0].track, TrackId::Reversed);
        assert_eq!(request.files[0].filename, "b.wav");
        assert_eq!(request.bitrate_kbps, 128);
    }

    #[test]
    fn test_full_track_content() {
        let options = ExportOptions {
            content: ExportContent::FullTrack,
            ..ExportOptions::default()
        };
        let request = ExportRequest::build("t", &buffers(), &windows(), &options, 320).unwrap();

        for file in &request.files {
            assert_eq!(file.window, TimeWindow::new(0.0, 8.0).unwrap());
        }
    }

    #[test]
    fn test_no_tracks_selected() {
        let options = ExportOptions {
            tracks: TrackPair::new(false, false),
            ..ExportOptions::default()
        };
        assert!(ExportRequest::build("t", &buffers(), &windows(), &options, 320).is_err());
    }

    #[test]
    fn test_wav_default_extension() {
        assert_eq!(
            default_filename(TrackId::Reversed, "x", OutputFormat::Wav),
            "[REVERSED] x.wav"
        );
    }
}
