//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::config::SessionConfig;
use crate::engine::{decode_wav, decode_wav_file, encode_wav, reverse, BitDepth};
use crate::export::{
    export, DirectorySink, ExportContent, ExportOptions, ExportReport, ExportRequest,
    LossyEncoder, OutputFormat, PassthroughEncoder,
};
use crate::sync::{Command, Effect, Session};
use crate::window::{TrackId, TrackPair};

/// Arguments of the `export` command
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub input: PathBuf,
    pub track: TrackId,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub bitrate_kbps: Option<u32>,
    pub format: OutputFormat,
    pub full_track: bool,
    pub only: Option<TrackId>,
    pub out_dir: PathBuf,
    pub manifest: Option<PathBuf>,
}

/// Load the session config, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

/// Print a source's format and its initial windows.
pub fn info(config: &SessionConfig, input: &Path) -> Result<()> {
    let session = open_session(config, input)?;
    let original = session
        .track(TrackId::Original)
        .context("source was not installed")?;
    let buffer = &original.buffer;

    println!("File: {}", input.display());
    println!("Track name: {}", session.track_name());
    println!("Channels: {}", buffer.channel_count());
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Frames: {}", buffer.frame_count());
    println!("Duration: {:.3}s", buffer.duration_secs());

    for track in TrackId::ALL {
        if let Some(window) = session.window(track) {
            println!("{:<9} window: {}", track.label(), window);
        }
    }

    Ok(())
}

/// Write the reversed source as a WAV file.
pub fn reverse_file(input: &Path, output: &Path, depth: BitDepth) -> Result<()> {
    info!("Reversing {} -> {}", input.display(), output.display());

    let source = decode_wav_file(input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    let reversed = reverse(&source);
    let bytes = encode_wav(&reversed, depth);

    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Reversed {:.3}s -> {} ({}-bit, {} bytes)",
        reversed.duration_secs(),
        output.display(),
        depth.bits(),
        bytes.len()
    );
    Ok(())
}

/// Export the selected window of one or both tracks.
pub fn export_windows(config: &SessionConfig, args: &ExportArgs) -> Result<()> {
    let mut session = open_session(config, &args.input)?;

    if let Some(command) = window_command(&session, args)? {
        let effects = session.dispatch(command);
        fail_on_error(&session, &effects)?;
    }

    let options = ExportOptions {
        bitrate_kbps: args.bitrate_kbps,
        filenames: None,
        content: if args.full_track {
            ExportContent::FullTrack
        } else {
            ExportContent::Window
        },
        tracks: match args.only {
            Some(only) => TrackPair::from_fn(|track| track == only),
            None => TrackPair::new(true, true),
        },
        format: args.format,
    };

    let effects = session.dispatch(Command::ExportRequested(options));
    fail_on_error(&session, &effects)?;
    let request = effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::StartExport(request) => Some(request),
            _ => None,
        })
        .context("session produced no export request")?;

    let mut encoder = encoder_for(args.format)?;
    let mut sink = DirectorySink::new(&args.out_dir);
    let report = run_export(&mut session, &request, encoder.as_mut(), &mut sink)?;

    for artifact in &report.artifacts {
        println!(
            "{} {} ({} bytes, sha256 {})",
            artifact.filename, artifact.window, artifact.size_bytes, artifact.sha256
        );
    }

    if let Some(path) = &args.manifest {
        fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        info!("Manifest written to {}", path.display());
    }

    Ok(())
}

/// Decode `input` into a fresh session with both displays reported loaded
fn open_session(config: &SessionConfig, input: &Path) -> Result<Session> {
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid input path: {}", input.display()))?;

    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    config.validate_source(file_name, bytes.len() as u64)?;

    let mut session = Session::new(config.clone());
    let ticket = session.begin_load(file_name);
    let effects = session.finish_load(ticket, decode_wav(&bytes));
    fail_on_error(&session, &effects)?;

    let duration = session
        .windows()
        .map(|model| model.total_duration())
        .context("source was not installed")?;
    for track in TrackId::ALL {
        let effects = session.dispatch(Command::Decoded { track, duration });
        fail_on_error(&session, &effects)?;
    }

    Ok(session)
}

/// Command that applies the requested window, in original space
///
/// Bounds are passed through unchecked; the window model clamps them into
/// the track and rejects non-finite values.
fn window_command(session: &Session, args: &ExportArgs) -> Result<Option<Command>> {
    if args.start.is_none() && args.end.is_none() {
        return Ok(None);
    }

    let model = session.windows().context("source was not installed")?;
    let current = model.window(args.track);
    let start = args.start.unwrap_or(current.start());
    let end = args.end.unwrap_or(current.end());

    let (start, end) = match args.track {
        TrackId::Original => (start, end),
        TrackId::Reversed => {
            let total = model.total_duration();
            (total - end, total - start)
        }
    };

    Ok(Some(Command::SetSlider { start, end }))
}

fn fail_on_error(session: &Session, effects: &[Effect]) -> Result<()> {
    let failed = effects
        .iter()
        .any(|effect| matches!(effect, Effect::ShowError { .. }));
    match session.last_error() {
        Some(err) if failed => bail!("{}", err),
        _ => Ok(()),
    }
}

fn encoder_for(format: OutputFormat) -> Result<Box<dyn LossyEncoder>> {
    match format {
        OutputFormat::Wav => Ok(Box::new(PassthroughEncoder::new())),
        #[cfg(feature = "lame")]
        OutputFormat::Mp3 => Ok(Box::new(crate::export::LameEncoder::new())),
        #[cfg(not(feature = "lame"))]
        OutputFormat::Mp3 => {
            bail!("MP3 export needs the `lame` feature; rebuild with it or pass --format wav")
        }
    }
}

/// Run the export pipeline, reporting a failure to the session
fn run_export(
    session: &mut Session,
    request: &ExportRequest,
    encoder: &mut dyn LossyEncoder,
    sink: &mut DirectorySink,
) -> Result<ExportReport> {
    let report = export(request, encoder, sink, &mut |filename, percent| {
        println!("[{:>3}%] {}", percent, filename);
    });

    match report {
        Ok(report) => Ok(report),
        Err(err) => {
            if !sink.written().is_empty() {
                warn!(
                    "Export stopped early; kept {} file(s) in {}",
                    sink.written().len(),
                    sink.dir().display()
                );
            }
            let code = err.error_code();
            session.report(err);
            match session.last_error() {
                Some(err) => bail!("Export failed: {}", err),
                None => bail!("Export failed ({})", code),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PcmBuffer;
    use tempfile::tempdir;

    fn write_source(dir: &Path, seconds: usize) -> PathBuf {
        let samples: Vec<f32> = (0..seconds * 100).map(|i| (i % 100) as f32 / 100.0).collect();
        let buffer = PcmBuffer::new(vec![samples], 100).unwrap();
        let path = dir.join("track.wav");
        fs::write(&path, encode_wav(&buffer, BitDepth::Float32)).unwrap();
        path
    }

    fn args(input: PathBuf, out_dir: PathBuf) -> ExportArgs {
        ExportArgs {
            input,
            track: TrackId::Reversed,
            start: Some(70.0),
            end: Some(85.0),
            bitrate_kbps: None,
            format: OutputFormat::Wav,
            full_track: false,
            only: None,
            out_dir,
            manifest: None,
        }
    }

    #[test]
    fn test_export_wav_writes_both_tracks() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 90);
        let out_dir = dir.path().join("out");
        let mut args = args(input, out_dir.clone());
        args.manifest = Some(dir.path().join("manifest.json"));

        export_windows(&SessionConfig::default(), &args).unwrap();

        let original = decode_wav_file(&out_dir.join("[ORIGINAL] track.wav")).unwrap();
        let reversed = decode_wav_file(&out_dir.join("[REVERSED] track.wav")).unwrap();
        assert_eq!(original.frame_count(), 1500);
        assert_eq!(reversed.frame_count(), 1500);

        let manifest = fs::read_to_string(dir.path().join("manifest.json")).unwrap();
        assert!(manifest.contains("[REVERSED] track.wav"));
    }

    #[test]
    fn test_export_clamps_out_of_range_window() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 90);
        let out_dir = dir.path().join("out");
        let mut args = args(input, out_dir.clone());
        args.track = TrackId::Original;
        args.start = Some(-5.0);
        args.end = Some(10.0);
        args.only = Some(TrackId::Original);

        export_windows(&SessionConfig::default(), &args).unwrap();

        let original = decode_wav_file(&out_dir.join("[ORIGINAL] track.wav")).unwrap();
        assert_eq!(original.frame_count(), 1000);
    }

    #[test]
    fn test_export_clamps_reversed_window_past_end() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 90);
        let out_dir = dir.path().join("out");
        let mut args = args(input, out_dir.clone());
        args.start = Some(80.0);
        args.end = Some(100.0);
        args.only = Some(TrackId::Reversed);

        export_windows(&SessionConfig::default(), &args).unwrap();

        let reversed = decode_wav_file(&out_dir.join("[REVERSED] track.wav")).unwrap();
        assert_eq!(reversed.frame_count(), 1000);
    }

    #[test]
    fn test_export_rejects_non_finite_bound() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 30);
        let mut args = args(input, dir.path().join("out"));
        args.start = Some(f64::NAN);

        assert!(export_windows(&SessionConfig::default(), &args).is_err());
    }

    #[test]
    fn test_export_failure_reaches_session() {
        struct BrokenEncoder;

        impl LossyEncoder for BrokenEncoder {
            fn name(&self) -> &str {
                "broken"
            }

            fn write_file(&mut self, _name: &str, _data: Vec<u8>) -> crate::Result<()> {
                Ok(())
            }

            fn exec(&mut self, _job: &crate::export::EncodeJob) -> crate::Result<()> {
                Err(crate::MirrorError::encode("encoder crashed"))
            }

            fn read_file(&mut self, name: &str) -> crate::Result<Vec<u8>> {
                Err(crate::MirrorError::encode(format!("missing {}", name)))
            }
        }

        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 30);
        let mut session = open_session(&SessionConfig::default(), &input).unwrap();
        let request = session.export_request(&ExportOptions::default()).unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));

        let result = run_export(&mut session, &request, &mut BrokenEncoder, &mut sink);

        assert!(result.is_err());
        assert!(matches!(
            session.last_error(),
            Some(crate::MirrorError::Encode { .. })
        ));
        assert!(sink.written().is_empty());
    }

    #[test]
    fn test_export_only_one_track() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 30);
        let out_dir = dir.path().join("out");
        let mut args = args(input, out_dir.clone());
        args.start = None;
        args.end = None;
        args.only = Some(TrackId::Original);

        export_windows(&SessionConfig::default(), &args).unwrap();

        assert!(out_dir.join("[ORIGINAL] track.wav").exists());
        assert!(!out_dir.join("[REVERSED] track.wav").exists());
    }

    #[test]
    fn test_reverse_file() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path(), 2);
        let output = dir.path().join("reversed.wav");

        reverse_file(&input, &output, BitDepth::Float32).unwrap();

        let source = decode_wav_file(&input).unwrap();
        let reversed = decode_wav_file(&output).unwrap();
        assert_eq!(reverse(&reversed), source);
    }

    #[test]
    fn test_rejects_unsupported_source() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, b"hello").unwrap();

        assert!(info(&SessionConfig::default(), &input).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(Some(Path::new("/nonexistent/mirrorwave.json"))).is_err());
        assert_eq!(load_config(None).unwrap(), SessionConfig::default());
    }
}
