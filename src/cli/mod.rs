//! CLI Module
//!
//! Command-line interface for mirrorwave.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::BitDepth;
use crate::export::OutputFormat;
use crate::window::TrackId;

/// Mirrorwave - play, trim and export a track alongside its reverse
#[derive(Parser, Debug)]
#[command(name = "mirrorwave")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Session config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a source file's format and initial windows
    #[command(name = "info")]
    Info {
        /// Input WAV file
        input: PathBuf,
    },

    /// Write the reversed track as a WAV file
    #[command(name = "reverse")]
    Reverse {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Sample format of the output
        #[arg(long, value_enum, default_value = "16")]
        bit_depth: DepthArg,
    },

    /// Export the selected window of both tracks
    #[command(name = "export")]
    Export {
        /// Input WAV file
        input: PathBuf,

        /// Track whose time base --start/--end are given in
        #[arg(long, value_enum, default_value_t = TrackArg::Original)]
        track: TrackArg,

        /// Window start in seconds
        #[arg(long)]
        start: Option<f64>,

        /// Window end in seconds
        #[arg(long)]
        end: Option<f64>,

        /// Encoder bitrate in kbps
        #[arg(long)]
        bitrate: Option<u32>,

        /// Output container
        #[arg(long, value_enum, default_value_t = FormatArg::Mp3)]
        format: FormatArg,

        /// Export whole tracks instead of the window
        #[arg(long)]
        full_track: bool,

        /// Export one track only
        #[arg(long, value_enum)]
        only: Option<TrackArg>,

        /// Directory the files are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Write a JSON manifest of the export to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackArg {
    Original,
    Reversed,
}

impl From<TrackArg> for TrackId {
    fn from(arg: TrackArg) -> Self {
        match arg {
            TrackArg::Original => TrackId::Original,
            TrackArg::Reversed => TrackId::Reversed,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthArg {
    /// 16-bit integer PCM
    #[value(name = "16")]
    Int16,
    /// 32-bit IEEE float
    #[value(name = "32")]
    Float32,
}

impl From<DepthArg> for BitDepth {
    fn from(arg: DepthArg) -> Self {
        match arg {
            DepthArg::Int16 => BitDepth::Int16,
            DepthArg::Float32 => BitDepth::Float32,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Mp3,
    Wav,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Mp3 => OutputFormat::Mp3,
            FormatArg::Wav => OutputFormat::Wav,
        }
    }
}
