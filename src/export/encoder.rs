//! Lossy encoder contract
//!
//! The encoder is an external resource with its own in-memory filesystem:
//! WAV input is written under a name, `exec` turns it into an output file,
//! and the result is read back. One encoder serves one job at a time.

use std::collections::HashMap;

use log::debug;

use crate::engine::decode_wav;
use crate::error::{MirrorError, Result};

/// One encode invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub input: String,
    pub bitrate_kbps: u32,
    pub output: String,
}

/// An external lossy encoder driven through a virtual filesystem
pub trait LossyEncoder {
    /// Short identifier used in logs and reports
    fn name(&self) -> &str;

    /// Prepare the encoder; called once before the first job of an export
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_file(&mut self, name: &str, data: Vec<u8>) -> Result<()>;

    fn exec(&mut self, job: &EncodeJob) -> Result<()>;

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// Flat in-memory file store used by the bundled encoders
#[derive(Debug, Default)]
pub struct VirtualFs {
    files: HashMap<String, Vec<u8>>,
}

impl VirtualFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, name: &str, data: Vec<u8>) {
        self.files.insert(name.to_string(), data);
    }

    pub fn read(&self, name: &str) -> Result<&[u8]> {
        self.files
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MirrorError::encode(format!("no such file in encoder fs: {}", name)))
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.files.remove(name)
    }
}

/// Encoder that validates its WAV input and keeps it unchanged
///
/// Used for WAV output, where no lossy step is wanted.
#[derive(Debug, Default)]
pub struct PassthroughEncoder {
    fs: VirtualFs,
}

impl PassthroughEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LossyEncoder for PassthroughEncoder {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn write_file(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        self.fs.write(name, data);
        Ok(())
    }

    fn exec(&mut self, job: &EncodeJob) -> Result<()> {
        let input = self.fs.read(&job.input)?.to_vec();
        // Reject anything a real encoder would fail to parse
        decode_wav(&input).map_err(|e| MirrorError::encode(format!("{}: {}", job.input, e)))?;
        debug!("passthrough {} -> {}", job.input, job.output);
        self.fs.write(&job.output, input);
        Ok(())
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        self.fs
            .remove(name)
            .ok_or_else(|| MirrorError::encode(format!("no such file in encoder fs: {}", name)))
    }
}

#[cfg(feature = "lame")]
pub use lame::LameEncoder;

#[cfg(feature = "lame")]
mod lame {
    use log::debug;
    use mp3lame_encoder::{
        max_required_buffer_size, Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm, Quality,
    };

    use super::{EncodeJob, LossyEncoder, VirtualFs};
    use crate::engine::{decode_wav, resample_linear, PcmBuffer};
    use crate::error::{MirrorError, Result};

    /// Sample rate used when LAME rejects the source rate
    const FALLBACK_SAMPLE_RATE: u32 = 44_100;

    /// MP3 encoder backed by LAME
    #[derive(Debug, Default)]
    pub struct LameEncoder {
        fs: VirtualFs,
    }

    impl LameEncoder {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl LossyEncoder for LameEncoder {
        fn name(&self) -> &str {
            "lame"
        }

        fn write_file(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
            self.fs.write(name, data);
            Ok(())
        }

        fn exec(&mut self, job: &EncodeJob) -> Result<()> {
            let buffer = decode_wav(self.fs.read(&job.input)?)
                .map_err(|e| MirrorError::encode(format!("{}: {}", job.input, e)))?;
            let mp3 = encode_mp3(&buffer, job.bitrate_kbps)?;
            debug!(
                "lame {} -> {} ({} bytes @ {} kbps)",
                job.input,
                job.output,
                mp3.len(),
                job.bitrate_kbps
            );
            self.fs.remove(&job.input);
            self.fs.write(&job.output, mp3);
            Ok(())
        }

        fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
            self.fs
                .remove(name)
                .ok_or_else(|| MirrorError::encode(format!("no such file in encoder fs: {}", name)))
        }
    }

    fn bitrate(kbps: u32) -> Result<Bitrate> {
        Ok(match kbps {
            8 => Bitrate::Kbps8,
            16 => Bitrate::Kbps16,
            24 => Bitrate::Kbps24,
            32 => Bitrate::Kbps32,
            40 => Bitrate::Kbps40,
            48 => Bitrate::Kbps48,
            64 => Bitrate::Kbps64,
            80 => Bitrate::Kbps80,
            96 => Bitrate::Kbps96,
            112 => Bitrate::Kbps112,
            128 => Bitrate::Kbps128,
            160 => Bitrate::Kbps160,
            192 => Bitrate::Kbps192,
            224 => Bitrate::Kbps224,
            256 => Bitrate::Kbps256,
            320 => Bitrate::Kbps320,
            other => return Err(MirrorError::encode(format!("unsupported MP3 bitrate {} kbps", other))),
        })
    }

    fn encode_mp3(buffer: &PcmBuffer, kbps: u32) -> Result<Vec<u8>> {
        // LAME takes at most two channels
        let mut chans: Vec<Vec<f32>> = buffer.channels().iter().take(2).cloned().collect();
        let mut sample_rate = buffer.sample_rate();

        let mut builder = Builder::new().ok_or_else(|| MirrorError::encode("init mp3 encoder"))?;
        builder
            .set_num_channels(chans.len() as u8)
            .map_err(|e| MirrorError::encode(format!("mp3 channels: {:?}", e)))?;
        if let Err(err) = builder.set_sample_rate(sample_rate) {
            if matches!(err, mp3lame_encoder::BuildError::BadSampleFreq) {
                chans = chans
                    .iter()
                    .map(|c| resample_linear(c, sample_rate, FALLBACK_SAMPLE_RATE))
                    .collect();
                sample_rate = FALLBACK_SAMPLE_RATE;
                builder
                    .set_sample_rate(sample_rate)
                    .map_err(|e| MirrorError::encode(format!("mp3 sample rate: {:?}", e)))?;
            } else {
                return Err(MirrorError::encode(format!("mp3 sample rate: {:?}", err)));
            }
        }
        builder
            .set_brate(bitrate(kbps)?)
            .map_err(|e| MirrorError::encode(format!("mp3 bitrate: {:?}", e)))?;
        builder
            .set_quality(Quality::Best)
            .map_err(|e| MirrorError::encode(format!("mp3 quality: {:?}", e)))?;
        let mut encoder = builder
            .build()
            .map_err(|e| MirrorError::encode(format!("mp3 build: {:?}", e)))?;

        let frames = chans[0].len().max(1);
        let mut out = Vec::with_capacity(max_required_buffer_size(frames));
        if chans.len() == 1 {
            encoder
                .encode_to_vec(MonoPcm(&chans[0]), &mut out)
                .map_err(|e| MirrorError::encode(format!("mp3 encode: {:?}", e)))?;
        } else {
            let input = DualPcm {
                left: &chans[0],
                right: &chans[1],
            };
            encoder
                .encode_to_vec(input, &mut out)
                .map_err(|e| MirrorError::encode(format!("mp3 encode: {:?}", e)))?;
        }
        encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| MirrorError::encode(format!("mp3 flush: {:?}", e)))?;

        Ok(out)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{encode_wav, BitDepth, PcmBuffer};

    fn job() -> EncodeJob {
        EncodeJob {
            input: "input1.wav".to_string(),
            bitrate_kbps: 320,
            output: "output1.wav".to_string(),
        }
    }

    #[test]
    fn test_passthrough_keeps_bytes() {
        let buffer = PcmBuffer::new(vec![vec![0.1, -0.2, 0.3]], 8000).unwrap();
        let wav = encode_wav(&buffer, BitDepth::Float32);

        let mut encoder = PassthroughEncoder::new();
        encoder.load().unwrap();
        encoder.write_file("input1.wav", wav.clone()).unwrap();
        encoder.exec(&job()).unwrap();

        assert_eq!(encoder.read_file("output1.wav").unwrap(), wav);
        // Output is consumed on read
        assert!(encoder.read_file("output1.wav").is_err());
    }

    #[test]
    fn test_passthrough_rejects_invalid_input() {
        let mut encoder = PassthroughEncoder::new();
        encoder.write_file("input1.wav", b"junk".to_vec()).unwrap();
        assert!(matches!(
            encoder.exec(&job()),
            Err(MirrorError::Encode { .. })
        ));
    }

    #[test]
    fn test_exec_without_input_fails() {
        let mut encoder = PassthroughEncoder::new();
        assert!(matches!(
            encoder.exec(&job()),
            Err(MirrorError::Encode { .. })
        ));
    }

    #[test]
    fn test_virtual_fs() {
        let mut fs = VirtualFs::new();
        fs.write("a", vec![1, 2]);
        assert_eq!(fs.read("a").unwrap(), &[1, 2]);
        assert_eq!(fs.remove("a"), Some(vec![1, 2]));
        assert!(fs.read("a").is_err());
    }
}
