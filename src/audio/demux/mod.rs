//! Demux layer: container probing and decoder construction.

pub mod format;

pub use format::detect_format;

use symphonia::core::{
    codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions},
    formats::{FormatOptions, FormatReader},
    io::{MediaSource, MediaSourceStream},
    meta::MetadataOptions,
    probe::Hint,
};

use crate::audio::{
    constants::{OUTPUT_CHANNELS, TARGET_SAMPLE_RATE},
    error::AudioError,
};
pub use crate::common::types::AudioFormat;

/// A probed container with its first decodable audio track.
pub struct OpenedFormat {
    pub format: Box<dyn FormatReader>,
    pub decoder: Box<dyn Decoder>,
    pub track_id: u32,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Probe `source` and build a decoder for its first audio track.
pub fn open_format(
    source: Box<dyn MediaSource>,
    kind: AudioFormat,
) -> Result<OpenedFormat, AudioError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    let ext = kind.as_ext();
    if !ext.is_empty() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let track_id = track.id;
    let params = &track.codec_params;
    let sample_rate = params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);
    let channels = params
        .channels
        .map(|c| c.count())
        .unwrap_or(OUTPUT_CHANNELS);
    let decoder = symphonia::default::get_codecs().make(params, &DecoderOptions::default())?;

    Ok(OpenedFormat {
        format,
        decoder,
        track_id,
        sample_rate,
        channels,
    })
}
