//! Container detection by header sniffing, for streams without a file name.

use crate::common::types::AudioFormat;

/// Sniff the container from the first bytes of a stream.
///
/// Needs at least 4 bytes; anything unrecognised is `AudioFormat::Unknown`.
pub fn detect_format(header: &[u8]) -> AudioFormat {
    if header.len() < 4 {
        return AudioFormat::Unknown;
    }

    match header {
        [0x1A, 0x45, 0xDF, 0xA3, ..] => AudioFormat::Webm,
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => AudioFormat::Mp4,
        [b'O', b'g', b'g', b'S', ..] => AudioFormat::Ogg,
        [b'f', b'L', b'a', b'C', ..] => AudioFormat::Flac,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => AudioFormat::Wav,
        [b'I', b'D', b'3', ..] => AudioFormat::Mp3,
        // ADTS sync word with layer bits 00.
        [0xFF, b, ..] if b & 0xF6 == 0xF0 => AudioFormat::Aac,
        // MPEG audio frame sync.
        [0xFF, b, ..] if b & 0xE0 == 0xE0 => AudioFormat::Mp3,
        _ => AudioFormat::Unknown,
    }
}
