//! Embedded fallback gong.
//!
//! This module provides gong data that is compiled into the binary, used
//! whenever the configured gong file is missing or cannot be decoded. The
//! payload is a minimal valid WAV so the playback path always has a
//! decodable source, even on a fresh install with no assets directory.

/// Embedded fallback gong data (minimal silent WAV).
///
/// WAV format structure:
/// - RIFF header (12 bytes)
/// - fmt chunk (24 bytes)
/// - data chunk header (8 bytes)
/// - audio data (empty)
pub const EMBEDDED_GONG_DATA: &[u8] = &[
    // RIFF header
    0x52, 0x49, 0x46, 0x46, // "RIFF"
    0x24, 0x00, 0x00, 0x00, // File size - 8 (36 bytes)
    0x57, 0x41, 0x56, 0x45, // "WAVE"
    // fmt chunk
    0x66, 0x6D, 0x74, 0x20, // "fmt "
    0x10, 0x00, 0x00, 0x00, // Chunk size (16 bytes)
    0x01, 0x00, // Audio format (1 = PCM)
    0x01, 0x00, // Number of channels (1 = mono)
    0x44, 0xAC, 0x00, 0x00, // Sample rate (44100 Hz)
    0x88, 0x58, 0x01, 0x00, // Byte rate (44100 * 1 * 2 = 88200)
    0x02, 0x00, // Block align (1 * 2 = 2)
    0x10, 0x00, // Bits per sample (16)
    // data chunk header
    0x64, 0x61, 0x74, 0x61, // "data"
    0x00, 0x00, 0x00, 0x00, // Data size (0 bytes - silent)
];

/// Returns the embedded fallback gong data.
#[must_use]
pub const fn embedded_gong() -> &'static [u8] {
    EMBEDDED_GONG_DATA
}
