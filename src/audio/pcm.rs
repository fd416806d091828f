//! PCM sample conversion helpers.
//!
//! The wire format is 16-bit signed little-endian PCM, mono, 16 kHz.

/// Decode little-endian 16-bit PCM bytes into samples.
///
/// A trailing odd byte is ignored; callers that receive unaligned frames
/// must carry the remainder themselves.
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Convert i16 audio samples to f32 normalized to [-1.0, 1.0].
///
/// Whisper expects audio in f32 format normalized to the range [-1.0, 1.0].
/// Input is 16-bit PCM audio where samples range from -32768 to 32767.
pub fn samples_to_f32(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

/// Duration in seconds of a sample count at the given rate.
pub fn duration_secs(sample_count: usize, sample_rate: u32) -> f64 {
    sample_count as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_samples_little_endian() {
        // 0x0100 = 256, 0xFFFF = -1
        let bytes = [0x00, 0x01, 0xFF, 0xFF];
        assert_eq!(bytes_to_samples(&bytes), vec![256, -1]);
    }

    #[test]
    fn test_bytes_to_samples_ignores_trailing_odd_byte() {
        let bytes = [0x00, 0x01, 0x7F];
        assert_eq!(bytes_to_samples(&bytes), vec![256]);
    }

    #[test]
    fn test_bytes_to_samples_empty() {
        assert!(bytes_to_samples(&[]).is_empty());
    }

    #[test]
    fn test_samples_to_f32_range() {
        let samples = vec![0i16, 16384, -16384, 32767, -32768];
        let converted = samples_to_f32(&samples);

        assert_eq!(converted.len(), samples.len());
        assert_eq!(converted[0], 0.0);
        assert!((converted[1] - 0.5).abs() < 0.01);
        assert!((converted[2] + 0.5).abs() < 0.01);
        assert!((converted[3] - 1.0).abs() < 0.01);
        assert_eq!(converted[4], -1.0);
    }

    #[test]
    fn test_duration_secs() {
        assert_eq!(duration_secs(16000, 16000), 1.0);
        assert_eq!(duration_secs(8000, 16000), 0.5);
        assert_eq!(duration_secs(0, 16000), 0.0);
    }
}
