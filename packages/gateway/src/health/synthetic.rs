//! Synthetic test fixtures used by `HealthChecker::FunctionalCheck`.

/// ~100ms of 16kHz/16-bit/mono PCM, a 440Hz sine at low amplitude
/// (~1000/32767), little-endian — spec §4.3.
pub fn synthetic_pcm_100ms_440hz() -> Vec<u8> {
    const SAMPLE_RATE: f64 = 16_000.0;
    const FREQUENCY: f64 = 440.0;
    const AMPLITUDE: f64 = 1000.0;
    const DURATION_SECS: f64 = 0.1;

    let sample_count = (SAMPLE_RATE * DURATION_SECS) as usize;
    let mut bytes = Vec::with_capacity(sample_count * 2);
    for n in 0..sample_count {
        let t = n as f64 / SAMPLE_RATE;
        let sample = (AMPLITUDE * (2.0 * std::f64::consts::PI * FREQUENCY * t).sin()) as i16;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Minimal valid 1x1 PNG, used as the VLLLM functional-check probe image.
pub fn one_by_one_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
        0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R', 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C,
        b'I', b'D', b'A', b'T', 0x08, 0xD7, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01,
        0x01, 0x00, 0x18, 0xDD, 0x8D, 0xB0, 0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N', b'D',
        0xAE, 0x42, 0x60, 0x82,
    ]
}
