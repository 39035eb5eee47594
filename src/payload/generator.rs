use super::types::Payload;

/// Repeating unit every generated payload is built from
pub const PATTERN: &[u8; 10] = b"1234567890";

/// Build a payload of exactly `size` bytes by repeating [`PATTERN`]
/// and truncating the last repetition.
///
/// Pure function of `size`: the same size always yields the same bytes,
/// and `size == 0` yields an empty payload.
pub fn generate(size: usize) -> Payload {
    let data: Vec<u8> = PATTERN.iter().copied().cycle().take(size).collect();
    Payload::new(data)
}
