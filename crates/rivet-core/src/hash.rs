use xxhash_rust::xxh64::xxh64;

const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode a u64 value as a base62 string (11 chars, zero-padded).
fn base62_encode(mut value: u64) -> String {
    let mut result = [b'0'; 11];
    let mut idx = result.len();
    while value > 0 && idx > 0 {
        idx -= 1;
        result[idx] = BASE62_CHARS[(value % 62) as usize];
        value /= 62;
    }
    result.iter().map(|&b| b as char).collect()
}

/// Compute a stable fingerprint over ordered parts.
///
/// fingerprint = base62(xxhash64(parts joined by '\0'))
///
/// Used for diagnostic results and producer keys so reports can be diffed and
/// deduplicated across runs.
pub fn compute_fingerprint(parts: &[&str]) -> String {
    let capacity = parts.iter().map(|p| p.len() + 1).sum();
    let mut input = String::with_capacity(capacity);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            input.push('\0');
        }
        input.push_str(part);
    }
    base62_encode(xxh64(input.as_bytes(), 0))
}
