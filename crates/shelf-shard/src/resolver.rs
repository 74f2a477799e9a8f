/// Map an identifier to a shard code of `width` characters drawn from
/// `alphabet`.
///
/// The identifier's UTF-8 bytes are read as signed bytes and mixed position by
/// position into an output buffer that starts out all zero. Each round `i`
/// (for `i` in `0..max(bytes, width)`) computes
///
/// ```text
/// mixed  = byte[i % n] * (i + 1) * 13
/// mixed *= 1 + i + code(out[prev slot])
/// out[i % width] = alphabet[|mixed| % alphabet.len()]
/// ```
///
/// where the previous slot wraps around to the last position for slot 0,
/// chaining every position to its predecessor. Arithmetic is 32-bit
/// two's-complement with wrapping, and `|i32::MIN|` is taken as its unsigned
/// magnitude.
///
/// An empty identifier, a zero width or an empty alphabet yields an empty
/// string.
///
/// ```
/// use shelf_shard::resolve;
///
/// let alphabet: Vec<char> = "0123456789abcdefghijklmnopqrstuvwxyz".chars().collect();
/// assert_eq!(resolve("a", 5, &alphabet), "1u0so");
/// assert_eq!(resolve("", 5, &alphabet), "");
/// ```
pub fn resolve(identifier: &str, width: usize, alphabet: &[char]) -> String {
    let bytes = identifier.as_bytes();
    if bytes.is_empty() || width == 0 || alphabet.is_empty() {
        return String::new();
    }

    let mut out = vec!['\0'; width];
    let rounds = bytes.len().max(width);

    for i in 0..rounds {
        let value = bytes[i % bytes.len()] as i8 as i32;
        let slot = i % width;
        let prev = out[if slot == 0 { width - 1 } else { slot - 1 }] as u32 as i32;
        let step = (i as i32).wrapping_add(1);

        let mut mixed = value.wrapping_mul(step).wrapping_mul(13);
        mixed = mixed.wrapping_mul(step.wrapping_add(prev));

        let index = mixed.unsigned_abs() as usize % alphabet.len();
        out[slot] = alphabet[index];
    }

    out.into_iter().collect()
}
