// Fixed-format temperature decoding: `-?d?d.d`, read right to left from the
// newline. No general number parser is involved; each byte sits at a known
// offset from the `.`.

#[inline]
fn digit(line: &[u8], at: usize) -> Option<i16> {
    let byte = *line.get(at)?;
    byte.is_ascii_digit().then(|| i16::from(byte - b'0'))
}

/// Decodes the temperature that ends just before `newline`.
///
/// Returns the value in tenths of a degree and the index of the `;` that
/// separates it from the station name, or `None` when the bytes do not have
/// the exact `-?d?d.d` shape.
pub fn decode_temperature(line: &[u8], newline: usize) -> Option<(i16, usize)> {
    let tenths = digit(line, newline.checked_sub(1)?)?;
    if *line.get(newline.checked_sub(2)?)? != b'.' {
        return None;
    }
    let ones_at = newline.checked_sub(3)?;
    let mut value = digit(line, ones_at)? * 10 + tenths;

    let mut at = ones_at.checked_sub(1)?;
    if let Some(tens) = digit(line, at) {
        value += tens * 100;
        at = at.checked_sub(1)?;
    }
    let negative = *line.get(at)? == b'-';
    if negative {
        value = -value;
        at = at.checked_sub(1)?;
    }

    (*line.get(at)? == b';').then_some((value, at))
}
