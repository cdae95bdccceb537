/// Read-back verification of the final overwrite pass
///
/// After the last pass has been flushed, the target is read from offset 0 and
/// compared chunk by chunk against the buffer that was written. Each chunk of
/// the target starts at offset 0 of that buffer, so the expected bytes for any
/// offset are `expected[offset % expected.len()]`.
use crate::io::WipeSink;
use std::io;

/// Compare the first `size` bytes of `sink` against repeated `expected`.
///
/// Returns the absolute offset of the first differing byte, or `None` when the
/// whole range matches. A target shorter than `size` is an `UnexpectedEof`
/// error.
pub fn verify_readback(
    sink: &mut dyn WipeSink,
    expected: &[u8],
    size: u64,
) -> io::Result<Option<u64>> {
    if size == 0 {
        return Ok(None);
    }
    if expected.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty reference buffer",
        ));
    }

    sink.rewind()?;

    let chunk = expected.len() as u64;
    let mut readback = vec![0u8; expected.len()];
    let mut offset = 0u64;

    while offset < size {
        let want = (size - offset).min(chunk) as usize;
        let mut filled = 0usize;

        while filled < want {
            match sink.read_chunk(&mut readback[filled..want]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("target ended at offset {}", offset + filled as u64),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if let Some(pos) = first_mismatch(&readback[..want], &expected[..want]) {
            return Ok(Some(offset + pos as u64));
        }

        offset += want as u64;
    }

    Ok(None)
}

fn first_mismatch(actual: &[u8], expected: &[u8]) -> Option<usize> {
    actual.iter().zip(expected).position(|(a, e)| a != e)
}
