//! DEFLATE compression backend for [`super::Mode::Zlib`].

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

pub fn compress(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(raw)?;
    let out = encoder.finish()?;
    crate::logging::log_debug(&format!(
        "zlib encode: {} -> {} bytes (ratio {:.2})",
        raw.len(),
        out.len(),
        out.len() as f64 / raw.len().max(1) as f64
    ));
    Ok(out)
}

pub fn decompress(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let raw = [1u8, 2, 3, 4, 5, 0, 0, 0];
        let compressed = compress(&raw).unwrap();
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, raw);
    }

    #[test]
    fn garbage_input_does_not_panic() {
        assert!(decompress(&[0xFF, 0x00, 0x11]).is_err());
    }
}
