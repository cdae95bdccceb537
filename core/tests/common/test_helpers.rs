/// Common test helper functions

use sayonara_shred::EngineConfig;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Small chunks and no terminal output
pub fn test_config() -> EngineConfig {
    EngineConfig {
        chunk_size: 4096,
        progress: false,
        ..Default::default()
    }
}

/// Verify that a file contains only zeros
pub fn verify_all_zeros(path: &Path) -> std::io::Result<bool> {
    verify_pattern(path, &[0x00])
}

/// Verify that a file contains a specific repeating pattern
pub fn verify_pattern(path: &Path, pattern: &[u8]) -> std::io::Result<bool> {
    let mut file = fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let mut offset = 0usize;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        for &byte in &buffer[..bytes_read] {
            if byte != pattern[offset % pattern.len()] {
                return Ok(false);
            }
            offset += 1;
        }
    }

    Ok(true)
}

/// Calculate Shannon entropy of a file in bits per byte
pub fn calculate_file_entropy(path: &Path) -> std::io::Result<f64> {
    let buffer = fs::read(path)?;
    if buffer.is_empty() {
        return Ok(0.0);
    }

    let mut counts = [0u64; 256];
    for &byte in &buffer {
        counts[byte as usize] += 1;
    }

    let length = buffer.len() as f64;
    Ok(counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / length;
            -p * p.log2()
        })
        .sum())
}

/// Number of entries left directly under `dir`
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
