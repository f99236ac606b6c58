use std::io::Read;
use std::path::Path;

use sha1::Digest;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// Checksums of a whole file, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHashes {
    pub crc32: String,
    pub md5: String,
    pub sha1: String,
    pub size: u64,
}

/// Compute CRC32, MD5 and SHA1 of a file in one pass.
pub fn compute_hashes(path: &Path) -> std::io::Result<FileHashes> {
    let mut reader = std::fs::File::open(path)?;
    compute_hashes_from(&mut reader)
}

pub fn compute_hashes_from(reader: &mut dyn Read) -> std::io::Result<FileHashes> {
    let mut crc = crc32fast::Hasher::new();
    let mut sha = sha1::Sha1::new();
    let mut md5_ctx = md5::Context::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        crc.update(&buf[..n]);
        sha.update(&buf[..n]);
        md5_ctx.consume(&buf[..n]);
        size += n as u64;
    }

    Ok(FileHashes {
        crc32: format!("{:08x}", crc.finalize()),
        md5: format!("{:x}", md5_ctx.compute()),
        sha1: format!("{:x}", sha.finalize()),
        size,
    })
}

/// SHA1 of a file's contents.
pub fn sha1_file(path: &Path) -> std::io::Result<String> {
    let mut reader = std::fs::File::open(path)?;
    let mut sha = sha1::Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha.update(&buf[..n]);
    }
    Ok(format!("{:x}", sha.finalize()))
}

pub fn sha1_str(s: &str) -> String {
    format!("{:x}", sha1::Sha1::digest(s.as_bytes()))
}
