// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const GZ_BUF_SIZE: usize = 1 << 20;

/// Open a (possibly gzipped) file into a BufReader.
pub fn open_with_gz(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path).with_context(|| path.display().to_string())?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::with_capacity(
            GZ_BUF_SIZE,
            MultiGzDecoder::new(f),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(32 * 1024, f)))
    }
}

/// Create `path` for buffered writing.
pub fn create_buffered(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(
        File::create(path).with_context(|| path.display().to_string())?,
    ))
}
