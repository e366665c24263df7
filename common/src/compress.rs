use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// A gzip body held fully in memory, ready for a single put.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub body: Vec<u8>,
    pub original_size: usize,
}

impl Compressed {
    pub fn stored_size(&self) -> usize {
        self.body.len()
    }
}

/// Gzip `payloads` joined by a newline, one payload per line.
pub fn gzip_records<'a, I>(payloads: I) -> std::io::Result<Compressed>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    let mut original_size = 0;

    for (i, payload) in payloads.into_iter().enumerate() {
        if i > 0 {
            encoder.write_all(b"\n")?;
            original_size += 1;
        }
        encoder.write_all(payload)?;
        original_size += payload.len();
    }

    Ok(Compressed {
        body: encoder.finish()?,
        original_size,
    })
}

pub fn gzip_message(payload: &[u8]) -> std::io::Result<Compressed> {
    gzip_records([payload])
}
