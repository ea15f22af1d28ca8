//! Buffer materialization: read a buffer's bytes and reconcile them with its
//! declared `byteLength`.

use std::path::Path;

use crate::document::Buffer;
use crate::error::{ResolveError, ShortBufferError};
use crate::source::BufferSource;

/// Bytes of one buffer, exactly `byteLength` long.
#[derive(Debug)]
pub struct Materialized {
    pub data: Vec<u8>,
    /// Set when the source held fewer bytes than declared.
    pub short: Option<ShortBufferError>,
}

/// Read `buffer` through `source`.
///
/// Extra bytes past `byteLength` are dropped. Missing bytes are reported in
/// [`Materialized::short`] and the data is zero-extended to the declared
/// length, so later byte ranges never reach past the end.
pub fn materialize(
    index: usize,
    buffer: &Buffer,
    source: &dyn BufferSource,
    search_paths: &[&Path],
) -> Result<Materialized, ResolveError> {
    let uri = buffer
        .uri
        .as_deref()
        .ok_or(ResolveError::MissingUri { buffer: index })?;
    if search_paths.is_empty() {
        return Err(ResolveError::NoSearchPath {
            buffer: index,
            uri: uri.to_owned(),
        });
    }

    let mut data = source
        .fetch(uri, search_paths)
        .map_err(|source| ResolveError::Io {
            buffer: index,
            uri: uri.to_owned(),
            source,
        })?;

    let expected = buffer.byte_length;
    let actual = data.len();
    let short = if actual < expected {
        data.resize(expected, 0);
        Some(ShortBufferError {
            buffer: index,
            uri: uri.to_owned(),
            expected,
            actual,
        })
    } else {
        data.truncate(expected);
        None
    };

    Ok(Materialized { data, short })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn buffer(byte_length: usize) -> Buffer {
        Buffer {
            uri: Some("data.bin".into()),
            byte_length,
            ..Buffer::default()
        }
    }

    fn serve(bytes: Vec<u8>) -> impl Fn(&str, &[&Path]) -> io::Result<Vec<u8>> {
        move |_uri: &str, _paths: &[&Path]| Ok(bytes.clone())
    }

    #[test]
    fn exact_length_is_kept() {
        let m = materialize(0, &buffer(4), &serve(vec![1, 2, 3, 4]), &[Path::new(".")]).unwrap();
        assert_eq!(m.data, vec![1, 2, 3, 4]);
        assert!(m.short.is_none());
    }

    #[test]
    fn short_data_is_zero_padded_and_reported() {
        let m = materialize(2, &buffer(6), &serve(vec![9, 9]), &[Path::new(".")]).unwrap();
        assert_eq!(m.data, vec![9, 9, 0, 0, 0, 0]);
        let short = m.short.expect("short buffer reported");
        assert_eq!(short.buffer, 2);
        assert_eq!(short.uri, "data.bin");
        assert_eq!((short.expected, short.actual), (6, 2));
    }

    #[test]
    fn long_data_is_truncated() {
        let m = materialize(0, &buffer(2), &serve(vec![1, 2, 3, 4]), &[Path::new(".")]).unwrap();
        assert_eq!(m.data, vec![1, 2]);
        assert!(m.short.is_none());
    }

    #[test]
    fn read_failure_is_io_error() {
        let failing = |_: &str, _: &[&Path]| -> io::Result<Vec<u8>> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        };
        let err = materialize(1, &buffer(2), &failing, &[Path::new(".")]).unwrap_err();
        assert!(matches!(err, ResolveError::Io { buffer: 1, .. }));
    }

    #[test]
    fn missing_uri_and_search_path() {
        let no_uri = Buffer {
            uri: None,
            byte_length: 4,
            ..Buffer::default()
        };
        let err = materialize(0, &no_uri, &serve(vec![]), &[Path::new(".")]).unwrap_err();
        assert!(matches!(err, ResolveError::MissingUri { buffer: 0 }));

        let err = materialize(0, &buffer(4), &serve(vec![]), &[]).unwrap_err();
        assert!(matches!(err, ResolveError::NoSearchPath { .. }));
    }
}
