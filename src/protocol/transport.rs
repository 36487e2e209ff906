use std::io::{self, Read, Write};

use bincode::{
    config::{BigEndian, Configuration, Fixint},
    decode_from_std_read, encode_into_std_write,
};
use thiserror::Error;

use super::{Request, Response};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to encode message: {0}")]
    Serialize(#[from] bincode::error::EncodeError),
    #[error("failed to decode message: {0}")]
    Deserialize(#[from] bincode::error::DecodeError),
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// True when the underlying read hit its timeout rather than failing;
    /// the connection loop uses this to poll the shutdown flag.
    pub(crate) fn is_timeout(&self) -> bool {
        matches!(
            self.io_kind(),
            Some(io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }

    /// True when the peer closed the stream mid-frame or between frames.
    pub(crate) fn is_disconnect(&self) -> bool {
        matches!(
            self.io_kind(),
            Some(io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset)
        )
    }

    fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            TransportError::Io(e) => Some(e.kind()),
            TransportError::Deserialize(bincode::error::DecodeError::Io { inner, .. }) => {
                Some(inner.kind())
            }
            _ => None,
        }
    }
}

pub struct ProtocolTransport<T: Read + Write> {
    stream: T,
    config: Configuration<BigEndian, Fixint>,
    // Bytes of a frame whose read was cut short, held for the next attempt.
    held: Vec<u8>,
}

impl<T: Read + Write> ProtocolTransport<T> {
    pub fn new(stream: T) -> Self {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_fixed_int_encoding();
        Self {
            stream,
            config,
            held: Vec::new(),
        }
    }

    pub fn write_request(&mut self, req: Request) -> Result<(), TransportError> {
        encode_into_std_write(req, &mut self.stream, self.config)?;
        Ok(())
    }

    pub fn write_response(&mut self, resp: Response) -> Result<(), TransportError> {
        encode_into_std_write(resp, &mut self.stream, self.config)?;
        Ok(())
    }

    pub fn read_response(&mut self) -> Result<Response, TransportError> {
        self.read_frame()
    }

    /// Reads one request frame.
    ///
    /// On a read timeout the bytes consumed so far are kept, and the next
    /// call resumes the same frame where it left off. A frame may therefore
    /// straddle any number of timeouts without desyncing the stream.
    pub fn read_request(&mut self) -> Result<Request, TransportError> {
        self.read_frame()
    }

    fn read_frame<D: bincode::Decode<()>>(&mut self) -> Result<D, TransportError> {
        let mut reader = ResumingReader {
            stream: &mut self.stream,
            held: &mut self.held,
            pos: 0,
        };
        let frame = decode_from_std_read(&mut reader, self.config)?;
        self.held.clear();
        Ok(frame)
    }
}

/// Replays held bytes before touching the stream, and records everything
/// newly read so an error mid-frame loses nothing.
struct ResumingReader<'a, T: Read> {
    stream: &'a mut T,
    held: &'a mut Vec<u8>,
    pos: usize,
}

impl<T: Read> Read for ResumingReader<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos < self.held.len() {
            let n = buf.len().min(self.held.len() - self.pos);
            buf[..n].copy_from_slice(&self.held[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        let n = self.stream.read(buf)?;
        self.held.extend_from_slice(&buf[..n]);
        self.pos += n;
        Ok(n)
    }
}
