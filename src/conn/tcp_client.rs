use crate::ScnpResult;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

// The transport: one blocking TCP stream to one server, with read and write
// timeouts. All IO is whole-buffer: requests go out with a single write, and
// replies are read header-first, then var part, each in full.
#[derive(Debug)]
pub struct TcpClient {
    stream: TcpStream,
}

impl TcpClient {
    pub fn try_new(host: &str, port: u16, timeout: Option<Duration>) -> ScnpResult<Self> {
        trace!("connecting to {}:{}", host, port);
        let stream = TcpStream::connect((host, port))?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        stream.set_nodelay(true)?;
        debug!("connected to {}:{}", host, port);
        Ok(Self { stream })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> ScnpResult<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    pub fn read_exact_into(&mut self, buf: &mut [u8]) -> ScnpResult<()> {
        self.stream.read_exact(buf)?;
        Ok(())
    }

    pub fn read_exact(&mut self, len: usize) -> ScnpResult<Vec<u8>> {
        let mut buf = vec![0_u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            trace!("shutdown of tcp stream failed: {}", e);
        }
    }
}
