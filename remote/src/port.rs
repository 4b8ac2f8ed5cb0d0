use lcdlink_bus::link::LinkPort;
use lcdlink_bus::BusResult;
use std::fs::File;
use std::io::Read;
use std::os::fd::AsRawFd;
use std::path::Path;

/// A serial device as the receiving end of the forwarding channel.
///
/// The device is assumed to be line-configured already (raw mode, matching
/// baud rate); this wrapper only reads bytes.
pub struct SerialLinkPort {
    file: File,
}

impl SerialLinkPort {
    pub fn open(path: &Path) -> BusResult<Self> {
        let file = File::open(path)?;
        Ok(SerialLinkPort { file })
    }
}

impl LinkPort for SerialLinkPort {
    fn available(&mut self) -> BusResult<usize> {
        let mut count: libc::c_int = 0;
        let res = unsafe { libc::ioctl(self.file.as_raw_fd(), libc::FIONREAD as _, &mut count) };
        if res < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(count as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> BusResult<usize> {
        Ok(self.file.read(buf)?)
    }
}
