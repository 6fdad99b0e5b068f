use crate::commands::Command;
use crate::error::{ProtocolError, TransportError};
use byteorder::ReadBytesExt;
use log::debug;
use std::io::Cursor;
use std::time::Duration;
use ugsimple_types::{GpibData, SeriesNumber, VersionNumber};

/// The command address byte plus the length byte, which counts itself.
pub const FRAME_HEADER_SIZE: usize = 2;
/// The longest payload a one-byte frame length can describe.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize - FRAME_HEADER_SIZE;

const LINE_FEED: u8 = 0x0A;

/// Byte-exact access to the adapter's bulk endpoint pair.
///
/// Implementations own the read buffer that reassembles 64 byte bulk chunks
/// into the exact byte counts the protocol asks for. One instance per
/// adapter; callers needing concurrent access must serialise externally.
pub trait BulkTransport {
    /// Send every byte of `data` to the OUT endpoint.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Return exactly `len` bytes, oldest first, pulling further bulk
    /// chunks from the IN endpoint as needed.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Discard everything currently buffered.
    fn flush(&mut self);

    /// Number of bytes currently buffered.
    fn buffered(&self) -> usize;

    /// Block for a settling delay between a request and its reply.
    fn settle(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

// These are the commands the UGSimple firmware understands. Everything is
// a default method over BulkTransport, so the whole protocol runs the same
// against hardware or a scripted transport.
pub trait UGSimpleCommands: BulkTransport {
    /// Send a command frame: `[address, payload length + 2, payload..]`.
    fn send_frame(&mut self, command: Command, payload: &[u8]) -> Result<(), ProtocolError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::OversizedPayload(payload.len()));
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.push(command.command_id());
        frame.push((payload.len() + FRAME_HEADER_SIZE) as u8);
        frame.extend_from_slice(payload);

        debug!("WRITE: {frame:02x?}");
        self.write_bytes(&frame)?;
        Ok(())
    }

    /// Receive a response frame for `command` and return its payload.
    ///
    /// A response leading with a different command address is reported and
    /// left where it is, only the address byte itself has been consumed.
    /// Whether to [`flush`](BulkTransport::flush) and resynchronise is the
    /// caller's decision.
    fn receive_frame(&mut self, command: Command) -> Result<Vec<u8>, ProtocolError> {
        let address = self.read_bytes(1)?[0];
        if address != command.command_id() {
            return Err(ProtocolError::AddressMismatch {
                expected: command.command_id(),
                got: address,
            });
        }

        let length = self.read_bytes(1)?[0];
        if (length as usize) < FRAME_HEADER_SIZE {
            return Err(ProtocolError::UnderflowLength(length));
        }

        // The address and length bytes count towards the frame length.
        let payload_length = length as usize - FRAME_HEADER_SIZE;
        match self.read_bytes(payload_length) {
            Ok(payload) => {
                debug!("READ: cmd 0x{address:02x}, payload {payload:02x?}");
                Ok(payload)
            }
            Err(TransportError::Timeout) => Err(ProtocolError::ShortFrame {
                expected: payload_length,
                available: self.buffered(),
            }),
            Err(error) => Err(error.into()),
        }
    }

    /// Get the manufacturer id string.
    fn manufacturer_id(&mut self) -> Result<String, ProtocolError> {
        self.send_frame(Command::ManufacturerId, &[])?;
        let payload = self.receive_frame(Command::ManufacturerId)?;

        // Firmware 1.0 sends a spurious extra byte (0xAF) after this
        // response, discard it rather than trusting the frame length.
        self.flush();

        Ok(String::from_utf8_lossy(&payload).to_string())
    }

    /// Get the adapter series number.
    fn series_number(&mut self) -> Result<SeriesNumber, ProtocolError> {
        self.send_frame(Command::SeriesNumber, &[])?;
        let payload = self.receive_frame(Command::SeriesNumber)?;
        Ok(SeriesNumber(payload))
    }

    /// Get the firmware version.
    fn firmware_version(&mut self) -> Result<VersionNumber, ProtocolError> {
        self.send_frame(Command::FirmwareVersion, &[])?;
        let payload = self.receive_frame(Command::FirmwareVersion)?;

        let mut cursor = Cursor::new(payload);
        let major = cursor.read_u8()?;
        let minor = cursor.read_u8()?;
        Ok(VersionNumber(major, minor))
    }

    /// List the GPIB addresses of the instruments connected to the bus.
    fn query_devices(&mut self) -> Result<Vec<u8>, ProtocolError> {
        self.send_frame(Command::QueryDevices, &[])?;
        let mut payload = self.receive_frame(Command::QueryDevices)?;

        // The last byte is an undocumented trailer (0x1E seen with one
        // device connected, 0x7F with two). Stripped, not interpreted.
        payload.pop();

        Ok(payload)
    }

    /// Write an ASCII command to the instrument at `address`.
    fn gpib_write(&mut self, address: u8, data: &str) -> Result<(), ProtocolError> {
        let mut payload = Vec::with_capacity(data.len() + 2);
        payload.push(address);
        payload.extend_from_slice(data.as_bytes());
        payload.push(LINE_FEED);

        // Write commands get no response frame.
        self.send_frame(Command::GpibWrite, &payload)
    }

    /// Read the instrument at `address`, pausing `delay` before polling so
    /// a slow instrument has time to answer.
    fn gpib_read(&mut self, address: u8, delay: Duration) -> Result<GpibData, ProtocolError> {
        self.send_frame(Command::GpibRead, &[address])?;
        self.settle(delay);

        // Anything buffered at this point predates the reply. Discarding
        // it must happen before the receive, not after.
        self.flush();

        let mut payload = self.receive_frame(Command::GpibRead)?;

        // Replies are line-feed terminated.
        payload.pop();

        Ok(GpibData(payload))
    }
}

// We primarily need the bus number, and address for comparison..
#[derive(Debug, Clone)]
pub struct UGSimpleDevice {
    pub(crate) bus_number: u8,
    pub(crate) address: u8,
}

impl UGSimpleDevice {
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }
    pub fn address(&self) -> u8 {
        self.address
    }
}

pub struct UsbData {
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
    pub(crate) device_version: (u8, u8, u8),
    pub(crate) device_manufacturer: String,
    pub(crate) product_name: String,
}

impl UsbData {
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }
    pub fn product_id(&self) -> u16 {
        self.product_id
    }
    pub fn device_version(&self) -> (u8, u8, u8) {
        self.device_version
    }
    pub fn device_manufacturer(&self) -> String {
        self.device_manufacturer.clone()
    }
    pub fn product_name(&self) -> String {
        self.product_name.clone()
    }
}
