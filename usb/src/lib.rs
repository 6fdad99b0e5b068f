pub use rusb;
pub mod buffer;
pub mod commands;
pub mod error;

mod device;

pub use device::base::{
    BulkTransport, UGSimpleCommands, UGSimpleDevice, UsbData, FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use device::{find_devices, UGSimpleUSB};

/// Microchip's USB vendor id, under which the adapter registers.
pub const VID_MICROCHIP: u16 = 0x04d8;
/// The product id assigned to the UGSimple.
pub const PID_UGSIMPLE: u16 = 0x000c;
