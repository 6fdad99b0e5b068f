pub mod base;

// The adapter has no vendor driver anywhere, so libusb is the backend on
// every platform.
mod libusb;

pub use libusb::device::{find_devices, UGSimpleUSB};
