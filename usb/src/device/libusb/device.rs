use crate::buffer::{ReadBuffer, CHUNK_SIZE};
use crate::device::base::{BulkTransport, UGSimpleCommands, UGSimpleDevice, UsbData};
use crate::error::{ConnectError, TransportError};
use crate::{PID_UGSIMPLE, VID_MICROCHIP};
use log::{debug, info};
use rusb::{
    ConfigDescriptor, Device, DeviceDescriptor, DeviceHandle, Direction, GlobalContext, Language,
    TransferType,
};
use std::time::Duration;

// The adapter exposes its command pipe on a vendor specific interface,
// class, subclass and protocol all carry this marker value.
const VENDOR_SPECIFIC: u8 = 0xff;

#[derive(Debug)]
pub struct UGSimpleUSB {
    handle: DeviceHandle<GlobalContext>,
    device: Device<GlobalContext>,
    descriptor: DeviceDescriptor,
    language: Language,

    read_address: u8,
    write_address: u8,
    read_buffer: ReadBuffer,

    timeout: Duration,
}

impl UGSimpleUSB {
    /// Attach to one of the discovered adapters by its position in the
    /// [`find_devices`] list. `open(0)` takes the first adapter found.
    pub fn open(index: usize) -> Result<Self, ConnectError> {
        let devices = find_devices();
        if devices.is_empty() {
            return Err(ConnectError::DeviceNotFound);
        }

        let Some(device) = devices.get(index) else {
            return Err(ConnectError::NoSuchIndex {
                index,
                found: devices.len(),
            });
        };

        Self::from_device(device.clone())
    }

    pub fn from_device(device: UGSimpleDevice) -> Result<Self, ConnectError> {
        // Firstly, we need to locate the USB device based on the location..
        let (device, descriptor) = Self::find_device(device)?;
        let mut handle = device.open()?;

        let timeout = Duration::from_secs(1);

        info!("Connected to possible UGSimple adapter at {device:?}");

        let languages = handle.read_languages(timeout)?;
        let language = languages
            .first()
            .ok_or(ConnectError::DeviceNotUGSimple)?
            .to_owned();

        let config = device.active_config_descriptor()?;
        let (interface_number, read_address, write_address) =
            find_endpoints(&config).ok_or(ConnectError::EndpointNotFound)?;
        debug!(
            "Using interface {interface_number}, bulk IN 0x{read_address:02x} / OUT 0x{write_address:02x}"
        );

        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(error) => return Err(error.into()),
        }

        if handle.claim_interface(interface_number).is_err() {
            return Err(ConnectError::DeviceNotClaimed);
        }

        let mut adapter = Self {
            handle,
            device,
            descriptor,
            language,
            read_address,
            write_address,
            read_buffer: ReadBuffer::new(),
            timeout,
        };

        // The firmware may still hold output from a previous session, pull
        // one throwaway chunk so the first real read starts clean.
        adapter.drain_stale();

        Ok(adapter)
    }

    fn find_device(
        device: UGSimpleDevice,
    ) -> Result<(Device<GlobalContext>, DeviceDescriptor), ConnectError> {
        if let Ok(devices) = rusb::devices() {
            for usb_device in devices.iter() {
                if usb_device.bus_number() == device.bus_number
                    && usb_device.address() == device.address
                {
                    if let Ok(descriptor) = usb_device.device_descriptor() {
                        return Ok((usb_device, descriptor));
                    }
                }
            }
        }
        Err(ConnectError::DeviceNotFound)
    }

    fn drain_stale(&mut self) {
        let mut chunk = [0u8; CHUNK_SIZE];
        let _ = self
            .handle
            .read_bulk(self.read_address, &mut chunk, Duration::from_millis(10));
    }

    /// Timeout applied to every bulk transfer. Defaults to one second.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn get_descriptor(&self) -> Result<UsbData, ConnectError> {
        let version = self.descriptor.usb_version();
        let usb_version = (version.0, version.1, version.2);

        let device_manufacturer = self.handle.read_manufacturer_string(
            self.language,
            &self.descriptor,
            Duration::from_millis(100),
        )?;

        let product_name = self.handle.read_product_string(
            self.language,
            &self.descriptor,
            Duration::from_millis(100),
        )?;

        Ok(UsbData {
            vendor_id: self.descriptor.vendor_id(),
            product_id: self.descriptor.product_id(),
            device_version: usb_version,
            device_manufacturer,
            product_name,
        })
    }
}

impl BulkTransport for UGSimpleUSB {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let written = self
            .handle
            .write_bulk(self.write_address, data, self.timeout)
            .map_err(map_usb_error)?;

        if written != data.len() {
            return Err(TransportError::ShortWrite {
                expected: data.len(),
                written,
            });
        }
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut chunk = [0u8; CHUNK_SIZE];
        while self.read_buffer.len() < len {
            let count = self
                .handle
                .read_bulk(self.read_address, &mut chunk, self.timeout)
                .map_err(map_usb_error)?;
            self.read_buffer.append(&chunk[..count]);
        }
        Ok(self.read_buffer.take(len).to_vec())
    }

    fn flush(&mut self) {
        self.read_buffer.clear();
    }

    fn buffered(&self) -> usize {
        self.read_buffer.len()
    }
}

impl UGSimpleCommands for UGSimpleUSB {}

fn map_usb_error(error: rusb::Error) -> TransportError {
    match error {
        rusb::Error::Timeout => TransportError::Timeout,
        other => TransportError::Io(other),
    }
}

pub fn find_devices() -> Vec<UGSimpleDevice> {
    let mut found_devices: Vec<UGSimpleDevice> = Vec::new();

    if let Ok(devices) = rusb::devices() {
        for device in devices.iter() {
            if let Ok(descriptor) = device.device_descriptor() {
                if descriptor.vendor_id() == VID_MICROCHIP
                    && descriptor.product_id() == PID_UGSIMPLE
                    && has_vendor_interface(&device)
                {
                    found_devices.push(UGSimpleDevice {
                        bus_number: device.bus_number(),
                        address: device.address(),
                    });
                }
            }
        }
    }

    found_devices
}

fn has_vendor_interface(device: &Device<GlobalContext>) -> bool {
    let Ok(config) = device.active_config_descriptor() else {
        return false;
    };

    config.interfaces().any(|interface| {
        interface.descriptors().any(|descriptor| {
            descriptor.class_code() == VENDOR_SPECIFIC
                && descriptor.sub_class_code() == VENDOR_SPECIFIC
                && descriptor.protocol_code() == VENDOR_SPECIFIC
        })
    })
}

/// Pick the first bulk IN and first bulk OUT endpoints from the first
/// interface that has both.
fn find_endpoints(config: &ConfigDescriptor) -> Option<(u8, u8, u8)> {
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            let mut read_address = None;
            let mut write_address = None;

            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.transfer_type() != TransferType::Bulk {
                    continue;
                }
                match endpoint.direction() {
                    Direction::In => {
                        read_address.get_or_insert(endpoint.address());
                    }
                    Direction::Out => {
                        write_address.get_or_insert(endpoint.address());
                    }
                }
            }

            if let (Some(read), Some(write)) = (read_address, write_address) {
                return Some((descriptor.interface_number(), read, write));
            }
        }
    }
    None
}
