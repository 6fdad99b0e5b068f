#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No UGSimple adapter was found")]
    DeviceNotFound,

    #[error("Adapter index {index} is out of range, {found} adapter(s) found")]
    NoSuchIndex { index: usize, found: usize },

    #[error("Device is not a UGSimple")]
    DeviceNotUGSimple,

    #[error("The adapter interface has no bulk endpoint pair")]
    EndpointNotFound,

    #[error("Unable to Claim Interface")]
    DeviceNotClaimed,

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Short write, sent {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    #[error("Timed out waiting for data from the adapter")]
    Timeout,

    #[error("USB error: {0}")]
    Io(#[source] rusb::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("Response command 0x{got:02x} does not match expected command 0x{expected:02x}")]
    AddressMismatch { expected: u8, got: u8 },

    #[error("Frame length {0} is smaller than the two header bytes it counts")]
    UnderflowLength(u8),

    #[error("Frame declared {expected} payload bytes but only {available} arrived")]
    ShortFrame { expected: usize, available: usize },

    #[error("Payload of {0} bytes does not fit a one-byte frame length")]
    OversizedPayload(usize),

    #[error("Malformed response from the adapter")]
    MalformedResponse(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
