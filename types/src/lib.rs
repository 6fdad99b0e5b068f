#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

/// A firmware version as reported by the adapter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VersionNumber(pub u8, pub u8);

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

impl std::fmt::Debug for VersionNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// The adapter series number, MMFFFFFF - e.g. 011e7f7f
///
/// MM     - Model number (0x01)
/// FFFFFF - Function number (0x1e7f7f)
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesNumber(pub Vec<u8>);

impl SeriesNumber {
    pub fn model(&self) -> Option<u8> {
        self.0.first().copied()
    }

    pub fn function(&self) -> &[u8] {
        if self.0.is_empty() {
            &[]
        } else {
            &self.0[1..]
        }
    }
}

impl std::fmt::Display for SeriesNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SeriesNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SeriesNumber({self})")
    }
}

/// Bytes read back from an instrument on the GPIB bus.
///
/// Instrument replies are usually ASCII but nothing stops a device sending
/// arbitrary bytes, so `Display` renders a quoted-printable style encoding:
/// printable ASCII comes through verbatim, everything else as `=XX`.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpibData(pub Vec<u8>);

impl GpibData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for GpibData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for &byte in &self.0 {
            match byte {
                b'=' => write!(f, "=3D")?,
                b' ' | 0x21..=0x7e => write!(f, "{}", char::from(byte))?,
                _ => write!(f, "={byte:02X}")?,
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GpibData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpibData({self})")
    }
}

impl From<Vec<u8>> for GpibData {
    fn from(bytes: Vec<u8>) -> Self {
        GpibData(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_number_displays_major_minor() {
        assert_eq!(VersionNumber(1, 3).to_string(), "1.3");
        assert_eq!(format!("{:?}", VersionNumber(2, 0)), "2.0");
    }

    #[test]
    fn series_number_displays_as_hex() {
        let series = SeriesNumber(vec![0x01, 0x1e, 0x7f, 0x7f]);
        assert_eq!(series.to_string(), "011e7f7f");
        assert_eq!(series.model(), Some(0x01));
        assert_eq!(series.function(), &[0x1e, 0x7f, 0x7f]);
    }

    #[test]
    fn series_number_handles_empty_payload() {
        let series = SeriesNumber(vec![]);
        assert_eq!(series.to_string(), "");
        assert_eq!(series.model(), None);
        assert_eq!(series.function(), &[] as &[u8]);
    }

    #[test]
    fn gpib_data_passes_printable_ascii_through() {
        let data = GpibData(b"V1.0 READY".to_vec());
        assert_eq!(data.to_string(), "V1.0 READY");
    }

    #[test]
    fn gpib_data_escapes_non_printable_bytes() {
        let data = GpibData(vec![b'O', b'K', 0x0d, 0x00, 0xff]);
        assert_eq!(data.to_string(), "OK=0D=00=FF");
    }

    #[test]
    fn gpib_data_escapes_the_escape_character() {
        let data = GpibData(b"A=B".to_vec());
        assert_eq!(data.to_string(), "A=3DB");
    }
}
