// File format handlers
pub mod convert;
pub mod dpet;
pub mod header;
pub mod scan;

pub use convert::{from_scan, read_scan};
pub use dpet::{ContainerPayload, Dataset, DpetError};
pub use header::{Header, HeaderContent};
pub use scan::{parse_scan, parse_scan_file, Body, DataSet, Payload, ScanError};

/// Knobs shared by the two parse entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Decode payload records. When false the payload bytes are carried
    /// verbatim instead.
    pub decode_payload: bool,
    /// Stop after the header sections and leave the payload unread.
    pub header_only: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            decode_payload: true,
            header_only: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the payload as bytes instead of decoding records.
    pub fn skip_payload(mut self) -> Self {
        self.decode_payload = false;
        self
    }

    /// Parse the header sections only.
    pub fn only_header(mut self) -> Self {
        self.header_only = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ParseOptions::new();
        assert!(opts.decode_payload);
        assert!(!opts.header_only);
    }

    #[test]
    fn test_builders() {
        let opts = ParseOptions::new().skip_payload().only_header();
        assert!(!opts.decode_payload);
        assert!(opts.header_only);
    }
}
