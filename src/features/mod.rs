//! Per-event numeric features for the z-score detector.

mod extract;

pub use extract::{destination_port, extract};

/// Number of numeric dimensions: size, is_tcp, is_udp, dst_port.
pub const FEATURE_DIM: usize = 4;

/// Features of one sniffed event.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub size: u64,
    pub is_tcp: bool,
    pub is_udp: bool,
    pub dst_port: u64,
    /// Source address, only known for raw packet events
    pub source: Option<String>,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; FEATURE_DIM] {
        [
            self.size as f64,
            u8::from(self.is_tcp) as f64,
            u8::from(self.is_udp) as f64,
            self.dst_port as f64,
        ]
    }
}
