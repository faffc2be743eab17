//! Serial bridge: share one serial device with the console, TCP peers and
//! a UDP endpoint.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte channels, I/O pumps and serial device access
//! - [`frame`]: line framing, timestamped log lines and packet hex framing
//! - [`route`]: the router, broadcast duplicator and network forwarders

/// Re-export transport types.
pub mod transport {
    pub use serbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serbridge_frame::*;
}

/// Re-export routing types.
pub mod route {
    pub use serbridge_route::*;
}
