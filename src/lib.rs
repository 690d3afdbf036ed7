pub mod device;
pub mod http;
pub mod identity;
pub mod mdns;
pub mod net;
