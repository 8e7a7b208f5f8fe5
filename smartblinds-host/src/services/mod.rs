mod cover_service;
mod cover_worker;
mod device_client;
#[cfg(test)]
mod fake_device;

pub use cover_service::*;
pub use cover_worker::*;
pub use device_client::*;
