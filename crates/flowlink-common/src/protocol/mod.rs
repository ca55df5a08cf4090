pub mod error;
pub mod info;
pub mod requests;

#[cfg(test)]
mod tests;

pub use error::{FlowlinkError, Result};
pub use info::ServiceInfo;
pub use requests::DataRequest;
