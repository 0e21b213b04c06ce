//! Client-side syntactic validation of identities, stream part ids and proxy URLs.
//!
//! Everything here is pure and runs before any transport work.

mod endpoint_address;
mod ethereum_address;
mod stream_part_id;

pub use endpoint_address::EndpointAddress;
pub use ethereum_address::EthereumAddress;
pub use stream_part_id::{StreamPartId, MAX_PARTITION_COUNT};

use crate::error::ClientError;

pub fn validate_identity(raw: &str) -> Result<EthereumAddress, ClientError> {
    EthereumAddress::parse(raw)
}

pub fn validate_stream_part_id(raw: &str) -> Result<StreamPartId, ClientError> {
    StreamPartId::parse(raw)
}

pub fn validate_endpoint_address(raw: &str) -> Result<EndpointAddress, ClientError> {
    EndpointAddress::parse(raw)
}
