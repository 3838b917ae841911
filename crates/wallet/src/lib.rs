pub mod connector;
pub mod provider;
pub mod tx;
pub mod wallet;

pub use connector::*;
pub use provider::*;
pub use tx::*;
pub use wallet::*;
