pub mod error;
pub mod http_store;
pub mod pieces;
pub mod profile;
pub mod remote;
pub mod state;

pub use error::{ClientError, StoreError};
pub use http_store::{ClientConfig, HttpRemoteStore};
pub use pieces::PieceCollection;
pub use profile::ProfileController;
pub use remote::RemoteStore;
pub use state::LoadState;

#[cfg(test)]
#[path = "tests/fake_store.rs"]
mod fake_store;
