//! Chat transport and update routing

pub mod router;
pub mod transport;

pub use router::UpdateRouter;
pub use transport::{ChatTransport, TelegramTransport};
