//! Editor Host
//!
//! Language server that runs the add-in inside an editor: document sync
//! feeds edit notifications, `workspace/applyEdit` writes documents back,
//! and the "Scan" command renders the active document on demand.

pub mod backend;
pub mod document;
pub mod handlers;
pub mod server;

pub use backend::Backend;
pub use handlers::SCAN_COMMAND;
