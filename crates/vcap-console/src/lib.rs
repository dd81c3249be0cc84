//! Console front end for Vcap captures
//!
//! Wire it to the host's chat or command line:
//! ```ignore
//! let (mut console, mut feedback) = ExportConsole::new(host, tokio::runtime::Handle::current());
//! let response = console.execute_line("export start demo 4", player_chunk);
//! ```

pub mod protocol;
pub mod console;

pub use protocol::*;
pub use console::{ExportConsole, ExportHost};
