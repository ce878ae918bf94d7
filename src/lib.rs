pub mod cookies;
pub mod parser;
pub mod portal;
pub mod report;
pub mod session;

pub use portal::Portal;
pub use report::ReportQuery;
pub use session::{MessUser, PasswordPrompt, SessionError, TerminalPrompt};

pub(crate) const BASE_URL: &str = "https://newsmerp.iiserkol.ac.in";
