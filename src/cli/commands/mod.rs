pub mod auth;
pub mod depart;
pub mod form;

pub use auth::{auth_command, AuthCommands};
pub use depart::{depart_command, DepartCommands};
pub use form::{form_command, FormCommands};
