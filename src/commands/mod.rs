pub mod search_commands;
pub mod session_commands;
