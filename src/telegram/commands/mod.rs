mod add;
mod help;
mod list;
mod remove;
mod start;

pub use add::AddCommand;
pub use help::HelpCommand;
pub use list::ListCommand;
pub use remove::RemoveCommand;
pub use start::StartCommand;
