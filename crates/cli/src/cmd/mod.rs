mod args;
mod list;
mod resolve;

pub use args::ConfigArgs;
pub use list::cmd_list;
pub use resolve::cmd_resolve;
