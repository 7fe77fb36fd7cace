pub mod streams;
pub mod users;

pub use streams::get_stream_info;
pub use users::get_user_info;
