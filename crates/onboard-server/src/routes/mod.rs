pub mod logs;
pub mod onboard;
pub mod status;
