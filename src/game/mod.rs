pub mod chart;
pub mod ease;
pub mod effects;
pub mod layout;
pub mod line;
pub mod note;
pub mod parsing;
pub mod scheduler;
pub mod session;
pub mod timing;
