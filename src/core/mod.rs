pub mod clock;
pub mod gfx;
pub mod space;
