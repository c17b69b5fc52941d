//! Chart playback and timing engine for rhythm games with moving judgment lines.
//!
//! Load a [`Chart`], wrap it in a [`Session`], advance the session's
//! [`PlaybackClock`] from your audio driver and call [`Session::frame`] once
//! per display refresh. Each frame yields a [`FrameSnapshot`] and a
//! [`RenderList`] handed to your [`RenderSink`].

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod utils;

pub use crate::config::Config;
pub use crate::core::clock::{AudioTimeSource, PlaybackClock, PlaybackState};
pub use crate::core::gfx::{BlendMode, DrawKind, RenderList, RenderObject, RenderSink};
pub use crate::core::space::Stage;
pub use crate::error::{ChartError, EntityRef};
pub use crate::game::chart::{Chart, JudgmentLine};
pub use crate::game::ease::{Easing, EasingRegistry};
pub use crate::game::effects::HitEffect;
pub use crate::game::layout::{LineFrame, NoteLayout};
pub use crate::game::line::{Channel, LineTransform};
pub use crate::game::note::{Note, NoteKind, NoteRenderState, NoteState};
pub use crate::game::parsing::raw::RawChart;
pub use crate::game::scheduler::{FrameScheduler, FrameSnapshot};
pub use crate::game::session::Session;
