use cgmath::{Deg, Matrix4, Vector3};
use std::error::Error;

// --- Public Data Contract ---
#[derive(Clone, Debug, Default)]
pub struct RenderList {
    pub objects: Vec<RenderObject>,
}

#[derive(Clone, Debug)]
pub struct RenderObject {
    pub kind: DrawKind,
    pub texture_id: &'static str,
    pub transform: Matrix4<f32>,
    pub opacity: f32,
    pub z: i16,
    pub order: u32,
    pub blend: BlendMode,
}

/// What a draw object depicts; indices point into the chart's lines and notes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawKind {
    JudgeLine { line_index: usize },
    NoteHead { line_index: usize, note_index: usize },
    HoldBody { line_index: usize, note_index: usize },
    HitEffect { line_index: usize, note_index: usize, progress: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Alpha,
    Add,
}

/// Consumer of finished draw lists (a GPU backend, a recorder, a logger).
pub trait RenderSink {
    fn submit(&mut self, list: &RenderList) -> Result<(), Box<dyn Error>>;
}

impl RenderList {
    #[inline(always)]
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Unit quad → `size` box rotated about its center, then moved to `center`.
#[inline(always)]
pub fn quad_transform(center: [f32; 2], size: [f32; 2], rot_z_deg: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(center[0], center[1], 0.0))
        * Matrix4::from_angle_z(Deg(rot_z_deg))
        * Matrix4::from_nonuniform_scale(size[0], size[1], 1.0)
}
