//! Named easing curves for motion events.
//!
//! Every curve maps `t ∈ [0, 1]` to a progress value with `f(0) = 0` and
//! `f(1) = 1` (back and elastic curves overshoot in between). The registry is
//! a plain name → function map so hosts can add curves before loading charts.

use std::collections::HashMap;
use std::f64::consts::PI;

pub type EaseFn = fn(f64) -> f64;

/// A resolved easing curve. Cheap to copy; equality is by name.
#[derive(Clone, Copy)]
pub struct Easing {
    name: &'static str,
    func: EaseFn,
}

impl Easing {
    pub const LINEAR: Easing = Easing { name: "linear", func: linear };

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub fn apply(&self, t: f64) -> f64 {
        (self.func)(t.clamp(0.0, 1.0))
    }
}

impl std::fmt::Debug for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Easing({})", self.name)
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone)]
pub struct EasingRegistry {
    by_name: HashMap<String, Easing>,
}

impl Default for EasingRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl EasingRegistry {
    pub fn empty() -> Self {
        Self { by_name: HashMap::new() }
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        for &(name, func) in BUILTINS {
            reg.register(name, func);
        }
        reg
    }

    /// Adds or replaces a curve. Later registrations win, and an `easeX`
    /// name also (re)binds its short `x` alias.
    pub fn register(&mut self, name: &'static str, func: EaseFn) {
        let easing = Easing { name, func };
        if let Some(alias) = short_alias(name) {
            self.by_name.insert(alias, easing);
        }
        self.by_name.insert(name.to_string(), easing);
    }

    pub fn get(&self, name: &str) -> Option<Easing> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// "easeInQuad" also answers to "inQuad".
fn short_alias(name: &str) -> Option<String> {
    let rest = name.strip_prefix("ease")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    let mut alias: String = first.to_lowercase().collect();
    alias.push_str(chars.as_str());
    Some(alias)
}

const BUILTINS: &[(&str, EaseFn)] = &[
    ("linear", linear),
    ("smoothstep", smoothstep),
    ("smootherstep", smootherstep),
    ("easeInSine", in_sine),
    ("easeOutSine", out_sine),
    ("easeInOutSine", in_out_sine),
    ("easeInQuad", in_quad),
    ("easeOutQuad", out_quad),
    ("easeInOutQuad", in_out_quad),
    ("easeInCubic", in_cubic),
    ("easeOutCubic", out_cubic),
    ("easeInOutCubic", in_out_cubic),
    ("easeInQuart", in_quart),
    ("easeOutQuart", out_quart),
    ("easeInOutQuart", in_out_quart),
    ("easeInQuint", in_quint),
    ("easeOutQuint", out_quint),
    ("easeInOutQuint", in_out_quint),
    ("easeInExpo", in_expo),
    ("easeOutExpo", out_expo),
    ("easeInOutExpo", in_out_expo),
    ("easeInCirc", in_circ),
    ("easeOutCirc", out_circ),
    ("easeInOutCirc", in_out_circ),
    ("easeInBack", in_back),
    ("easeOutBack", out_back),
    ("easeInOutBack", in_out_back),
    ("easeInElastic", in_elastic),
    ("easeOutElastic", out_elastic),
    ("easeInOutElastic", in_out_elastic),
    ("easeInBounce", in_bounce),
    ("easeOutBounce", out_bounce),
    ("easeInOutBounce", in_out_bounce),
];

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

fn linear(t: f64) -> f64 {
    t
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn smootherstep(t: f64) -> f64 {
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}

fn in_sine(t: f64) -> f64 {
    1.0 - (t * PI / 2.0).cos()
}

fn out_sine(t: f64) -> f64 {
    (t * PI / 2.0).sin()
}

fn in_out_sine(t: f64) -> f64 {
    -((PI * t).cos() - 1.0) / 2.0
}

fn in_quad(t: f64) -> f64 {
    t * t
}

fn out_quad(t: f64) -> f64 {
    1.0 - (1.0 - t) * (1.0 - t)
}

fn in_out_quad(t: f64) -> f64 {
    if t < 0.5 { 2.0 * t * t } else { 1.0 - (-2.0 * t + 2.0).powi(2) / 2.0 }
}

fn in_cubic(t: f64) -> f64 {
    t * t * t
}

fn out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

fn in_out_cubic(t: f64) -> f64 {
    if t < 0.5 { 4.0 * t * t * t } else { 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0 }
}

fn in_quart(t: f64) -> f64 {
    t.powi(4)
}

fn out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(4)
}

fn in_out_quart(t: f64) -> f64 {
    if t < 0.5 { 8.0 * t.powi(4) } else { 1.0 - (-2.0 * t + 2.0).powi(4) / 2.0 }
}

fn in_quint(t: f64) -> f64 {
    t.powi(5)
}

fn out_quint(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(5)
}

fn in_out_quint(t: f64) -> f64 {
    if t < 0.5 { 16.0 * t.powi(5) } else { 1.0 - (-2.0 * t + 2.0).powi(5) / 2.0 }
}

fn in_expo(t: f64) -> f64 {
    if t <= 0.0 { 0.0 } else { 2f64.powf(10.0 * t - 10.0) }
}

fn out_expo(t: f64) -> f64 {
    if t >= 1.0 { 1.0 } else { 1.0 - 2f64.powf(-10.0 * t) }
}

fn in_out_expo(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        2f64.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
    }
}

fn in_circ(t: f64) -> f64 {
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

fn out_circ(t: f64) -> f64 {
    (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt()
}

fn in_out_circ(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
    }
}

fn in_back(t: f64) -> f64 {
    BACK_C3 * t * t * t - BACK_C1 * t * t
}

fn out_back(t: f64) -> f64 {
    1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
}

fn in_out_back(t: f64) -> f64 {
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

fn in_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
    }
}

fn out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
    }
}

fn in_out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
    } else {
        (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0 + 1.0
    }
}

fn out_bounce(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

fn in_bounce(t: f64) -> f64 {
    1.0 - out_bounce(1.0 - t)
}

fn in_out_bounce(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
    } else {
        (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
    }
}
