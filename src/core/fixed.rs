//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the arena simulation.
//! Time (seconds), world distances and visual scales are all `Fixed`;
//! floats only appear when loading configuration or printing.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

// =============================================================================
// TIMING CONSTANTS
// =============================================================================

/// Frame duration at 60 Hz: round(65536/60) = 1092
pub const FRAME_DURATION: Fixed = 1092;

/// Fixed physics step at 50 Hz: round(65536/50) = 1311
pub const FIXED_STEP_DURATION: Fixed = 1311;

// =============================================================================
// CORE OPERATIONS
// =============================================================================

/// Convert a float to fixed-point.
///
/// # Warning
/// Only use at compile-time or while loading configuration. NEVER in the
/// frame loop.
///
/// # Example
/// ```
/// use blast_arena::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/serialization.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Build a fixed-point value from an integer.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Divide-by-zero returns 0 (not panic).
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    value.min(max).max(min)
}

/// Round to the nearest integer, halves away from zero.
///
/// This is how world positions snap onto the tile lattice.
#[inline]
pub fn fixed_round(x: Fixed) -> i32 {
    if x >= 0 {
        (x + FIXED_HALF) >> FIXED_SCALE
    } else {
        -((x.wrapping_neg() + FIXED_HALF) >> FIXED_SCALE)
    }
}

/// Linear interpolation: a + (b - a) * t
/// where t is in fixed-point (0.0 = 0, 1.0 = FIXED_ONE)
#[inline]
pub fn fixed_lerp(a: Fixed, b: Fixed, t: Fixed) -> Fixed {
    let diff = b.wrapping_sub(a);
    a.wrapping_add(fixed_mul(diff, t))
}

/// Hermite smoothstep on [0, 1]: t² · (3 - 2t).
///
/// Input is clamped, so the result is always within [0, FIXED_ONE].
#[inline]
pub fn fixed_smoothstep(t: Fixed) -> Fixed {
    let t = fixed_clamp(t, 0, FIXED_ONE);
    let t2 = fixed_mul(t, t);
    fixed_mul(t2, 3 * FIXED_ONE - 2 * t)
}

/// Fraction `step / steps` in fixed-point. Zero steps yields 1.0.
#[inline]
pub fn step_fraction(step: u32, steps: u32) -> Fixed {
    if steps == 0 {
        return FIXED_ONE;
    }
    fixed_div(from_int(step.min(steps) as i32), from_int(steps as i32))
}

// =============================================================================
// TESTS
// =============================================================================
