//! Quality score derivation.
//!
//! A script starts at 100 and loses points per diagnostic. Any error forces
//! the score to 0, so the score only ranks scripts that already pass.

/// Point penalties per diagnostic severity.
pub mod points {
    pub const MAX_SCORE: i32 = 100;
    pub const ERROR: i32 = 20;
    pub const WARNING: i32 = 5;
}

/// Grade thresholds (minimum score per grade).
pub mod grades {
    pub const A_MIN: u8 = 90;
    pub const B_MIN: u8 = 75;
    pub const C_MIN: u8 = 50;
    pub const D_MIN: u8 = 25;
}

/// Calculate the score for the given diagnostic counts, clamped to [0, 100].
pub fn calculate(error_count: usize, warning_count: usize) -> u8 {
    let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
    let penalty = count(error_count)
        .saturating_mul(points::ERROR as i64)
        .saturating_add(count(warning_count).saturating_mul(points::WARNING as i64));
    let score = (points::MAX_SCORE as i64).saturating_sub(penalty).max(0);
    if error_count > 0 {
        return 0;
    }
    score as u8
}

/// Letter grade for a score: "A" (90-100) down to "F" (0-24).
pub fn grade(score: u8) -> &'static str {
    match score {
        s if s >= grades::A_MIN => "A",
        s if s >= grades::B_MIN => "B",
        s if s >= grades::C_MIN => "C",
        s if s >= grades::D_MIN => "D",
        _ => "F",
    }
}
