// src/engine/progress.rs

//! XP, level and milestone arithmetic. Everything derives from the visited count.

use serde::Serialize;

/// XP awarded per visited place.
pub const POINTS_PER_VISIT: u32 = 25;

/// XP needed per level.
pub const POINTS_PER_LEVEL: u32 = 250;

/// Visited counts that unlock an achievement.
pub const MILESTONES: [u32; 5] = [5, 10, 25, 50, 100];

/// Derived gamification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub visits: u32,
    pub points: u32,
    pub level: u32,
    pub progress_percent: u32,
    pub next_cap: u32,
}

/// A milestone with its unlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MilestoneChip {
    pub threshold: u32,
    pub unlocked: bool,
}

pub fn compute(visited: usize) -> Progress {
    let visits = u32::try_from(visited).unwrap_or(u32::MAX);
    let points = visits.saturating_mul(POINTS_PER_VISIT);
    let level = (points / POINTS_PER_LEVEL + 1).max(1);
    let prev_cap = (level - 1) * POINTS_PER_LEVEL;
    let next_cap = level.saturating_mul(POINTS_PER_LEVEL);

    let span = next_cap.saturating_sub(prev_cap).max(1);
    let into_level = points - prev_cap;
    let percent = (f64::from(into_level) / f64::from(span) * 100.0).round();

    Progress {
        visits,
        points,
        level,
        progress_percent: percent.clamp(0.0, 100.0) as u32,
        next_cap,
    }
}

/// The milestone hit by a change from `prev` to `next` visits, if any.
///
/// Only an increase landing exactly on a threshold counts.
pub fn milestone_reached(prev: usize, next: usize) -> Option<u32> {
    if next <= prev {
        return None;
    }
    MILESTONES.into_iter().find(|&m| m as usize == next)
}

pub fn milestone_chips(visited: usize) -> Vec<MilestoneChip> {
    MILESTONES
        .into_iter()
        .map(|threshold| MilestoneChip {
            threshold,
            unlocked: visited >= threshold as usize,
        })
        .collect()
}
