//! Per-day colour assignment for resolved occurrences.
//!
//! Purely a function of the resolved day: the hue wheel is partitioned
//! across the day's tasks by list position, saturation rises as the due
//! date approaches, and lead-up previews fade the further they sit from
//! their due date. Nothing here is persisted; styles are recomputed per
//! render.

use chrono::NaiveDate;
use ratatui::style::Color;

use crate::occurrence::{Occurrence, Role};

/// Lightness for occurrence cell backgrounds (percent).
pub const BACKGROUND_LIGHTNESS: u8 = 85;
/// Lightness for occurrence cell borders (percent).
pub const BORDER_LIGHTNESS: u8 = 45;

/// Derived style signal for one occurrence on one day.
///
/// `fade` is a 0-100 opacity percent: 100 for due-day and repeat
/// occurrences, linearly decreasing for lead-up previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceStyle {
    pub hue: u16,
    pub saturation: u8,
    pub fade: u8,
}

impl OccurrenceStyle {
    /// Background colour: the occurrence hue at the light level.
    pub fn background(&self) -> Color {
        hsl_to_color(self.hue, self.effective_saturation(), BACKGROUND_LIGHTNESS)
    }

    /// Border/accent colour: the same hue, darker.
    pub fn border(&self) -> Color {
        hsl_to_color(self.hue, self.effective_saturation(), BORDER_LIGHTNESS)
    }

    // Terminal cells have no alpha channel, so the fade percent is
    // applied by washing out saturation instead.
    fn effective_saturation(&self) -> u8 {
        (u16::from(self.saturation) * u16::from(self.fade) / 100) as u8
    }
}

/// Compute one style per occurrence in the day's resolved list.
///
/// Deterministic for a fixed day and task set, but only within that day:
/// the same task may get a different hue on another day whose occupant
/// set differs.
pub fn day_styles(occurrences: &[Occurrence<'_>], day: NaiveDate) -> Vec<OccurrenceStyle> {
    let count = occurrences.len().max(1) as u32;
    occurrences
        .iter()
        .enumerate()
        .map(|(index, occ)| OccurrenceStyle {
            hue: hue_for_index(index as u32, count),
            saturation: saturation_for_due(occ.task.due_date, day),
            fade: fade_for_occurrence(occ, day),
        })
        .collect()
}

/// Partition the colour wheel across `count` same-day tasks.
pub fn hue_for_index(index: u32, count: u32) -> u16 {
    let count = count.max(1);
    ((360.0 * f64::from(index) / f64::from(count)).round() as u16) % 360
}

/// Saturation grows as the due date nears; clamped to 40..=90.
pub fn saturation_for_due(due: NaiveDate, day: NaiveDate) -> u8 {
    let days_until_due = (due - day).num_days().max(0);
    (90 - 5 * days_until_due).clamp(40, 90) as u8
}

fn fade_for_occurrence(occ: &Occurrence<'_>, day: NaiveDate) -> u8 {
    match occ.role {
        Role::LeadUp => {
            let days_before_due = (occ.task.due_date - day).num_days();
            (100 - 10 * days_before_due).max(0) as u8
        }
        Role::DueDay | Role::RepeatOccurrence => 100,
    }
}

/// Convert an HSL triple (hue in degrees, saturation and lightness in
/// percent) to a ratatui RGB colour.
pub fn hsl_to_color(hue: u16, saturation: u8, lightness: u8) -> Color {
    let h = f64::from(hue % 360);
    let s = f64::from(saturation) / 100.0;
    let l = f64::from(lightness) / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::Rgb(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::occurrences_on_day;
    use crate::task::Task;
    use std::collections::BTreeMap;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(id: u64, due: &str, order: u32) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            notes: None,
            due_date: date(due),
            start_date: None,
            completed: false,
            order,
            daily_completed: BTreeMap::new(),
            repeat_weekly: false,
            repeat_until: None,
            created_at_utc: 0,
        }
    }

    #[test]
    fn hue_partitions_wheel() {
        assert_eq!(hue_for_index(0, 3), 0);
        assert_eq!(hue_for_index(1, 3), 120);
        assert_eq!(hue_for_index(2, 3), 240);
        // Single task takes hue 0 via the max(1, count) guard.
        assert_eq!(hue_for_index(0, 0), 0);
    }

    #[test]
    fn saturation_clamps_both_ends() {
        let day = date("2024-03-10");
        // Due today and overdue both saturate fully.
        assert_eq!(saturation_for_due(date("2024-03-10"), day), 90);
        assert_eq!(saturation_for_due(date("2024-03-01"), day), 90);
        assert_eq!(saturation_for_due(date("2024-03-12"), day), 80);
        // Far-future dues bottom out at 40, never below.
        assert_eq!(saturation_for_due(date("2024-06-10"), day), 40);
    }

    #[test]
    fn lead_up_fades_with_distance() {
        let mut t = task(1, "2024-03-10", 0);
        t.set_start_date(Some(date("2024-02-25")));
        let tasks = vec![t];

        let day = date("2024-03-07");
        let occ = occurrences_on_day(&tasks, day);
        assert_eq!(day_styles(&occ, day)[0].fade, 70);

        // Eleven or more days out the preview bottoms out at zero.
        let day = date("2024-02-26");
        let occ = occurrences_on_day(&tasks, day);
        assert_eq!(day_styles(&occ, day)[0].fade, 0);

        let day = date("2024-03-10");
        let occ = occurrences_on_day(&tasks, day);
        assert_eq!(day_styles(&occ, day)[0].fade, 100);
    }

    #[test]
    fn repeat_occurrences_render_at_full_filter() {
        let mut t = task(1, "2024-01-01", 0);
        t.set_repeat_weekly(true, None);
        let tasks = vec![t];
        let day = date("2024-01-15");
        let occ = occurrences_on_day(&tasks, day);
        assert_eq!(day_styles(&occ, day)[0].fade, 100);
    }

    #[test]
    fn styles_are_deterministic_per_snapshot() {
        let tasks = vec![
            task(1, "2024-03-10", 0),
            task(2, "2024-03-10", 1),
            task(3, "2024-03-10", 2),
        ];
        let day = date("2024-03-10");
        let occ = occurrences_on_day(&tasks, day);
        let first = day_styles(&occ, day);
        let second = day_styles(&occ, day);
        assert_eq!(first, second);
        assert_eq!(first[1].hue, 120);
    }

    #[test]
    fn hsl_conversion_known_points() {
        assert_eq!(hsl_to_color(0, 100, 50), Color::Rgb(255, 0, 0));
        assert_eq!(hsl_to_color(120, 100, 50), Color::Rgb(0, 255, 0));
        assert_eq!(hsl_to_color(240, 100, 50), Color::Rgb(0, 0, 255));
        assert_eq!(hsl_to_color(0, 0, 100), Color::Rgb(255, 255, 255));
    }
}
