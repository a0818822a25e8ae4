//! Pure next-slot computation.
//!
//! `next_slot` never reads a clock and never mutates anything; every
//! input it needs is passed explicitly. This is what makes boundary
//! cases and end-to-end scenarios expressible as ordinary unit tests
//! with no timing dependency.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::job::{IntervalUnit, Job};

/// Compute the job's next scheduled instant relative to `now_minute`
/// (already truncated to minute resolution by the caller).
///
/// `after_execution` distinguishes "we just ran the current slot, move
/// past it" from "we are deciding what to do before running anything
/// this tick" (catch-up / retry-in-slot).
pub fn next_slot(job: &Job, now_minute: DateTime<Utc>, after_execution: bool) -> DateTime<Utc> {
    let base = job.anchor_time;
    let interval_value = job.interval_value.unwrap_or(1) as i64;
    let unit = job.interval_unit.unwrap_or(IntervalUnit::Minute);

    match unit.fixed_minutes() {
        Some(unit_minutes) => {
            next_slot_fixed(base, now_minute, interval_value, unit_minutes, after_execution)
        }
        None => next_slot_monthly(base, now_minute, interval_value as u32, after_execution),
    }
}

fn next_slot_fixed(
    base: DateTime<Utc>,
    now_minute: DateTime<Utc>,
    interval_value: i64,
    unit_minutes: i64,
    after_execution: bool,
) -> DateTime<Utc> {
    let interval_minutes = interval_value * unit_minutes;
    let elapsed = (now_minute - base).num_minutes();
    if elapsed < 0 {
        return base;
    }
    let k = elapsed / interval_minutes;
    let current = base + chrono::Duration::minutes(k * interval_minutes);

    if current == now_minute {
        if after_execution {
            base + chrono::Duration::minutes((k + 1) * interval_minutes)
        } else {
            current
        }
    } else {
        base + chrono::Duration::minutes((k + 1) * interval_minutes)
    }
}

fn next_slot_monthly(
    base: DateTime<Utc>,
    now_minute: DateTime<Utc>,
    interval_months: u32,
    after_execution: bool,
) -> DateTime<Utc> {
    let mut t = base;
    let mut prev = t;
    while t <= now_minute {
        prev = t;
        t = add_months(t, interval_months);
    }

    if t == base {
        // Loop never ran: base is already in the future.
        base
    } else if prev == now_minute {
        if after_execution {
            t
        } else {
            prev
        }
    } else {
        t
    }
}

/// Add `months` calendar months to `t`, clamping the day-of-month into
/// the target month (Jan 31 + 1 month -> Feb 28/29). Never approximated
/// as a fixed duration.
fn add_months(t: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let naive = t.naive_utc();
    let date = naive.date();
    let time = naive.time();

    let total_months = date.year() * 12 + date.month0() as i32 + months as i32;
    let new_year = total_months.div_euclid(12);
    let new_month = (total_months.rem_euclid(12)) as u32 + 1;
    let last_day = last_day_of_month(new_year, new_month);
    let clamped_day = date.day().min(last_day);

    let new_date = NaiveDate::from_ymd_opt(new_year, new_month, clamped_day)
        .expect("clamped day is always valid for its month");
    Utc.from_utc_datetime(&NaiveDateTime::new(new_date, time))
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid first-of-month date")
        .pred_opt()
        .expect("day before first-of-month is always valid")
        .day()
}
