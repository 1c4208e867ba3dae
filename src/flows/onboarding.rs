//! Onboarding countdown view.
//!
//! The onboarding window opens at the configured launch date and runs for
//! `window_days`; the countdown targets the end of the window and the
//! progress figure tracks how far through it we are.

use crate::config::OnboardingConfig;
use crate::identity::User;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use console::style;
use std::fmt;
use std::io::Write;

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Countdown {
    pub fn from_seconds(total_seconds: u64) -> Self {
        let days = total_seconds / SECONDS_PER_DAY;
        let rest = total_seconds % SECONDS_PER_DAY;
        Self {
            days,
            hours: u8::try_from(rest / 3600).unwrap_or(0),
            minutes: u8::try_from(rest % 3600 / 60).unwrap_or(0),
            seconds: u8::try_from(rest % 60).unwrap_or(0),
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

pub fn window_end(config: &OnboardingConfig) -> DateTime<Utc> {
    config.launch_date + Duration::days(i64::from(config.window_days))
}

pub fn remaining_seconds(end: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (end - now).num_seconds().max(0).unsigned_abs()
}

/// Fraction of the onboarding window already elapsed, clamped to `[0, 1]`.
pub fn progress(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let total = (end - start).num_seconds();
    if total <= 0 {
        return 1.0;
    }
    let elapsed = (now - start).num_seconds();
    #[allow(clippy::cast_precision_loss)]
    let fraction = elapsed as f64 / total as f64;
    fraction.clamp(0.0, 1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_percent(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    (progress(start, end, now) * 100.0).round() as u8
}

pub async fn run(
    config: &OnboardingConfig,
    user: Option<&User>,
    name_flag: Option<String>,
    watch: bool,
) -> Result<()> {
    let name = name_flag
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| user.map(|user| user.greeting_name().to_string()));

    let Some(name) = name else {
        println!("ℹ️  Please join the waitlist or login to access onboarding.");
        println!("   nexgenu waitlist --name <NAME> --email <EMAIL>");
        println!("   nexgenu login --email <EMAIL>");
        return Ok(());
    };

    let start = config.launch_date;
    let end = window_end(config);

    println!("🎓 Welcome to Onboarding, {name}!");
    println!("Your journey starts soon. Countdown to launch:");

    if watch {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            ticker.tick().await;
            let now = Utc::now();
            print!("\r{}", countdown_line(start, end, now));
            std::io::stdout().flush()?;
            if remaining_seconds(end, now) == 0 {
                break;
            }
        }
        println!();
    } else {
        println!("{}", countdown_line(start, end, Utc::now()));
    }

    println!();
    println!("Join the WhatsApp group: {}", config.whatsapp_link);
    println!("Join the Telegram group: {}", config.telegram_link);
    println!("Useful links: Orientation Guide, Support Center");
    Ok(())
}

fn countdown_line(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let countdown = Countdown::from_seconds(remaining_seconds(end, now));
    format!(
        "   {}   ({}% complete)",
        style(countdown).bold(),
        progress_percent(start, end, now)
    )
}
