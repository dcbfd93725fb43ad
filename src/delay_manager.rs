use std::time::Duration;
use std::thread;
use rand::Rng;
use log::info;

/// Longest pause the pacing delay will ever take.
pub const MAX_DELAY_SECS: f64 = 300.0;

/// Pins a configured bound to `[0, MAX_DELAY_SECS]`; NaN counts as zero.
pub fn clamp_secs(secs: f64) -> f64 {
    if secs.is_nan() {
        return 0.0;
    }
    secs.clamp(0.0, MAX_DELAY_SECS)
}

/// Picks a delay uniformly from `[min_secs, max_secs]`. Bounds given in the
/// wrong order are swapped; a zero-width range yields exactly that value.
pub fn pick_delay(min_secs: f64, max_secs: f64) -> Duration {
    let (min_secs, max_secs) = (clamp_secs(min_secs), clamp_secs(max_secs));
    let (lo, hi) = if min_secs <= max_secs { (min_secs, max_secs) } else { (max_secs, min_secs) };
    if hi <= lo {
        return Duration::from_secs_f64(lo);
    }
    let mut rng = rand::thread_rng();
    Duration::from_secs_f64(rng.gen_range(lo..=hi))
}

/// Sleeps for a random human-looking pause after the page has loaded.
pub fn random_render_delay(min_secs: f64, max_secs: f64) {
    let delay = pick_delay(min_secs, max_secs);
    if delay.is_zero() {
        return;
    }
    info!("Waiting for {:.1} seconds (Render Delay)...", delay.as_secs_f64());
    thread::sleep(delay);
}
