use std::sync::Arc;

use gtfs::schedule::Schedule;
use web::{start_web_server, ServerConfig, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = ServerConfig::from_env();
    let schedule = Arc::new(load_schedule(&config));
    log::info!(
        "schedule loaded: {} stops, {} patterns",
        schedule.stop_count(),
        schedule.patterns().len()
    );

    let state = WebState::new(schedule, config);
    if let Err(why) = start_web_server(state).await {
        log::error!("server exited: {why}");
        std::process::exit(1);
    }
}

/// Loads the bundled static timetable: an extracted directory first, then
/// a zip next to it. A deployment without a bundle still serves, purely
/// from live feeds and the walking fallback.
fn load_schedule(config: &ServerConfig) -> Schedule {
    let path = &config.schedule_path;
    if path.is_dir() {
        match Schedule::load_dir(path) {
            Ok(schedule) => return schedule,
            Err(why) => log::warn!("schedule dir {} unusable: {why}", path.display()),
        }
    }
    let zip_path = path.with_extension("zip");
    if zip_path.is_file() {
        match Schedule::load_zip(&zip_path) {
            Ok(schedule) => return schedule,
            Err(why) => {
                log::warn!("schedule zip {} unusable: {why}", zip_path.display())
            }
        }
    }
    log::warn!("no static gtfs bundle found; timetable fallback is empty");
    Schedule::from_tables(Vec::new(), Vec::new(), Vec::new(), Vec::new(), None, Vec::new())
}
