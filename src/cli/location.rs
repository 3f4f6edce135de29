//! Login and session location commands

use anyhow::Result;

use crate::config::Config;
use crate::session::SessionStore;

pub fn login(session: &mut SessionStore, user_id: &str) -> Result<()> {
    let hash = session.login(user_id)?;
    println!("Logged in as {user_id} ({hash})");
    Ok(())
}

pub fn show(session: &SessionStore, config: &Config) -> Result<()> {
    match (session.city(), session.district()) {
        (Some(city), Some(district)) => println!("Location: {city} / {district}"),
        (Some(city), None) => println!("Location: {city}"),
        _ => println!(
            "No location remembered. Suggestions: {}",
            config.form.city_suggestions.join(", ")
        ),
    }
    if let Some(user) = session.user_id() {
        println!("User: {user}");
    }
    Ok(())
}

pub fn set(session: &mut SessionStore, city: &str, district: &str) -> Result<()> {
    session.set_location(city, district)?;
    println!("Location set to {city} / {district}");
    Ok(())
}

pub fn clear(session: &mut SessionStore) -> Result<()> {
    session.clear()?;
    println!("Session cleared.");
    Ok(())
}
