use anyhow::{Context, Result};
use hospital_client::Dashboard;

use super::AppContext;
use crate::output;

pub async fn show_dashboard(ctx: &AppContext) -> Result<()> {
    ctx.require_login()?;

    let dashboard = Dashboard::load(&ctx.records)
        .await
        .context("Failed to load dashboard")?;

    if ctx.json {
        return output::print_json(&dashboard);
    }

    let stats = dashboard.stats;
    println!("Patients:        {}", stats.total_patients);
    println!("Doctors:         {}", stats.total_doctors);
    println!("Mappings:        {}", stats.total_mappings);
    println!("Active mappings: {}", stats.active_mappings);

    println!("\nRecent patients:");
    output::print_patients(&dashboard.recent_patients);
    println!("\nRecent doctors:");
    output::print_doctors(&dashboard.recent_doctors);
    println!("\nRecent mappings:");
    output::print_mappings(&dashboard.recent_mappings);

    Ok(())
}
