//! Recurring removal of expired OTPs using tokio-cron-scheduler.

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::auth::AuthService;

pub const DEFAULT_SWEEP_CRON: &str = "0 */5 * * * *";

/// Register and start the OTP expiry sweep on `cron` (six fields, seconds first).
///
/// The returned scheduler must be kept alive for the job to keep firing.
pub async fn start_otp_sweeper(auth: AuthService, cron: &str) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let auth = auth.clone();
        Box::pin(async move {
            match auth.delete_expired_otps(Utc::now()).await {
                Ok(removed) => tracing::debug!(removed, "OTP sweep finished"),
                Err(e) => tracing::error!(error = %e, "OTP sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(cron, "OTP expiry sweeper started");
    Ok(scheduler)
}
