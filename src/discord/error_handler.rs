// Framework-wide error handling for commands.
//
// Validation problems are shown to the member as-is. Ledger failures get a
// generic message and a log line. Everything else goes to poise's default.

use crate::core::points::PointsError;
use crate::discord::{Data, Error};

const LEDGER_UNAVAILABLE: &str =
    "The points ledger is unavailable right now. Nothing was changed, please try again later.";

/// What a member sees when a command fails.
pub fn user_message(error: &Error) -> String {
    match error.downcast_ref::<PointsError>() {
        Some(points_error) if points_error.is_validation() => points_error.to_string(),
        Some(_) => LEDGER_UNAVAILABLE.to_string(),
        None => "Something went wrong while running that command.".to_string(),
    }
}

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                error = %error,
                "Command failed"
            );
            let reply = poise::CreateReply::default()
                .content(user_message(&error))
                .ephemeral(true);
            if let Err(err) = ctx.send(reply).await {
                tracing::warn!("Failed to report command error: {}", err);
            }
        }
        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling framework error: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_shown_verbatim() {
        let error: Error = Box::new(PointsError::InvalidAmount(0));
        assert_eq!(user_message(&error), "Amount must be at least 1 (got 0)");
    }

    #[test]
    fn store_errors_are_generic() {
        let error: Error = Box::new(PointsError::StoreUnavailable("disk I/O error".into()));
        let message = user_message(&error);
        assert_eq!(message, LEDGER_UNAVAILABLE);
        assert!(!message.contains("disk"));
    }

    #[test]
    fn other_errors_get_a_fallback() {
        let error: Error = "This command only works in servers".into();
        assert!(user_message(&error).starts_with("Something went wrong"));
    }
}
