use crate::models::user::User;
use crate::smtp::{MailTransport, OutgoingEmail};

/// Send a run summary to the user's own address. Best effort: a failed report
/// is logged and never surfaces to the caller, so one user's broken mailbox
/// cannot block the rest of a run.
pub async fn notify(transport: &dyn MailTransport, user: &User, subject: &str, body: &str) {
    let account = match user.sender_account() {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(user = %user.email, error = %e, "report skipped: bad credentials");
            return;
        }
    };

    let mail = OutgoingEmail {
        to: user.email.clone(),
        subject: subject.to_string(),
        body_html: body.to_string(),
    };

    match transport.connect(&account).await {
        Ok(mut session) => {
            if let Err(e) = session.send(&mail).await {
                tracing::warn!(user = %user.email, error = %e, "report send failed");
            }
            let _ = session.close().await;
        }
        Err(e) => {
            tracing::warn!(user = %user.email, error = %e, "report session failed");
        }
    }
}
