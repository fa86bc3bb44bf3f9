use super::sendmail::{render_template, MailResult, Mailer};

pub async fn send_verification_email(
    mailer: &dyn Mailer,
    to_email: &str,
    username: &str,
    token: &str,
    app_url: &str,
) -> MailResult {
    let subject = "Verify your email";
    let verification_link = format!("{}/api/auth/verify?token={}", app_url, token);
    let html = render_template(
        "src/mail/templates/Verification-email.html",
        &[
            ("{{username}}".to_string(), username.to_string()),
            ("{{verification_link}}".to_string(), verification_link),
        ],
    )?;

    mailer.send(to_email, subject, &html).await
}

pub async fn send_proposal_received_email(
    mailer: &dyn Mailer,
    to_email: &str,
    username: &str,
    job_title: &str,
    proposed_amount: f64,
) -> MailResult {
    let subject = "New proposal on your job";
    let html = render_template(
        "src/mail/templates/Proposal-received-email.html",
        &[
            ("{{username}}".to_string(), username.to_string()),
            ("{{job_title}}".to_string(), job_title.to_string()),
            (
                "{{proposed_amount}}".to_string(),
                format!("{:.2}", proposed_amount),
            ),
        ],
    )?;

    mailer.send(to_email, subject, &html).await
}

pub async fn send_proposal_accepted_email(
    mailer: &dyn Mailer,
    to_email: &str,
    username: &str,
    job_title: &str,
) -> MailResult {
    let subject = "Your proposal was accepted!";
    let html = render_template(
        "src/mail/templates/Proposal-accepted-email.html",
        &[
            ("{{username}}".to_string(), username.to_string()),
            ("{{job_title}}".to_string(), job_title.to_string()),
        ],
    )?;

    mailer.send(to_email, subject, &html).await
}

pub async fn send_payment_released_email(
    mailer: &dyn Mailer,
    to_email: &str,
    username: &str,
    job_title: &str,
    amount: f64,
) -> MailResult {
    let subject = "Payment released";
    let html = render_template(
        "src/mail/templates/Payment-released-email.html",
        &[
            ("{{username}}".to_string(), username.to_string()),
            ("{{job_title}}".to_string(), job_title.to_string()),
            ("{{amount}}".to_string(), format!("{:.2}", amount)),
        ],
    )?;

    mailer.send(to_email, subject, &html).await
}

pub async fn send_payment_refunded_email(
    mailer: &dyn Mailer,
    to_email: &str,
    username: &str,
    job_title: &str,
    amount: f64,
) -> MailResult {
    let subject = "Escrow refunded";
    let html = render_template(
        "src/mail/templates/Payment-refunded-email.html",
        &[
            ("{{username}}".to_string(), username.to_string()),
            ("{{job_title}}".to_string(), job_title.to_string()),
            ("{{amount}}".to_string(), format!("{:.2}", amount)),
        ],
    )?;

    mailer.send(to_email, subject, &html).await
}
