const BUTTON_STYLE: &str = "display: inline-block; padding: 10px 20px; background: #4f46e5; \
color: white; text-decoration: none; border-radius: 4px;";

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
{body}
</body>
</html>"#
    )
}

/// Minimal escaping for user-supplied text placed into HTML mail.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_welcome(name: &str, base_url: &str) -> String {
    let name = escape(name);
    layout(&format!(
        r#"    <h2>Welcome to WorkSphere</h2>
    <p>Hi {name},</p>
    <p>Your account has been created.</p>
    <p><a href="{base_url}" style="{BUTTON_STYLE}">Open WorkSphere</a></p>"#
    ))
}

pub fn render_password_reset(reset_url: &str) -> String {
    layout(&format!(
        r#"    <h2>Password Reset</h2>
    <p>A password reset was requested for your WorkSphere account.</p>
    <p><a href="{reset_url}" style="{BUTTON_STYLE}">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 1 hour. If you didn't request this, you can ignore it.</p>"#
    ))
}

pub fn render_signoff_requested(
    project_name: &str,
    requester_name: &str,
    notes: Option<&str>,
    project_url: &str,
) -> String {
    let notes = notes
        .map(|n| format!("<blockquote>{}</blockquote>", escape(n)))
        .unwrap_or_default();
    layout(&format!(
        r#"    <h2>Sign-off requested</h2>
    <p>{requester} asked for <strong>{project}</strong> to be signed off.</p>
    {notes}
    <p>Project data is protected from deletion until the request is reviewed.</p>
    <p><a href="{project_url}" style="{BUTTON_STYLE}">Review Project</a></p>"#,
        requester = escape(requester_name),
        project = escape(project_name),
    ))
}

pub fn render_signoff_reviewed(
    project_name: &str,
    approved: bool,
    notes: Option<&str>,
    project_url: &str,
) -> String {
    let outcome = if approved { "approved" } else { "rejected" };
    let notes = notes
        .map(|n| format!("<blockquote>{}</blockquote>", escape(n)))
        .unwrap_or_default();
    layout(&format!(
        r#"    <h2>Sign-off {outcome}</h2>
    <p>Your sign-off request for <strong>{project}</strong> was {outcome}.</p>
    {notes}
    <p><a href="{project_url}" style="{BUTTON_STYLE}">Open Project</a></p>"#,
        project = escape(project_name),
    ))
}
