//! Email formatting, parsing, persistence, and starter templates.

use scribe_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The canonical drafted-email layout.
const EMAIL_LAYOUT: &str = "Subject: {subject}\n\nTo: {recipient}\nFrom: {sender}\n\n{body}";

/// Structured parts of an email draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailParts {
    pub subject: Option<String>,
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub body: String,
}

/// Format content as an email with the canonical layout.
pub fn format_email(
    subject: &str,
    recipient: &str,
    sender: &str,
    body: &str,
    signature: Option<&str>,
) -> String {
    let mut email = EMAIL_LAYOUT
        .replace("{subject}", subject)
        .replace("{recipient}", recipient)
        .replace("{sender}", sender)
        .replace("{body}", body.trim_end());

    if let Some(signature) = signature {
        email.push_str("\n\n");
        email.push_str(signature.trim_end());
    }

    email
}

/// Extract the parts of a drafted email.
///
/// Recognizes `Subject:`, `To:`, and `From:` header lines anywhere before
/// the body; everything after the headers is the body. Lenient parsing:
/// drafts come from a language model, not a mail server.
pub fn parse_email_parts(text: &str) -> EmailParts {
    let mut parts = EmailParts::default();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in text.lines() {
        if in_body {
            body_lines.push(line);
            continue;
        }

        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("Subject:") {
            parts.subject = Some(value.trim().to_string());
        } else if let Some(value) = trimmed.strip_prefix("To:") {
            parts.recipient = Some(value.trim().to_string());
        } else if let Some(value) = trimmed.strip_prefix("From:") {
            parts.sender = Some(value.trim().to_string());
        } else if trimmed.is_empty() {
            // Blank lines between headers are layout, not body; the body
            // starts at the first non-empty, non-header line
        } else {
            in_body = true;
            body_lines.push(line);
        }
    }

    parts.body = body_lines.join("\n").trim_end().to_string();
    parts
}

/// Save a finished draft under `directory`, creating it if needed.
///
/// Without a filename a timestamped one is generated; a missing `.txt`
/// extension is appended either way. Returns the path written.
pub fn save_draft(content: &str, filename: Option<&str>, directory: &Path) -> AppResult<PathBuf> {
    std::fs::create_dir_all(directory)?;

    let mut name = match filename {
        Some(name) => name.trim().to_string(),
        None => format!("draft_{}", chrono::Local::now().format("%Y%m%d_%H%M%S")),
    };
    if !name.ends_with(".txt") {
        name.push_str(".txt");
    }

    let path = directory.join(name);
    std::fs::write(&path, content)?;
    tracing::info!("Saved draft to {:?}", path);
    Ok(path)
}

/// Kinds of starter email templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplateKind {
    Formal,
    Informal,
    Request,
    FollowUp,
    ThankYou,
}

impl EmailTemplateKind {
    pub const ALL: [EmailTemplateKind; 5] = [
        Self::Formal,
        Self::Informal,
        Self::Request,
        Self::FollowUp,
        Self::ThankYou,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Informal => "informal",
            Self::Request => "request",
            Self::FollowUp => "follow_up",
            Self::ThankYou => "thank_you",
        }
    }

    /// Parse a template kind from its name.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "formal" => Ok(Self::Formal),
            "informal" => Ok(Self::Informal),
            "request" => Ok(Self::Request),
            "follow_up" | "follow-up" | "followup" => Ok(Self::FollowUp),
            "thank_you" | "thank-you" | "thankyou" => Ok(Self::ThankYou),
            other => {
                let available: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                Err(AppError::Other(format!(
                    "Unknown email template '{}'. Available: {}",
                    other,
                    available.join(", ")
                )))
            }
        }
    }
}

/// Get the starter template for an email kind.
pub fn email_template(kind: EmailTemplateKind) -> &'static str {
    match kind {
        EmailTemplateKind::Formal => {
            "Subject: [Formal Subject]\n\n\
             To: [Recipient]\n\
             From: [Your Name]\n\n\
             Dear [Recipient Name],\n\n\
             I hope this email finds you well. I am writing to [purpose of email].\n\n\
             [Main content paragraph 1]\n\n\
             [Main content paragraph 2]\n\n\
             Thank you for your time and consideration.\n\n\
             Best regards,\n\
             [Your Name]\n\
             [Your Title]\n\
             [Contact Information]"
        }
        EmailTemplateKind::Informal => {
            "Subject: [Informal Subject]\n\n\
             To: [Recipient]\n\
             From: [Your Name]\n\n\
             Hi [Recipient First Name],\n\n\
             Hope you're doing well! I wanted to [purpose of email].\n\n\
             [Main content paragraph]\n\n\
             Let me know what you think!\n\n\
             Cheers,\n\
             [Your Name]"
        }
        EmailTemplateKind::Request => {
            "Subject: Request: [Request Topic]\n\n\
             To: [Recipient]\n\
             From: [Your Name]\n\n\
             Dear [Recipient Name],\n\n\
             I hope this email finds you well. I am writing to request [specific request].\n\n\
             [Details of request]\n\n\
             [Reason for request]\n\n\
             [Timeline or deadline if applicable]\n\n\
             Thank you for considering my request. I look forward to your response.\n\n\
             Best regards,\n\
             [Your Name]\n\
             [Contact Information]"
        }
        EmailTemplateKind::FollowUp => {
            "Subject: Follow-up: [Previous Topic]\n\n\
             To: [Recipient]\n\
             From: [Your Name]\n\n\
             Dear [Recipient Name],\n\n\
             I hope you're doing well. I'm writing to follow up on [previous discussion].\n\n\
             [Reference to previous communication]\n\n\
             [Follow-up questions or comments]\n\n\
             [Next steps or action items]\n\n\
             Thank you for your attention to this matter.\n\n\
             Best regards,\n\
             [Your Name]"
        }
        EmailTemplateKind::ThankYou => {
            "Subject: Thank You for [Reason]\n\n\
             To: [Recipient]\n\
             From: [Your Name]\n\n\
             Dear [Recipient Name],\n\n\
             I wanted to take a moment to express my sincere gratitude for [reason].\n\n\
             [Additional details about what you're thankful for]\n\n\
             [Impact of their actions]\n\n\
             Thank you again for [brief restatement].\n\n\
             Warm regards,\n\
             [Your Name]"
        }
    }
}
