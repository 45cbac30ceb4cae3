//! Template command handler.

use clap::Args;
use scribe_core::AppResult;
use scribe_prompt::{email_template, EmailTemplateKind};

/// Print an email starter template
#[derive(Args, Debug)]
pub struct TemplateCommand {
    /// Template kind (formal, informal, request, follow_up, thank_you)
    pub kind: Option<String>,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

impl TemplateCommand {
    pub fn execute(&self) -> AppResult<()> {
        if self.list || self.kind.is_none() {
            println!("Available templates:");
            for kind in EmailTemplateKind::ALL {
                println!("  {}", kind.as_str());
            }
            return Ok(());
        }

        // kind is present here
        let kind = EmailTemplateKind::parse(self.kind.as_deref().unwrap_or_default())?;
        println!("{}", email_template(kind));
        Ok(())
    }
}
