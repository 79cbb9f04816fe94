use std::fs;

use async_trait::async_trait;
use color_eyre::Result;
use eyre::WrapErr;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::Value;

/// Dispatches a freshly issued code to a delivery address.
///
/// The gate holds no mail configuration of its own; it talks to whatever
/// implementation it was constructed with, so its state machine can be tested
/// against a fake channel.
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn send_code(&self, to: &str, name: &str, code: &str) -> Result<()>;
}

/// SMTP-backed delivery, rendering the HTML template from disk.
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    platform_name: String,
    template_path: String,
}

impl EmailService {
    pub fn new(
        smtp_host: &str,
        smtp_user: &str,
        smtp_pass: &str,
        platform_name: &str,
        template_path: &str,
    ) -> Result<Self> {
        let creds = Credentials::new(smtp_user.to_string(), smtp_pass.to_string());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
            .wrap_err("Building SMTP transport")?
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from_address: smtp_user.to_string(),
            platform_name: platform_name.to_string(),
            template_path: template_path.to_string(),
        })
    }

    fn load_template(&self) -> Result<String> {
        let template = fs::read_to_string(&self.template_path)
            .wrap_err("Reading OTP email template")?;
        Ok(template)
    }

    fn render(template: &str, data: &Value) -> String {
        let mut body = template.to_string();
        if let Some(fields) = data.as_object() {
            for (key, value) in fields {
                let placeholder = format!("{{{{{}}}}}", key);
                body = body.replace(&placeholder, value.as_str().unwrap_or_default());
            }
        }
        body
    }
}

#[async_trait]
impl OtpDelivery for EmailService {
    async fn send_code(&self, to: &str, name: &str, code: &str) -> Result<()> {
        let template = self.load_template()?;
        let body = Self::render(
            &template,
            &serde_json::json!({
                "name": name,
                "otp": code,
                "platformName": self.platform_name,
            }),
        );

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject("Audio Tweet OTP Verification")
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        self.mailer.send(email).await.wrap_err("Sending OTP email")?;

        Ok(())
    }
}
