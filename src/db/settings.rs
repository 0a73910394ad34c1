use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    models::{AppSettings, SocialLinks},
    SettingsRepository, StoreResult,
};
use crate::validation::{SettingsUpdate, SmtpSettingsUpdate, SocialLinksUpdate};

#[derive(Default)]
pub struct InMemorySettingsStore {
    settings: RwLock<AppSettings>,
}

impl InMemorySettingsStore {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

fn merge_social(links: &mut SocialLinks, update: SocialLinksUpdate) {
    if let Some(linkedin) = update.linkedin {
        links.linkedin = linkedin;
    }
    if let Some(instagram) = update.instagram {
        links.instagram = instagram;
    }
    if let Some(facebook) = update.facebook {
        links.facebook = facebook;
    }
}

fn merge_smtp(settings: &mut AppSettings, update: SmtpSettingsUpdate) {
    let smtp = &mut settings.smtp_settings;
    if let Some(host) = update.host {
        smtp.host = host;
    }
    if let Some(port) = update.port.and_then(|p| u16::try_from(p).ok()) {
        smtp.port = port;
    }
    if let Some(user) = update.user {
        smtp.user = user;
    }
    if let Some(secure) = update.secure {
        smtp.secure = secure;
    }
    if let Some(from_email) = update.from_email {
        smtp.from_email = from_email;
    }
    smtp.pass = update.pass.apply(std::mem::take(&mut smtp.pass));
}

#[async_trait]
impl SettingsRepository for InMemorySettingsStore {
    async fn get(&self) -> StoreResult<AppSettings> {
        Ok(self.settings.read().await.clone())
    }

    async fn update(&self, update: SettingsUpdate) -> StoreResult<AppSettings> {
        let mut settings = self.settings.write().await;
        if let Some(social) = update.social_links {
            merge_social(&mut settings.social_links, social);
        }
        if let Some(smtp) = update.smtp_settings {
            merge_smtp(&mut settings, smtp);
        }
        tracing::info!("settings updated");
        Ok(settings.clone())
    }

    async fn update_social(&self, update: SocialLinksUpdate) -> StoreResult<SocialLinks> {
        let mut settings = self.settings.write().await;
        merge_social(&mut settings.social_links, update);
        tracing::info!("social links updated");
        Ok(settings.social_links.clone())
    }
}
