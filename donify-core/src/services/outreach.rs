//! Outreach service - newsletter sign-ups and volunteer applications

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{validate_email, NewsletterSubscriber, Volunteer, VolunteerApplication};
use crate::ports::backend::{from_row, to_row};
use crate::ports::{BackendStore, Table};

pub struct OutreachService {
    backend: Arc<dyn BackendStore>,
}

impl OutreachService {
    pub fn new(backend: Arc<dyn BackendStore>) -> Self {
        Self { backend }
    }

    /// Subscribe an address; an existing subscription is [`Error::AlreadySubscribed`]
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<NewsletterSubscriber> {
        if email.trim().is_empty() {
            return Err(Error::validation("Please enter your email address"));
        }
        validate_email(email).map_err(Error::validation)?;

        let subscriber = NewsletterSubscriber::new(email);
        let stored = self
            .backend
            .insert(Table::NewsletterSubscribers, to_row(&subscriber)?)
            .await
            .map_err(|e| match e {
                Error::AlreadyExists(_) => Error::AlreadySubscribed,
                other => other,
            })?;
        from_row(stored)
    }

    pub async fn register_volunteer(&self, application: VolunteerApplication) -> Result<Volunteer> {
        application.validate().map_err(Error::validation)?;
        let volunteer = application.into_volunteer();
        let stored = self
            .backend
            .insert(Table::Volunteers, to_row(&volunteer)?)
            .await?;
        tracing::debug!(volunteer_id = %volunteer.id, "volunteer application received");
        from_row(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DuckDbBackend;
    use crate::domain::VolunteerStatus;

    fn service() -> OutreachService {
        OutreachService::new(Arc::new(DuckDbBackend::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_duplicate_subscription() {
        let service = service();
        let first = service.subscribe_newsletter("Reader@Example.com").await.unwrap();
        assert_eq!(first.email, "reader@example.com");
        assert!(first.is_active);

        assert!(matches!(
            service.subscribe_newsletter("reader@example.com").await,
            Err(Error::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_subscription_needs_an_email() {
        let service = service();
        assert!(matches!(service.subscribe_newsletter("  ").await, Err(Error::Validation(_))));
        assert!(matches!(service.subscribe_newsletter("nope").await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_volunteer() {
        let service = service();
        let volunteer = service
            .register_volunteer(VolunteerApplication {
                full_name: "Ana Lima".to_string(),
                email: "ana@example.com".to_string(),
                skills: Some("Teaching".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(volunteer.status, VolunteerStatus::Pending);

        let missing_name = VolunteerApplication {
            email: "x@example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            service.register_volunteer(missing_name).await,
            Err(Error::Validation(_))
        ));
    }
}
